use diesel::{
    connection::SimpleConnection,
    r2d2::{self, ConnectionManager, CustomizeConnection},
    sqlite::SqliteConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::errors::{AppError, AppResult};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

/// Per-connection SQLite settings. Foreign keys are off by default in SQLite and
/// must be switched on for every new connection.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

pub fn initialize_db_pool(db_url: &str) -> AppResult<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_url);
    r2d2::Pool::builder()
        // one logical thread of control; more connections would only contend for the file lock
        .max_size(1)
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout_ms: 5_000,
        }))
        .build(manager)
        .map_err(|e| AppError::ConfigurationError(format!("Unable to open database {db_url}: {e}")))
}

pub fn run_migrations(pool: &DbPool) -> AppResult<()> {
    let mut conn = pool.get()?;
    tracing::info!("Running database migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| AppError::DatabaseError(format!("Failed to run migrations: {e}")))?;
    Ok(())
}
