use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::MigrationHarness;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::config::Preferences;
use crate::db::{initialize_db_pool, run_migrations, DbPool, MIGRATIONS};
use crate::errors::{AppError, AppResult};
use crate::fetcher::FeedSource;
use crate::models::{
    feed::{Feed, NewFeed},
    post::{NewPost, Post},
    user::{NewUser, User},
};
use crate::state::AppState;

/// Create a test database with a temporary file
pub fn create_test_db() -> (TempDir, DbPool) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = initialize_db_pool(&db_path.display().to_string()).expect("Failed to create pool");
    run_migrations(&pool).expect("Failed to run migrations");

    (temp_dir, pool)
}

/// Create an in-memory test database connection
pub fn get_test_db_connection() -> SqliteConnection {
    let mut conn = SqliteConnection::establish(":memory:")
        .unwrap_or_else(|_| panic!("Error connecting to in-memory SQLite database"));
    conn.batch_execute("PRAGMA foreign_keys = ON")
        .expect("Failed to enable foreign keys");

    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
    conn
}

/// Application state over a temp database and config file, with `current_user` active.
pub fn create_test_state(
    current_user: Option<&str>,
    source: Arc<dyn FeedSource>,
) -> (TempDir, Arc<AppState>) {
    let (temp_dir, pool) = create_test_db();
    let mut prefs =
        Preferences::read(temp_dir.path().join("config.json")).expect("Failed to read config");
    if let Some(name) = current_user {
        prefs.set_user(name).expect("Failed to write config");
    }
    let state = AppState::new(prefs, pool, source, CancellationToken::new());
    (temp_dir, Arc::new(state))
}

pub fn create_user(conn: &mut SqliteConnection, name: &str) -> User {
    NewUser::new(name).insert(conn).expect("Failed to create user")
}

pub fn create_feed(conn: &mut SqliteConnection, owner: &User, name: &str, url: &str) -> Feed {
    NewFeed::new(name, url, &owner.id)
        .insert(conn)
        .expect("Failed to create feed")
}

pub fn create_post(
    conn: &mut SqliteConnection,
    feed: &Feed,
    title: &str,
    published_at: NaiveDateTime,
) -> Post {
    let url = format!("{}/{}", feed.url, title);
    NewPost::new(&feed.id, title, &url, None, published_at)
        .insert(conn)
        .expect("Failed to create post")
}

/// Minimal RSS 2.0 document with the given (title, link) items.
pub fn rss_document(channel_title: &str, items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link)| {
            format!(
                "<item><title>{title}</title><link>{link}</link>\
                 <description>About {title}</description>\
                 <pubDate>Mon, 01 Jan 2024 10:00:00 +0000</pubDate></item>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel>\
         <title>{channel_title}</title><link>https://example.com</link>\
         <description>Test channel</description>{items}</channel></rss>"
    )
}

/// Feed source serving canned documents by url and recording every request.
#[derive(Default)]
pub struct StubFeedSource {
    documents: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StubFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.documents.insert(url.to_string(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for StubFeedSource {
    async fn fetch(&self, url: &str, _cancel: &CancellationToken) -> AppResult<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::NetworkError(format!("connection refused: {url}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::users;

    #[test]
    fn test_create_test_db() {
        let (_temp_dir, pool) = create_test_db();
        let mut conn = pool.get().expect("Failed to get connection");

        let user_count: i64 = users::table
            .count()
            .first(&mut conn)
            .expect("Failed to count users");
        assert_eq!(user_count, 0);
    }
}
