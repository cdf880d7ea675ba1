use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;

use gator::{
    commands::{register_all, Command, Commands},
    config::{AppConfig, Preferences},
    db::{initialize_db_pool, run_migrations},
    errors::AppResult,
    fetcher::HttpFeedSource,
    observability::{init_logging, LogConfig},
    state::AppState,
};

/// CLI options
#[derive(Parser, Debug)]
#[command(author, version, about = "Aggregate RSS and Atom feeds from the command line", long_about = None)]
struct Args {
    /// Preference file to use instead of ~/.gatorconfig.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// One of: register, login, reset, users, agg, addfeed, feeds, follow, following, unfollow, browse
    command: String,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();
    init_logging(&LogConfig::from_env());

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> AppResult<()> {
    let config_path = match args.config {
        Some(path) => path,
        None => Preferences::default_path()?,
    };
    let prefs = Preferences::read(config_path)?;
    let config = AppConfig::load(&prefs)?;

    let pool = initialize_db_pool(&config.db_url)?;
    run_migrations(&pool)?;

    let source = HttpFeedSource::new(config.fetch_timeout)?;
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let state = Arc::new(AppState::new(prefs, pool, Arc::new(source), cancel));
    let mut commands = Commands::new();
    register_all(&mut commands);

    commands
        .run(state, Command::new(args.command, args.args))
        .await
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Interrupt received, shutting down");
            cancel.cancel();
        }
        Err(e) => tracing::warn!("Unable to listen for interrupt: {e}"),
    }
}
