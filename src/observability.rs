use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub log_level: String,
    pub json: bool,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
            json: std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")),
        }
    }
}

/// Initialize structured logging on stderr. `RUST_LOG` takes precedence over `LOG_LEVEL`.
pub fn init_logging(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(false)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
        return;
    }

    tracing::debug!(
        service = "gator",
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.log_level,
        json = config.json,
        "Logging initialized"
    );
}
