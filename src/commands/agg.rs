use std::sync::Arc;
use std::time::Duration;

use super::require_args;
use crate::errors::{AppError, AppResult, ResultExt};
use crate::state::AppState;
use crate::tasks::aggregator::runner;

/// Accepts humantime durations such as `30s`, `1m` or `1h 30m`.
fn parse_interval(raw: &str) -> AppResult<Duration> {
    let interval = humantime::parse_duration(raw)
        .map_err(|e| AppError::invalid_input("interval", &format!("'{raw}': {e}")))?;
    if interval.is_zero() {
        return Err(AppError::invalid_input(
            "interval",
            "must be greater than zero",
        ));
    }
    Ok(interval)
}

/// Runs the aggregation loop in the foreground until it fails or is cancelled.
pub async fn agg(state: Arc<AppState>, args: Vec<String>) -> AppResult<()> {
    require_args(&args, 1, "agg <interval>")?;
    let interval = parse_interval(&args[0])?;
    println!("Collecting feeds every {}", humantime::format_duration(interval));

    runner::start(
        state.pool(),
        state.feed_source(),
        interval,
        state.cancel_token(),
    )
    .await
    .context("Unable to fetch feed")
}
