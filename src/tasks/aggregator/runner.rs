use std::time::Duration;

use diesel::SqliteConnection;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::ingest::save_post;
use crate::{
    errors::{AppResult, ResultExt},
    feed_parser::parse_feed,
    fetcher::FeedSource,
    models::{feed::Feed, now},
    DbPool,
};

/// Outcome of one scrape of a single feed.
#[derive(Debug)]
pub struct ScrapeReport {
    pub feed: Feed,
    pub added: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Claims the feed that has waited longest, fetches and parses it, marks it fetched,
/// then stores each item. Only the claim, fetch, parse and mark steps are fatal.
pub async fn scrape_next_feed(
    conn: &mut SqliteConnection,
    source: &dyn FeedSource,
    cancel: &CancellationToken,
) -> AppResult<ScrapeReport> {
    let feed = Feed::get_next_to_fetch(conn).context("Error finding next feed to fetch")?;
    println!("Fetching feed {}...", feed.name);

    let body = source
        .fetch(&feed.url, cancel)
        .await
        .context("Unable to fetch feed data")?;
    let parsed = parse_feed(&body).context("Unable to fetch feed data")?;

    let feed = Feed::mark_fetched(conn, &feed.id, now()).context("Unable to mark feed as fetched")?;

    let mut report = ScrapeReport {
        feed,
        added: 0,
        duplicates: 0,
        failed: 0,
    };
    for item in &parsed.items {
        match save_post(conn, item, &report.feed.id) {
            Ok(_) => report.added += 1,
            Err(e) if e.is_duplicate() => {
                log::debug!("Item already exists: {}", item.link);
                report.duplicates += 1;
            }
            Err(e) => {
                log::warn!("Unable to save post: {e}");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        feed = %report.feed.name,
        items = parsed.items.len(),
        added = report.added,
        duplicates = report.duplicates,
        failed = report.failed,
        "Feed scraped"
    );
    Ok(report)
}

/// Scrapes one feed immediately and then once per `interval` until `cancel` fires
/// or a scrape fails. Cancellation ends the loop with `Ok`.
pub async fn start(
    pool: &DbPool,
    source: &dyn FeedSource,
    interval: Duration,
    cancel: &CancellationToken,
) -> AppResult<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Aggregation cancelled");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let mut conn = pool.get()?;
        match scrape_next_feed(&mut conn, source, cancel).await {
            Ok(report) => println!(
                "... {} new posts from {} ({} already stored)",
                report.added, report.feed.name, report.duplicates
            ),
            Err(_) if cancel.is_cancelled() => {
                log::info!("Aggregation cancelled during fetch");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}
