pub mod ingest;
pub mod runner;

pub use ingest::save_post;
pub use runner::{scrape_next_feed, start, ScrapeReport};
