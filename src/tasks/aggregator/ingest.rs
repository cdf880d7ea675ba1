use diesel::SqliteConnection;

use crate::errors::{AppError, AppResult, ResultExt};
use crate::feed_parser::ParsedItem;
use crate::models::{
    now,
    post::{NewPost, Post},
};

/// Stores one parsed item as a post of `feed_id`.
///
/// The post url is the deduplication key: an item whose link is already stored fails
/// with `DuplicateResource`, and an item with no link at all is rejected up front.
pub fn save_post(conn: &mut SqliteConnection, item: &ParsedItem, feed_id: &str) -> AppResult<Post> {
    log::debug!("Saving post {}", item.title);
    if item.link.trim().is_empty() {
        return Err(AppError::invalid_input(
            "link",
            &format!("item '{}' has no link", item.title),
        ));
    }

    let published_at = item
        .published_at
        .map(|ts| ts.naive_utc())
        .unwrap_or_else(now);
    let post = NewPost::new(
        feed_id,
        &item.title,
        &item.link,
        item.description.as_deref(),
        published_at,
    )
    .insert(conn)
    .with_context(|| format!("Unable to save post {}", item.title))?;

    log::debug!("Post saved: {}", post.url);
    Ok(post)
}
