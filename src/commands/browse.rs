use std::sync::Arc;

use crate::errors::{AppError, AppResult, ResultExt};
use crate::models::{post::Post, user::User};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 2;

fn parse_limit(args: &[String]) -> AppResult<i64> {
    let Some(raw) = args.first() else {
        return Ok(DEFAULT_LIMIT);
    };
    match raw.parse::<i64>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(AppError::invalid_input(
            "limit",
            &format!("'{raw}' is not a positive integer"),
        )),
    }
}

/// Prints the newest posts from every feed the user follows.
pub async fn browse(state: Arc<AppState>, args: Vec<String>, user: User) -> AppResult<()> {
    let limit = parse_limit(&args)?;

    let mut conn = state.conn()?;
    let posts = Post::get_for_user(&mut conn, &user.id, limit).context("Unable to get posts")?;
    tracing::debug!(count = posts.len(), limit, "Retrieved posts");

    if posts.is_empty() {
        println!("No posts yet");
    }
    for post in posts {
        println!("Title: {}", post.title);
        println!("URL: {}", post.url);
        println!("Published: {}", post.published_at.format("%Y-%m-%d %H:%M"));
        println!("Description:");
        println!("  {}", post.description.as_deref().unwrap_or_default());
        println!("...");
    }
    Ok(())
}
