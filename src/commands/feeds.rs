use std::sync::Arc;

use diesel::Connection;

use super::require_args;
use crate::errors::{AppError, AppResult, ResultExt};
use crate::models::{
    feed::{Feed, NewFeed},
    feed_follow::NewFeedFollow,
    user::User,
};
use crate::state::AppState;

/// Only http(s) urls can be polled by the aggregator.
pub(crate) fn validate_feed_url(url: &str) -> AppResult<()> {
    let parsed = url::Url::parse(url)
        .map_err(|e| AppError::invalid_input("url", &format!("'{url}' is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::invalid_input(
            "url",
            &format!("unsupported URL scheme: {scheme}"),
        )),
    }
}

/// Creates the feed and makes its creator follow it, as one transaction.
pub async fn add_feed(state: Arc<AppState>, args: Vec<String>, user: User) -> AppResult<()> {
    require_args(&args, 2, "addfeed <name> <url>")?;
    let (name, url) = (&args[0], &args[1]);
    validate_feed_url(url)?;

    let mut conn = state.conn()?;
    let (feed, follow) = conn
        .transaction::<_, AppError, _>(|conn| {
            let feed = NewFeed::new(name, url, &user.id).insert(conn)?;
            let follow = NewFeedFollow::new(&user.id, &feed.id).insert(conn)?;
            Ok((feed, follow))
        })
        .with_context(|| format!("Unable to create feed '{name}'"))?;

    println!("New feed: {} ({})", feed.name, feed.url);
    println!(
        "user {} is now following feed {}",
        follow.user_name, follow.feed_name
    );
    Ok(())
}

pub async fn list(state: Arc<AppState>, _args: Vec<String>) -> AppResult<()> {
    let mut conn = state.conn()?;
    let feeds = Feed::get_all_with_owner(&mut conn).context("Error retrieving feeds")?;

    for entry in feeds {
        let fetched = entry
            .feed
            .last_fetched_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "Name: {}, url: {}, user name: {}, last fetched: {}",
            entry.feed.name, entry.feed.url, entry.user_name, fetched
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::models::feed_follow::FeedFollow;
    use crate::test_helpers::{create_feed, create_test_state, create_user, StubFeedSource};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_validate_feed_url() {
        assert!(validate_feed_url("https://example.com/rss").is_ok());
        assert_eq!(
            validate_feed_url("not a url").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            validate_feed_url("ftp://example.com/rss").unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[tokio::test]
    async fn test_add_feed_auto_follows() {
        let (_dir, state) = create_test_state(Some("alice"), Arc::new(StubFeedSource::new()));
        let alice = create_user(&mut state.conn().unwrap(), "alice");

        add_feed(
            Arc::clone(&state),
            args(&["Blog", "https://example.com/rss"]),
            alice.clone(),
        )
        .await
        .unwrap();

        let mut conn = state.conn().unwrap();
        let feed = Feed::get_by_url(&mut conn, "https://example.com/rss")
            .unwrap()
            .unwrap();
        assert_eq!(feed.user_id, alice.id);
        let follows = FeedFollow::get_for_user(&mut conn, &alice.id).unwrap();
        assert_eq!(follows.len(), 1);
        assert_eq!(follows[0].1, "Blog");
    }

    #[tokio::test]
    async fn test_add_duplicate_feed_leaves_no_partial_state() {
        let (_dir, state) = create_test_state(Some("bob"), Arc::new(StubFeedSource::new()));
        let (alice, bob) = {
            let mut conn = state.conn().unwrap();
            let alice = create_user(&mut conn, "alice");
            let bob = create_user(&mut conn, "bob");
            create_feed(&mut conn, &alice, "Blog", "https://example.com/rss");
            (alice, bob)
        };

        let err = add_feed(
            Arc::clone(&state),
            args(&["Copy", "https://example.com/rss"]),
            bob.clone(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

        let mut conn = state.conn().unwrap();
        assert!(FeedFollow::get_for_user(&mut conn, &bob.id).unwrap().is_empty());
        assert_eq!(
            Feed::get_by_url(&mut conn, "https://example.com/rss")
                .unwrap()
                .unwrap()
                .user_id,
            alice.id
        );
    }

    #[tokio::test]
    async fn test_add_feed_requires_two_args() {
        let (_dir, state) = create_test_state(Some("alice"), Arc::new(StubFeedSource::new()));
        let alice = create_user(&mut state.conn().unwrap(), "alice");
        let err = add_feed(state, args(&["Blog"]), alice).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
