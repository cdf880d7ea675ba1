use std::sync::Arc;

use super::require_args;
use crate::db::DbConn;
use crate::errors::{AppError, AppResult, ResultExt};
use crate::models::{
    feed::Feed,
    feed_follow::{FeedFollow, NewFeedFollow},
    user::User,
};
use crate::state::AppState;

fn feed_by_url(conn: &mut DbConn, url: &str) -> AppResult<Feed> {
    Feed::get_by_url(conn, url)?
        .ok_or_else(|| AppError::resource_not_found(&format!("Feed with url {url}")))
}

pub async fn follow(state: Arc<AppState>, args: Vec<String>, user: User) -> AppResult<()> {
    require_args(&args, 1, "follow <url>")?;
    let url = &args[0];

    let mut conn = state.conn()?;
    let feed = feed_by_url(&mut conn, url)?;
    let follow = NewFeedFollow::new(&user.id, &feed.id)
        .insert(&mut conn)
        .context("Cannot create new follow")?;

    println!(
        "Follow created. Feed: {}, user: {}",
        follow.feed_name, follow.user_name
    );
    Ok(())
}

pub async fn following(state: Arc<AppState>, _args: Vec<String>, user: User) -> AppResult<()> {
    let mut conn = state.conn()?;
    let follows =
        FeedFollow::get_for_user(&mut conn, &user.id).context("Unable to fetch follows for user")?;

    if follows.is_empty() {
        println!("{} is not following any feeds", user.name);
    }
    for (_, feed_name) in follows {
        println!("{feed_name}");
    }
    Ok(())
}

pub async fn unfollow(state: Arc<AppState>, args: Vec<String>, user: User) -> AppResult<()> {
    require_args(&args, 1, "unfollow <url>")?;
    let url = &args[0];

    let mut conn = state.conn()?;
    let feed = feed_by_url(&mut conn, url).context("Can not find feed to unfollow")?;
    let removed = FeedFollow::delete(&mut conn, &user.id, &feed.id)
        .with_context(|| format!("Could not unfollow feed {}", feed.name))?;
    if removed == 0 {
        return Err(AppError::resource_not_found(&format!(
            "Follow of feed {} by {}",
            feed.name, user.name
        )));
    }

    println!("User {} unfollowed feed {}", user.name, feed.name);
    Ok(())
}
