pub mod feed;
pub mod feed_follow;
pub mod post;
pub mod user;

use chrono::{NaiveDateTime, Utc};

/// Current UTC time in the representation stored in the database.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
