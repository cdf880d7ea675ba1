use crate::schema::*;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{new_id, now, user::User};
use crate::errors::AppResult;

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations, PartialEq,
)]
#[diesel(belongs_to(User))]
#[diesel(table_name = feeds)]
pub struct Feed {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub name: String,
    pub url: String,
    pub user_id: String,
    /// None until the aggregator has fetched the feed once
    pub last_fetched_at: Option<NaiveDateTime>,
}

/// A feed together with the name of the user who added it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedWithOwner {
    pub feed: Feed,
    pub user_name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = feeds)]
pub struct NewFeed<'a> {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub name: &'a str,
    pub url: &'a str,
    pub user_id: &'a str,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = feeds)]
pub struct PartialFeed {
    pub updated_at: Option<NaiveDateTime>,
    pub last_fetched_at: Option<Option<NaiveDateTime>>,
}

impl<'a> NewFeed<'a> {
    pub fn new(name: &'a str, url: &'a str, user_id: &'a str) -> Self {
        let ts = now();
        NewFeed {
            id: new_id(),
            created_at: ts,
            updated_at: ts,
            name,
            url,
            user_id,
        }
    }

    pub fn insert(&self, conn: &mut SqliteConnection) -> AppResult<Feed> {
        use crate::schema::feeds::dsl::*;
        match diesel::insert_into(feeds).values(self).get_result(conn) {
            Ok(feed) => Ok(feed),
            Err(e) => {
                log::warn!("Error inserting feed: {:?}", e);
                Err(e.into())
            }
        }
    }
}

impl Feed {
    pub fn get_by_url(conn: &mut SqliteConnection, feed_url: &str) -> AppResult<Option<Feed>> {
        use crate::schema::feeds::dsl::{feeds, url};
        let found = feeds
            .filter(url.eq(feed_url))
            .first::<Feed>(conn)
            .optional()?;
        if found.is_none() {
            log::info!("Requested feed w/ URL '{}' not found", feed_url);
        }
        Ok(found)
    }

    pub fn get_all_with_owner(conn: &mut SqliteConnection) -> AppResult<Vec<FeedWithOwner>> {
        let rows = feeds::table
            .inner_join(users::table)
            .order(feeds::created_at.asc())
            .select((Feed::as_select(), users::name))
            .load::<(Feed, String)>(conn)?;
        Ok(rows
            .into_iter()
            .map(|(feed, user_name)| FeedWithOwner { feed, user_name })
            .collect())
    }

    /// The feed that has waited longest: never-fetched feeds first (SQLite sorts NULL
    /// before any value in ascending order), then oldest fetch, then creation order.
    /// Fails with NotFound when there are no feeds at all.
    pub fn get_next_to_fetch(conn: &mut SqliteConnection) -> AppResult<Feed> {
        use crate::schema::feeds::dsl::{created_at, feeds, id, last_fetched_at};
        Ok(feeds
            .order((last_fetched_at.asc(), created_at.asc(), id.asc()))
            .first::<Feed>(conn)?)
    }

    pub fn mark_fetched(
        conn: &mut SqliteConnection,
        feed_id: &str,
        fetched_at: NaiveDateTime,
    ) -> AppResult<Feed> {
        let update = PartialFeed {
            updated_at: Some(fetched_at),
            last_fetched_at: Some(Some(fetched_at)),
        };
        Feed::update(conn, feed_id, &update)
    }

    pub fn update(conn: &mut SqliteConnection, feed_id: &str, update: &PartialFeed) -> AppResult<Feed> {
        use crate::schema::feeds::dsl::{feeds, id};
        match diesel::update(feeds.filter(id.eq(feed_id)))
            .set(update)
            .get_result(conn)
        {
            Ok(feed) => Ok(feed),
            Err(e) => {
                log::warn!("Error updating feed: {:?}", e);
                Err(e.into())
            }
        }
    }
}
