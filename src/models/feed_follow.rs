use crate::schema::*;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{feed::Feed, new_id, now};
use crate::errors::AppResult;

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations, PartialEq,
)]
#[diesel(belongs_to(Feed))]
#[diesel(table_name = feed_follows)]
pub struct FeedFollow {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub user_id: String,
    pub feed_id: String,
}

/// A follow joined with the names of its feed and user.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFollowDetails {
    pub follow: FeedFollow,
    pub feed_name: String,
    pub user_name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = feed_follows)]
pub struct NewFeedFollow<'a> {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub user_id: &'a str,
    pub feed_id: &'a str,
}

impl<'a> NewFeedFollow<'a> {
    pub fn new(user_id: &'a str, feed_id: &'a str) -> Self {
        let ts = now();
        NewFeedFollow {
            id: new_id(),
            created_at: ts,
            updated_at: ts,
            user_id,
            feed_id,
        }
    }

    /// Inserts the follow and reads it back with the joined feed and user names.
    pub fn insert(&self, conn: &mut SqliteConnection) -> AppResult<FeedFollowDetails> {
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let follow: FeedFollow = diesel::insert_into(feed_follows::table)
                .values(self)
                .get_result(conn)?;
            let feed_name = feeds::table
                .find(&follow.feed_id)
                .select(feeds::name)
                .first::<String>(conn)?;
            let user_name = users::table
                .find(&follow.user_id)
                .select(users::name)
                .first::<String>(conn)?;
            Ok(FeedFollowDetails {
                follow,
                feed_name,
                user_name,
            })
        })
        .map_err(|e| {
            log::warn!("Error inserting feed follow: {:?}", e);
            e.into()
        })
    }
}

impl FeedFollow {
    /// Follows of one user, each with the followed feed's name.
    pub fn get_for_user(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> AppResult<Vec<(FeedFollow, String)>> {
        Ok(feed_follows::table
            .inner_join(feeds::table)
            .filter(feed_follows::user_id.eq(user_id))
            .order(feed_follows::created_at.asc())
            .select((FeedFollow::as_select(), feeds::name))
            .load::<(FeedFollow, String)>(conn)?)
    }

    /// Returns the number of follows removed (0 or 1).
    pub fn delete(conn: &mut SqliteConnection, user_id: &str, feed_id: &str) -> AppResult<usize> {
        match diesel::delete(
            feed_follows::table
                .filter(feed_follows::user_id.eq(user_id))
                .filter(feed_follows::feed_id.eq(feed_id)),
        )
        .execute(conn)
        {
            Ok(n) => Ok(n),
            Err(e) => {
                log::warn!("Error deleting feed follow: {:?}", e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_helpers::{create_feed, create_user, get_test_db_connection};

    #[test]
    fn test_insert_returns_joined_names() {
        let mut conn = get_test_db_connection();
        let alice = create_user(&mut conn, "alice");
        let bob = create_user(&mut conn, "bob");
        let feed = create_feed(&mut conn, &alice, "Blog", "https://example.com/rss");

        let details = NewFeedFollow::new(&bob.id, &feed.id)
            .insert(&mut conn)
            .unwrap();
        assert_eq!(details.feed_name, "Blog");
        assert_eq!(details.user_name, "bob");
        assert_eq!(details.follow.user_id, bob.id);
    }

    #[test]
    fn test_follow_is_unique_per_pair() {
        let mut conn = get_test_db_connection();
        let alice = create_user(&mut conn, "alice");
        let feed = create_feed(&mut conn, &alice, "Blog", "https://example.com/rss");
        NewFeedFollow::new(&alice.id, &feed.id)
            .insert(&mut conn)
            .unwrap();

        let err = NewFeedFollow::new(&alice.id, &feed.id)
            .insert(&mut conn)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    }

    #[test]
    fn test_follow_requires_existing_feed() {
        let mut conn = get_test_db_connection();
        let alice = create_user(&mut conn, "alice");
        let err = NewFeedFollow::new(&alice.id, "no-such-feed")
            .insert(&mut conn)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    }

    #[test]
    fn test_get_for_user_and_delete() {
        let mut conn = get_test_db_connection();
        let alice = create_user(&mut conn, "alice");
        let a = create_feed(&mut conn, &alice, "A", "https://a.example/rss");
        let b = create_feed(&mut conn, &alice, "B", "https://b.example/rss");
        NewFeedFollow::new(&alice.id, &a.id).insert(&mut conn).unwrap();
        NewFeedFollow::new(&alice.id, &b.id).insert(&mut conn).unwrap();

        let names: Vec<String> = FeedFollow::get_for_user(&mut conn, &alice.id)
            .unwrap()
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);

        assert_eq!(FeedFollow::delete(&mut conn, &alice.id, &a.id).unwrap(), 1);
        assert_eq!(FeedFollow::delete(&mut conn, &alice.id, &a.id).unwrap(), 0);
        assert_eq!(FeedFollow::get_for_user(&mut conn, &alice.id).unwrap().len(), 1);
    }
}
