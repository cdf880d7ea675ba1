use super::feed::Feed;
use crate::schema::*;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{new_id, now};
use crate::errors::AppResult;

#[derive(
    Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations, PartialEq,
)]
#[diesel(belongs_to(Feed))]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: NaiveDateTime,
    pub feed_id: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost<'a> {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub title: &'a str,
    pub url: &'a str,
    pub description: Option<&'a str>,
    pub published_at: NaiveDateTime,
    pub feed_id: &'a str,
}

impl<'a> NewPost<'a> {
    pub fn new(
        feed_id: &'a str,
        title: &'a str,
        url: &'a str,
        description: Option<&'a str>,
        published_at: NaiveDateTime,
    ) -> Self {
        let ts = now();
        NewPost {
            id: new_id(),
            created_at: ts,
            updated_at: ts,
            title,
            url,
            description,
            published_at,
            feed_id,
        }
    }

    /// Single insert; a post whose url is already stored fails with a unique violation.
    pub fn insert(&self, conn: &mut SqliteConnection) -> AppResult<Post> {
        use crate::schema::posts::dsl::*;
        Ok(diesel::insert_into(posts).values(self).get_result(conn)?)
    }
}

impl Post {
    /// The newest posts across every feed the user follows.
    pub fn get_for_user(
        conn: &mut SqliteConnection,
        user_id: &str,
        limit: i64,
    ) -> AppResult<Vec<Post>> {
        Ok(posts::table
            .inner_join(feed_follows::table.on(feed_follows::feed_id.eq(posts::feed_id)))
            .filter(feed_follows::user_id.eq(user_id))
            .order((posts::published_at.desc(), posts::created_at.desc()))
            .limit(limit)
            .select(Post::as_select())
            .load::<Post>(conn)?)
    }

    pub fn count_for_feed(conn: &mut SqliteConnection, feed_id: &str) -> AppResult<i64> {
        Ok(posts::table
            .filter(posts::feed_id.eq(feed_id))
            .count()
            .get_result(conn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::models::feed_follow::NewFeedFollow;
    use crate::test_helpers::{create_feed, create_post, create_user, get_test_db_connection};
    use chrono::Duration;

    #[test]
    fn test_duplicate_url_is_rejected() {
        let mut conn = get_test_db_connection();
        let user = create_user(&mut conn, "alice");
        let feed = create_feed(&mut conn, &user, "Blog", "https://example.com/rss");
        let when = now();

        NewPost::new(&feed.id, "One", "https://example.com/1", None, when)
            .insert(&mut conn)
            .unwrap();
        let err = NewPost::new(&feed.id, "One again", "https://example.com/1", None, when)
            .insert(&mut conn)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
        assert_eq!(Post::count_for_feed(&mut conn, &feed.id).unwrap(), 1);
    }

    #[test]
    fn test_get_for_user_only_followed_newest_first() {
        let mut conn = get_test_db_connection();
        let alice = create_user(&mut conn, "alice");
        let bob = create_user(&mut conn, "bob");
        let followed = create_feed(&mut conn, &alice, "Mine", "https://mine.example/rss");
        let other = create_feed(&mut conn, &bob, "Theirs", "https://theirs.example/rss");
        NewFeedFollow::new(&alice.id, &followed.id)
            .insert(&mut conn)
            .unwrap();

        let base = now();
        create_post(&mut conn, &followed, "old", base - Duration::days(2));
        create_post(&mut conn, &followed, "new", base);
        create_post(&mut conn, &followed, "mid", base - Duration::days(1));
        create_post(&mut conn, &other, "elsewhere", base + Duration::days(1));

        let titles: Vec<String> = Post::get_for_user(&mut conn, &alice.id, 10)
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);

        let limited = Post::get_for_user(&mut conn, &alice.id, 2).unwrap();
        assert_eq!(limited.len(), 2);
    }
}
