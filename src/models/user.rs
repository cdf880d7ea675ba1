use crate::schema::*;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::{new_id, now};
use crate::errors::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub name: &'a str,
}

impl<'a> NewUser<'a> {
    pub fn new(name: &'a str) -> Self {
        let ts = now();
        NewUser {
            id: new_id(),
            created_at: ts,
            updated_at: ts,
            name,
        }
    }

    pub fn insert(&self, conn: &mut SqliteConnection) -> AppResult<User> {
        use crate::schema::users::dsl::*;
        match diesel::insert_into(users).values(self).get_result(conn) {
            Ok(user) => Ok(user),
            Err(e) => {
                log::warn!("Error inserting user {}: {:?}", self.name, e);
                Err(e.into())
            }
        }
    }
}

impl User {
    pub fn get_by_name(conn: &mut SqliteConnection, user_name: &str) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::{name, users};
        Ok(users
            .filter(name.eq(user_name))
            .first::<User>(conn)
            .optional()?)
    }

    pub fn get_all(conn: &mut SqliteConnection) -> AppResult<Vec<User>> {
        use crate::schema::users::dsl::{created_at, users};
        log::debug!("Getting all users");
        Ok(users.order(created_at.asc()).load::<User>(conn)?)
    }

    /// Removes every user; feeds, follows and posts go with them through cascading deletes.
    pub fn delete_all(conn: &mut SqliteConnection) -> AppResult<usize> {
        use crate::schema::users::dsl::users;
        Ok(diesel::delete(users).execute(conn)?)
    }
}
