//! User lookups
//!
//! Accounts belong to the auth service. This module only reads them, apart
//! from `insert_user`, which exists for seeding and tests.

use encore_common::db::{User, UserId};
use encore_common::Result;
use sqlx::{Executor, Sqlite};

pub async fn exists<'e, E>(executor: E, user_id: UserId) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(found.is_some())
}

pub async fn insert_user<'e, E>(executor: E, user: &User) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO users (user_id, username, avatar_url) VALUES (?, ?, ?)")
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.avatar_url)
        .execute(executor)
        .await?;
    Ok(())
}
