//! PerformanceStore: one aggregate row per user
//!
//! Pure storage, no arithmetic. The running-average update lives in
//! `services::ranking_updater`, which calls these inside its transaction.

use encore_common::db::{PerformanceRecord, UserId};
use encore_common::Result;
use sqlx::{Executor, Sqlite};

pub async fn get<'e, E>(executor: E, user_id: UserId) -> Result<Option<PerformanceRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let record = sqlx::query_as::<_, PerformanceRecord>(
        r#"
        SELECT user_id, total_play_time, total_try, average_score
        FROM performance_records
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;
    Ok(record)
}

/// Insert or overwrite the row for `record.user_id`
pub async fn upsert<'e, E>(executor: E, record: &PerformanceRecord) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO performance_records (
            user_id, total_play_time, total_try, average_score, updated_at
        ) VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(user_id) DO UPDATE SET
            total_play_time = excluded.total_play_time,
            total_try = excluded.total_try,
            average_score = excluded.average_score,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(record.user_id)
    .bind(record.total_play_time)
    .bind(record.total_try)
    .bind(record.average_score)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_all<'e, E>(executor: E) -> Result<Vec<PerformanceRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let records = sqlx::query_as::<_, PerformanceRecord>(
        r#"
        SELECT user_id, total_play_time, total_try, average_score
        FROM performance_records
        ORDER BY user_id
        "#,
    )
    .fetch_all(executor)
    .await?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users;
    use encore_common::db::{init_database, User};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upsert_then_get() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("encore.db")).await.unwrap();
        users::insert_user(
            &pool,
            &User { user_id: 1, username: "alice".into(), avatar_url: None },
        )
        .await
        .unwrap();

        assert!(get(&pool, 1).await.unwrap().is_none());

        let record = PerformanceRecord::first(1, 70, 30);
        upsert(&pool, &record).await.unwrap();
        assert_eq!(get(&pool, 1).await.unwrap(), Some(record.clone()));

        let updated = record.with_session(90, 30).unwrap();
        upsert(&pool, &updated).await.unwrap();
        assert_eq!(get(&pool, 1).await.unwrap(), Some(updated));
        assert_eq!(list_all(&pool).await.unwrap().len(), 1);
    }
}
