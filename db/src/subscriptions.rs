use std::collections::HashSet;

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::users::User;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub subscription_id: i64,
    pub user_id: i64,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Returns `None` if `user_id` already follows `author_id`.
    pub async fn create(pool: &PgPool, user_id: i64, author_id: i64) -> Result<Option<Self>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r"
            INSERT INTO subscriptions (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            RETURNING *
            ",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(pool)
        .await?;

        Ok(subscription)
    }

    /// Returns whether a subscription was actually removed.
    pub async fn delete(pool: &PgPool, user_id: i64, author_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM subscriptions
            WHERE user_id = $1 AND author_id = $2
            ",
        )
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Subset of `author_ids` that `user_id` follows.
    pub async fn followed_among(
        pool: &PgPool,
        user_id: i64,
        author_ids: &[i64],
    ) -> Result<HashSet<i64>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let followed: Vec<i64> = sqlx::query_scalar(
            r"
            SELECT author_id
            FROM subscriptions
            WHERE user_id = $1 AND author_id = ANY($2)
            ",
        )
        .bind(user_id)
        .bind(author_ids)
        .fetch_all(pool)
        .await?;

        Ok(followed.into_iter().collect())
    }

    /// Authors `user_id` follows, newest accounts first.
    pub async fn authors(
        pool: &PgPool,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>> {
        let authors = sqlx::query_as::<_, User>(
            r"
            SELECT users.*
            FROM subscriptions
            JOIN users ON users.user_id = subscriptions.author_id
            WHERE subscriptions.user_id = $1
            ORDER BY users.user_id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(authors)
    }

    pub async fn count_authors(pool: &PgPool, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
