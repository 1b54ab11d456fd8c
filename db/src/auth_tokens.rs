use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::users::User;

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct AuthToken {
    pub token: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Reuses the user's existing token if there is one, so repeated logins
    /// from several clients share a key until one of them logs out.
    pub async fn get_or_create(pool: &PgPool, user_id: i64) -> Result<Self> {
        let existing = sqlx::query_as::<_, AuthToken>(
            r"
            SELECT *
            FROM auth_tokens
            WHERE user_id = $1
            ORDER BY created_at
            LIMIT 1
            ",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        if let Some(token) = existing {
            return Ok(token);
        }

        let token = sqlx::query_as::<_, AuthToken>(
            r"
            INSERT INTO auth_tokens (token, user_id)
            VALUES ($1, $2)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    pub async fn find_user(pool: &PgPool, token: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT users.*
            FROM auth_tokens
            JOIN users ON users.user_id = auth_tokens.user_id
            WHERE auth_tokens.token = $1
            ",
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn delete(pool: &PgPool, token: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM auth_tokens WHERE token = $1")
            .bind(token)
            .execute(pool)
            .await?;

        Ok(())
    }
}
