use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Which unique columns a registration would collide with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conflicts {
    pub username: bool,
    pub email: bool,
}

impl Conflicts {
    pub fn any(self) -> bool {
        self.username || self.email
    }
}

impl User {
    /// Returns `None` when the username or email is already taken.
    pub async fn create(pool: &PgPool, new_user: NewUser) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (email, username, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            RETURNING *
            ",
        )
        .bind(new_user.email)
        .bind(new_user.username)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.password_hash)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn conflicts(pool: &PgPool, username: &str, email: &str) -> Result<Conflicts> {
        let (username, email): (bool, bool) = sqlx::query_as(
            r"
            SELECT
                EXISTS (SELECT 1 FROM users WHERE username = $1),
                EXISTS (SELECT 1 FROM users WHERE email = $2)
            ",
        )
        .bind(username)
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(Conflicts { username, email })
    }

    pub async fn get_by_id(pool: &PgPool, user_id: i64) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_ids(pool: &PgPool, user_ids: &[i64]) -> Result<Vec<Self>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ANY($1)")
            .bind(user_ids)
            .fetch_all(pool)
            .await?;

        Ok(users)
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Newest accounts first.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        let users = sqlx::query_as::<_, User>(
            r"
            SELECT *
            FROM users
            ORDER BY user_id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn set_password_hash(&self, pool: &PgPool, password_hash: String) -> Result<()> {
        sqlx::query(
            r"
            UPDATE users
            SET password_hash = $2,
                updated_at = NOW()
            WHERE user_id = $1
            ",
        )
        .bind(self.user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(())
    }
}
