use std::collections::HashSet;

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Favorite {
    pub favorite_id: i64,
    pub user_id: i64,
    pub recipe_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    /// Returns `None` if the recipe is already a favorite.
    pub async fn add(pool: &PgPool, user_id: i64, recipe_id: i64) -> Result<Option<Self>> {
        let favorite = sqlx::query_as::<_, Favorite>(
            r"
            INSERT INTO favorites (user_id, recipe_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, recipe_id) DO NOTHING
            RETURNING *
            ",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

        Ok(favorite)
    }

    pub async fn remove(pool: &PgPool, user_id: i64, recipe_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Subset of `recipe_ids` that `user_id` has favorited.
    pub async fn favorited_among(
        pool: &PgPool,
        user_id: i64,
        recipe_ids: &[i64],
    ) -> Result<HashSet<i64>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT recipe_id FROM favorites WHERE user_id = $1 AND recipe_id = ANY($2)",
        )
        .bind(user_id)
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

        Ok(ids.into_iter().collect())
    }
}
