use std::collections::HashSet;

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use shopping_list::{IngredientUsage, RecipeRef};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShoppingCartEntry {
    pub shopping_cart_entry_id: i64,
    pub user_id: i64,
    pub recipe_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Queued recipes and their ingredient rows, read from one snapshot.
#[derive(Debug, Clone, Default)]
pub struct CartContents {
    pub recipes: Vec<RecipeRef>,
    pub usages: Vec<IngredientUsage>,
}

impl ShoppingCartEntry {
    /// Returns `None` if the recipe is already in the cart.
    pub async fn add(pool: &PgPool, user_id: i64, recipe_id: i64) -> Result<Option<Self>> {
        let entry = sqlx::query_as::<_, ShoppingCartEntry>(
            r"
            INSERT INTO shopping_cart_entries (user_id, recipe_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, recipe_id) DO NOTHING
            RETURNING *
            ",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

        Ok(entry)
    }

    pub async fn remove(pool: &PgPool, user_id: i64, recipe_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM shopping_cart_entries WHERE user_id = $1 AND recipe_id = $2",
        )
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Subset of `recipe_ids` that `user_id` has queued.
    pub async fn queued_among(
        pool: &PgPool,
        user_id: i64,
        recipe_ids: &[i64],
    ) -> Result<HashSet<i64>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT recipe_id FROM shopping_cart_entries WHERE user_id = $1 AND recipe_id = ANY($2)",
        )
        .bind(user_id)
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    /// Everything in the user's cart, in the order it was queued.
    ///
    /// Ingredient rows are flattened per recipe (one row per recipe and
    /// ingredient, never summed here) in the order the recipe lists them.
    /// Both reads share a repeatable-read transaction so a concurrent cart
    /// edit can't make the recipe list and the ingredient rows disagree.
    #[tracing::instrument(err, skip(pool))]
    pub async fn contents(pool: &PgPool, user_id: i64) -> Result<CartContents> {
        let mut tx = pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let recipes: Vec<(i64, String)> = sqlx::query_as(
            r"
            SELECT recipes.recipe_id, recipes.name
            FROM shopping_cart_entries
            JOIN recipes ON recipes.recipe_id = shopping_cart_entries.recipe_id
            WHERE shopping_cart_entries.user_id = $1
            ORDER BY shopping_cart_entries.shopping_cart_entry_id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let usages: Vec<(String, String, f64)> = sqlx::query_as(
            r"
            SELECT ingredients.name, ingredients.measurement_unit, recipe_ingredients.amount
            FROM shopping_cart_entries
            JOIN recipe_ingredients
                ON recipe_ingredients.recipe_id = shopping_cart_entries.recipe_id
            JOIN ingredients
                ON ingredients.ingredient_id = recipe_ingredients.ingredient_id
            WHERE shopping_cart_entries.user_id = $1
            ORDER BY
                shopping_cart_entries.shopping_cart_entry_id,
                recipe_ingredients.recipe_ingredient_id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            recipes = recipes.len(),
            usages = usages.len(),
            "Loaded shopping cart"
        );

        Ok(CartContents {
            recipes: recipes
                .into_iter()
                .map(|(id, name)| RecipeRef { id, name })
                .collect(),
            usages: usages
                .into_iter()
                .map(|(name, unit, amount)| IngredientUsage::new(name, unit, amount))
                .collect(),
        })
    }
}
