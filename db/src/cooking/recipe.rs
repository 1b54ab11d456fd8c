use std::collections::HashMap;

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipe {
    pub recipe_id: i64,
    pub author_user_id: i64,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32, // minutes
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipeIngredient {
    pub ingredient_id: i64,
    pub amount: f64,
}

/// Everything needed to write a recipe. Used for both create and update.
#[derive(Debug, Clone)]
pub struct RecipeFields {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<NewRecipeIngredient>,
    pub tag_ids: Vec<i64>,
}

/// Update where only the collections are mandatory.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Vec<NewRecipeIngredient>,
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author_user_id: Option<i64>,
    /// Matches recipes carrying any of these tag slugs.
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<i64>,
    pub in_shopping_cart_of: Option<i64>,
}

impl RecipeFilter {
    fn push_where(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE TRUE");

        if let Some(author_user_id) = self.author_user_id {
            query
                .push(" AND recipes.author_user_id = ")
                .push_bind(author_user_id);
        }

        if !self.tag_slugs.is_empty() {
            query
                .push(
                    " AND EXISTS (
                        SELECT 1
                        FROM recipe_tags
                        JOIN tags ON tags.tag_id = recipe_tags.tag_id
                        WHERE recipe_tags.recipe_id = recipes.recipe_id
                            AND tags.slug = ANY(",
                )
                .push_bind(self.tag_slugs.clone())
                .push("))");
        }

        if let Some(user_id) = self.favorited_by {
            query
                .push(
                    " AND EXISTS (
                        SELECT 1
                        FROM favorites
                        WHERE favorites.recipe_id = recipes.recipe_id
                            AND favorites.user_id = ",
                )
                .push_bind(user_id)
                .push(")");
        }

        if let Some(user_id) = self.in_shopping_cart_of {
            query
                .push(
                    " AND EXISTS (
                        SELECT 1
                        FROM shopping_cart_entries
                        WHERE shopping_cart_entries.recipe_id = recipes.recipe_id
                            AND shopping_cart_entries.user_id = ",
                )
                .push_bind(user_id)
                .push(")");
        }
    }
}

impl Recipe {
    pub async fn create(pool: &PgPool, author_user_id: i64, fields: RecipeFields) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let recipe = sqlx::query_as::<_, Recipe>(
            r"
            INSERT INTO recipes (author_user_id, name, image, text, cooking_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(author_user_id)
        .bind(fields.name)
        .bind(fields.image)
        .bind(fields.text)
        .bind(fields.cooking_time)
        .fetch_one(&mut *tx)
        .await?;

        replace_components(&mut tx, recipe.recipe_id, &fields.ingredients, &fields.tag_ids)
            .await?;

        tx.commit().await?;

        Ok(recipe)
    }

    pub async fn update(&self, pool: &PgPool, changes: RecipeChanges) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query_as::<_, Recipe>(
            r"
            UPDATE recipes
            SET name = COALESCE($2, name),
                image = COALESCE($3, image),
                text = COALESCE($4, text),
                cooking_time = COALESCE($5, cooking_time),
                updated_at = NOW()
            WHERE recipe_id = $1
            RETURNING *
            ",
        )
        .bind(self.recipe_id)
        .bind(changes.name)
        .bind(changes.image)
        .bind(changes.text)
        .bind(changes.cooking_time)
        .fetch_one(&mut *tx)
        .await?;

        replace_components(&mut tx, self.recipe_id, &changes.ingredients, &changes.tag_ids)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete(&self, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM recipes WHERE recipe_id = $1")
            .bind(self.recipe_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn get_by_id(pool: &PgPool, recipe_id: i64) -> Result<Option<Self>> {
        let recipe = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE recipe_id = $1")
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;

        Ok(recipe)
    }

    /// Newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>> {
        let mut query = QueryBuilder::new("SELECT recipes.* FROM recipes");
        filter.push_where(&mut query);
        query
            .push(" ORDER BY recipes.published_at DESC, recipes.recipe_id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let recipes = query.build_query_as::<Recipe>().fetch_all(pool).await?;

        Ok(recipes)
    }

    pub async fn count(pool: &PgPool, filter: &RecipeFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM recipes");
        filter.push_where(&mut query);

        let count = query.build_query_scalar::<i64>().fetch_one(pool).await?;

        Ok(count)
    }

    /// The newest `limit` recipes of each author, or all of them when
    /// `limit` is `None`.
    pub async fn latest_by_authors(
        pool: &PgPool,
        author_user_ids: &[i64],
        limit: Option<i64>,
    ) -> Result<Vec<Self>> {
        if author_user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let recipes = sqlx::query_as::<_, Recipe>(
            r"
            SELECT *
            FROM (
                SELECT
                    recipes.*,
                    ROW_NUMBER() OVER (
                        PARTITION BY author_user_id
                        ORDER BY published_at DESC, recipe_id DESC
                    ) AS author_rank
                FROM recipes
                WHERE author_user_id = ANY($1)
            ) ranked
            WHERE $2::BIGINT IS NULL OR author_rank <= $2
            ORDER BY published_at DESC, recipe_id DESC
            ",
        )
        .bind(author_user_ids)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(recipes)
    }

    pub async fn count_by_authors(
        pool: &PgPool,
        author_user_ids: &[i64],
    ) -> Result<HashMap<i64, i64>> {
        if author_user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let counts: Vec<(i64, i64)> = sqlx::query_as(
            r"
            SELECT author_user_id, COUNT(*)
            FROM recipes
            WHERE author_user_id = ANY($1)
            GROUP BY author_user_id
            ",
        )
        .bind(author_user_ids)
        .fetch_all(pool)
        .await?;

        Ok(counts.into_iter().collect())
    }
}

async fn replace_components(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    ingredients: &[NewRecipeIngredient],
    tag_ids: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    let ingredient_ids: Vec<i64> = ingredients.iter().map(|i| i.ingredient_id).collect();
    let amounts: Vec<f64> = ingredients.iter().map(|i| i.amount).collect();

    // Keep request order so the recipe and shopping list read back the same way
    sqlx::query(
        r"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount)
        SELECT $1::BIGINT, incoming.ingredient_id, incoming.amount
        FROM UNNEST($2::BIGINT[], $3::DOUBLE PRECISION[])
            WITH ORDINALITY AS incoming (ingredient_id, amount, ordinal)
        ORDER BY incoming.ordinal
        ",
    )
    .bind(recipe_id)
    .bind(ingredient_ids)
    .bind(amounts)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r"
        INSERT INTO recipe_tags (recipe_id, tag_id)
        SELECT $1::BIGINT, UNNEST($2::BIGINT[])
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(recipe_id)
    .bind(tag_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
