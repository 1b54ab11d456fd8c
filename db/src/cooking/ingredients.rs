use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ingredient {
    pub ingredient_id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// An ingredient as used by one recipe, with its name and unit resolved.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecipeIngredient {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: f64,
}

impl Ingredient {
    /// Returns `None` if the exact name and unit pair already exists.
    pub async fn create(pool: &PgPool, name: &str, measurement_unit: &str) -> Result<Option<Self>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            r"
            INSERT INTO ingredients (name, measurement_unit)
            VALUES ($1, $2)
            ON CONFLICT (name, measurement_unit) DO NOTHING
            RETURNING *
            ",
        )
        .bind(name)
        .bind(measurement_unit)
        .fetch_optional(pool)
        .await?;

        Ok(ingredient)
    }

    /// Ingredients whose name starts with `prefix`, or every ingredient.
    pub async fn search(pool: &PgPool, prefix: Option<&str>) -> Result<Vec<Self>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            r"
            SELECT *
            FROM ingredients
            WHERE $1::TEXT IS NULL OR starts_with(name, $1)
            ORDER BY name, ingredient_id
            ",
        )
        .bind(prefix)
        .fetch_all(pool)
        .await?;

        Ok(ingredients)
    }

    pub async fn get_by_id(pool: &PgPool, ingredient_id: i64) -> Result<Option<Self>> {
        let ingredient =
            sqlx::query_as::<_, Ingredient>("SELECT * FROM ingredients WHERE ingredient_id = $1")
                .bind(ingredient_id)
                .fetch_optional(pool)
                .await?;

        Ok(ingredient)
    }

    /// Subset of `ingredient_ids` that exist.
    pub async fn existing_ids(pool: &PgPool, ingredient_ids: &[i64]) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT ingredient_id FROM ingredients WHERE ingredient_id = ANY($1)",
        )
        .bind(ingredient_ids)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }
}

impl RecipeIngredient {
    /// Rows come back per recipe in the order the ingredients were added.
    pub async fn for_recipes(pool: &PgPool, recipe_ids: &[i64]) -> Result<Vec<Self>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ingredients = sqlx::query_as::<_, RecipeIngredient>(
            r"
            SELECT
                recipe_ingredients.recipe_id,
                ingredients.ingredient_id,
                ingredients.name,
                ingredients.measurement_unit,
                recipe_ingredients.amount
            FROM recipe_ingredients
            JOIN ingredients ON ingredients.ingredient_id = recipe_ingredients.ingredient_id
            WHERE recipe_ingredients.recipe_id = ANY($1)
            ORDER BY recipe_ingredients.recipe_ingredient_id
            ",
        )
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

        Ok(ingredients)
    }
}
