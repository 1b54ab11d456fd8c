use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub tag_id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// A tag together with the recipe it is attached to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeTag {
    pub recipe_id: i64,
    #[sqlx(flatten)]
    pub tag: Tag,
}

impl Tag {
    /// Returns `None` if the name, colour or slug is already taken.
    pub async fn create(pool: &PgPool, name: &str, color: &str, slug: &str) -> Result<Option<Self>> {
        let tag = sqlx::query_as::<_, Tag>(
            r"
            INSERT INTO tags (name, color, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            RETURNING *
            ",
        )
        .bind(name)
        .bind(color)
        .bind(slug)
        .fetch_optional(pool)
        .await?;

        Ok(tag)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name")
            .fetch_all(pool)
            .await?;

        Ok(tags)
    }

    pub async fn get_by_id(pool: &PgPool, tag_id: i64) -> Result<Option<Self>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE tag_id = $1")
            .bind(tag_id)
            .fetch_optional(pool)
            .await?;

        Ok(tag)
    }

    /// Subset of `tag_ids` that exist.
    pub async fn existing_ids(pool: &PgPool, tag_ids: &[i64]) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT tag_id FROM tags WHERE tag_id = ANY($1)")
            .bind(tag_ids)
            .fetch_all(pool)
            .await?;

        Ok(ids)
    }
}

impl RecipeTag {
    pub async fn for_recipes(pool: &PgPool, recipe_ids: &[i64]) -> Result<Vec<Self>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tags = sqlx::query_as::<_, RecipeTag>(
            r"
            SELECT recipe_tags.recipe_id, tags.tag_id, tags.name, tags.color, tags.slug
            FROM recipe_tags
            JOIN tags ON tags.tag_id = recipe_tags.tag_id
            WHERE recipe_tags.recipe_id = ANY($1)
            ORDER BY tags.name
            ",
        )
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }
}
