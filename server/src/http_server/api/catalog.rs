use axum::{
    extract::{Path, Query, State},
    Json,
};
use db::cooking::{Ingredient, Tag};
use serde::Deserialize;

use super::representations::{IngredientView, TagView};
use crate::{
    http_server::{errors::OrNotFound as _, ResponseResult},
    AppState,
};

pub(crate) async fn list_tags(State(state): State<AppState>) -> ResponseResult<Json<Vec<TagView>>> {
    let tags = Tag::list(&state.db).await?;

    Ok(Json(tags.into_iter().map(TagView::from).collect()))
}

pub(crate) async fn get_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
) -> ResponseResult<Json<TagView>> {
    let tag = Tag::get_by_id(&state.db, tag_id).await?.or_not_found()?;

    Ok(Json(tag.into()))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IngredientSearch {
    name: Option<String>,
}

impl IngredientSearch {
    /// A blank `?name=` searches everything.
    fn prefix(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

#[tracing::instrument(skip(state))]
pub(crate) async fn list_ingredients(
    State(state): State<AppState>,
    Query(search): Query<IngredientSearch>,
) -> ResponseResult<Json<Vec<IngredientView>>> {
    let ingredients = Ingredient::search(&state.db, search.prefix()).await?;

    Ok(Json(
        ingredients.into_iter().map(IngredientView::from).collect(),
    ))
}

pub(crate) async fn get_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<i64>,
) -> ResponseResult<Json<IngredientView>> {
    let ingredient = Ingredient::get_by_id(&state.db, ingredient_id)
        .await?
        .or_not_found()?;

    Ok(Json(ingredient.into()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blank_search_matches_everything() {
        assert_eq!(IngredientSearch::default().prefix(), None);
        assert_eq!(
            IngredientSearch {
                name: Some(String::new())
            }
            .prefix(),
            None
        );
        assert_eq!(
            IngredientSearch {
                name: Some("Му".to_string())
            }
            .prefix(),
            Some("Му")
        );
    }
}
