use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Query;
use color_eyre::eyre::eyre;
use db::{
    cooking::{Ingredient, NewRecipeIngredient, Recipe, RecipeChanges, RecipeFields, RecipeFilter, Tag},
    PgPool,
};
use serde::Deserialize;

use super::representations::{recipe_view, recipe_views, RecipeView};
use crate::{
    http_server::{
        auth::{CurrentUser, MaybeUser},
        errors::{OrNotFound as _, ServerError},
        pagination::{Page, PageParams},
        validation::{self, FieldError, ValidationErrors},
        ResponseResult,
    },
    AppState,
};

const NOT_AUTHOR: &str = "У вас недостаточно прав для выполнения данного действия.";

/// `?author=&tags=&tags=&is_favorited=&is_in_shopping_cart=&page=&limit=`
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RecipeQuery {
    author: Option<i64>,
    #[serde(default)]
    tags: Vec<String>,
    is_favorited: Option<String>,
    is_in_shopping_cart: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

fn truthy(flag: Option<&str>) -> bool {
    matches!(flag, Some("1" | "true" | "True"))
}

impl RecipeQuery {
    fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }

    /// Membership filters only apply to a known viewer; anonymous callers
    /// get the unfiltered listing.
    fn filter(&self, viewer: Option<i64>) -> RecipeFilter {
        RecipeFilter {
            author_user_id: self.author,
            tag_slugs: self.tags.clone(),
            favorited_by: viewer.filter(|_| truthy(self.is_favorited.as_deref())),
            in_shopping_cart_of: viewer.filter(|_| truthy(self.is_in_shopping_cart.as_deref())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IngredientAmount {
    id: i64,
    amount: f64,
}

/// Request body for both create and partial update. `ingredients` and
/// `tags` are always required; the rest only on create.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RecipeBody {
    ingredients: Option<Vec<IngredientAmount>>,
    tags: Option<Vec<i64>>,
    image: Option<String>,
    name: Option<String>,
    text: Option<String>,
    cooking_time: Option<i32>,
}

/// A body that passed validation, with tag ids deduplicated.
#[derive(Debug, Clone, PartialEq)]
struct CheckedBody {
    ingredients: Vec<NewRecipeIngredient>,
    tag_ids: Vec<i64>,
    image: Option<String>,
    name: Option<String>,
    text: Option<String>,
    cooking_time: Option<i32>,
}

impl RecipeBody {
    fn ingredient_ids(&self) -> Vec<i64> {
        self.ingredients
            .iter()
            .flatten()
            .map(|ingredient| ingredient.id)
            .collect()
    }

    fn tag_ids(&self) -> Vec<i64> {
        self.tags.clone().unwrap_or_default()
    }

    /// `known_ingredients` and `known_tags` are the ids from this body that
    /// exist in the catalog.
    fn check(
        self,
        partial: bool,
        known_ingredients: &HashSet<i64>,
        known_tags: &HashSet<i64>,
    ) -> Result<CheckedBody, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        match &self.ingredients {
            Some(ingredients) => {
                let pairs: Vec<(i64, f64)> = ingredients.iter().map(|i| (i.id, i.amount)).collect();
                errors.check(
                    "ingredients",
                    validation::validate_recipe_ingredients(&pairs, known_ingredients),
                );
            }
            None => errors.add("ingredients", &FieldError::Required),
        }

        match &self.tags {
            Some(tags) => errors.check("tags", validation::validate_recipe_tags(tags, known_tags)),
            None => errors.add("tags", &FieldError::Required),
        }

        match (&self.image, partial) {
            (Some(image), _) => errors.check("image", validation::validate_image(image)),
            (None, false) => errors.add("image", &FieldError::Required),
            (None, true) => {}
        }

        match (&self.name, partial) {
            (Some(name), _) => errors.check(
                "name",
                validation::validate_text(name, validation::CATALOG_NAME_MAX),
            ),
            (None, false) => errors.add("name", &FieldError::Required),
            (None, true) => {}
        }

        match (&self.text, partial) {
            (Some(text), _) => errors.check("text", validation::validate_text(text, usize::MAX)),
            (None, false) => errors.add("text", &FieldError::Required),
            (None, true) => {}
        }

        match (self.cooking_time, partial) {
            (Some(minutes), _) => {
                errors.check("cooking_time", validation::validate_cooking_time(minutes));
            }
            (None, false) => errors.add("cooking_time", &FieldError::Required),
            (None, true) => {}
        }

        errors.into_result()?;

        let mut tag_ids = Vec::new();
        for tag_id in self.tags.unwrap_or_default() {
            if !tag_ids.contains(&tag_id) {
                tag_ids.push(tag_id);
            }
        }

        Ok(CheckedBody {
            ingredients: self
                .ingredients
                .unwrap_or_default()
                .into_iter()
                .map(|i| NewRecipeIngredient {
                    ingredient_id: i.id,
                    amount: i.amount,
                })
                .collect(),
            tag_ids,
            image: self.image,
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
        })
    }

    async fn check_against_catalog(self, pool: &PgPool, partial: bool) -> ResponseResult<CheckedBody> {
        let known_ingredients: HashSet<i64> = Ingredient::existing_ids(pool, &self.ingredient_ids())
            .await?
            .into_iter()
            .collect();
        let known_tags: HashSet<i64> = Tag::existing_ids(pool, &self.tag_ids())
            .await?
            .into_iter()
            .collect();

        Ok(self.check(partial, &known_ingredients, &known_tags)?)
    }
}

impl CheckedBody {
    fn into_fields(self) -> ResponseResult<RecipeFields> {
        let missing = || eyre!("validated recipe body is missing a required field");

        Ok(RecipeFields {
            name: self.name.ok_or_else(missing)?,
            image: self.image.ok_or_else(missing)?,
            text: self.text.ok_or_else(missing)?,
            cooking_time: self.cooking_time.ok_or_else(missing)?,
            ingredients: self.ingredients,
            tag_ids: self.tag_ids,
        })
    }

    fn into_changes(self) -> RecipeChanges {
        RecipeChanges {
            name: self.name,
            image: self.image,
            text: self.text,
            cooking_time: self.cooking_time,
            ingredients: self.ingredients,
            tag_ids: self.tag_ids,
        }
    }
}

async fn authored_recipe(pool: &PgPool, recipe_id: i64, current: &CurrentUser) -> ResponseResult<Recipe> {
    let recipe = Recipe::get_by_id(pool, recipe_id).await?.or_not_found()?;

    if recipe.author_user_id != current.user.user_id {
        return Err(ServerError(eyre!(NOT_AUTHOR), StatusCode::FORBIDDEN));
    }

    Ok(recipe)
}

#[tracing::instrument(skip_all)]
pub(crate) async fn list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(query): Query<RecipeQuery>,
    uri: Uri,
) -> ResponseResult<Json<Page<RecipeView>>> {
    let params = query.page_params();
    let filter = query.filter(viewer.user_id());

    let recipes = Recipe::list(&state.db, &filter, params.limit(), params.offset()).await?;
    let count = Recipe::count(&state.db, &filter).await?;

    let views = recipe_views(&state.db, viewer.user_id(), recipes).await?;

    Ok(Json(Page::new(
        views,
        count,
        params,
        &state.app.base_url,
        &uri,
    )))
}

#[tracing::instrument(skip(state, viewer))]
pub(crate) async fn get(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(recipe_id): Path<i64>,
) -> ResponseResult<Json<RecipeView>> {
    let recipe = Recipe::get_by_id(&state.db, recipe_id).await?.or_not_found()?;

    Ok(Json(recipe_view(&state.db, viewer.user_id(), recipe).await?))
}

#[tracing::instrument(skip_all, fields(user_id = current.user.user_id))]
pub(crate) async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<RecipeBody>,
) -> ResponseResult<impl IntoResponse> {
    let fields = body
        .check_against_catalog(&state.db, false)
        .await?
        .into_fields()?;

    let recipe = Recipe::create(&state.db, current.user.user_id, fields).await?;
    tracing::info!(recipe_id = recipe.recipe_id, "Created recipe");

    let view = recipe_view(&state.db, Some(current.user.user_id), recipe).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

#[tracing::instrument(skip(state, current, body), fields(user_id = current.user.user_id))]
pub(crate) async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(recipe_id): Path<i64>,
    Json(body): Json<RecipeBody>,
) -> ResponseResult<Json<RecipeView>> {
    let recipe = authored_recipe(&state.db, recipe_id, &current).await?;

    let changes = body
        .check_against_catalog(&state.db, true)
        .await?
        .into_changes();

    let recipe = recipe.update(&state.db, changes).await?;

    Ok(Json(
        recipe_view(&state.db, Some(current.user.user_id), recipe).await?,
    ))
}

#[tracing::instrument(skip(state, current), fields(user_id = current.user.user_id))]
pub(crate) async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(recipe_id): Path<i64>,
) -> ResponseResult<StatusCode> {
    let recipe = authored_recipe(&state.db, recipe_id, &current).await?;

    recipe.delete(&state.db).await?;
    tracing::info!(recipe_id, "Deleted recipe");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod test {
    use axum::extract::FromRequestParts as _;

    use super::*;

    fn known(ids: &[i64]) -> HashSet<i64> {
        ids.iter().copied().collect()
    }

    fn full_body() -> RecipeBody {
        RecipeBody {
            ingredients: Some(vec![
                IngredientAmount { id: 1, amount: 200.0 },
                IngredientAmount { id: 2, amount: 1.0 },
            ]),
            tags: Some(vec![5, 5, 6]),
            image: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
            name: Some("Pancakes".to_string()),
            text: Some("Whisk, fry, flip.".to_string()),
            cooking_time: Some(20),
        }
    }

    #[test]
    fn full_body_passes_and_collapses_tags() {
        let checked = full_body().check(false, &known(&[1, 2]), &known(&[5, 6])).unwrap();

        assert_eq!(checked.tag_ids, vec![5, 6]);
        assert_eq!(
            checked.ingredients,
            vec![
                NewRecipeIngredient {
                    ingredient_id: 1,
                    amount: 200.0
                },
                NewRecipeIngredient {
                    ingredient_id: 2,
                    amount: 1.0
                },
            ]
        );

        let fields = checked.into_fields().unwrap();
        assert_eq!(fields.name, "Pancakes");
        assert_eq!(fields.cooking_time, 20);
    }

    #[test]
    fn create_requires_every_field() {
        let errors = RecipeBody::default()
            .check(false, &known(&[]), &known(&[]))
            .unwrap_err();

        assert_eq!(
            errors.fields(),
            vec!["cooking_time", "image", "ingredients", "name", "tags", "text"]
        );
    }

    #[test]
    fn partial_update_only_requires_collections() {
        let body = RecipeBody {
            ingredients: Some(vec![IngredientAmount { id: 1, amount: 3.0 }]),
            tags: Some(vec![5]),
            ..Default::default()
        };

        let changes = body
            .check(true, &known(&[1]), &known(&[5]))
            .unwrap()
            .into_changes();

        assert_eq!(changes.name, None);
        assert_eq!(changes.tag_ids, vec![5]);

        let errors = RecipeBody::default()
            .check(true, &known(&[]), &known(&[]))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["ingredients", "tags"]);
    }

    #[test]
    fn bad_components_are_reported_per_field() {
        let body = RecipeBody {
            ingredients: Some(vec![IngredientAmount { id: 1, amount: 0.0 }]),
            tags: Some(vec![99]),
            cooking_time: Some(0),
            ..full_body()
        };

        let errors = body.check(false, &known(&[1]), &known(&[5])).unwrap_err();

        assert_eq!(errors.fields(), vec!["cooking_time", "ingredients", "tags"]);
    }

    #[test]
    fn membership_filters_need_a_viewer() {
        let query = RecipeQuery {
            author: Some(3),
            tags: vec!["lunch".to_string(), "dinner".to_string()],
            is_favorited: Some("1".to_string()),
            is_in_shopping_cart: Some("0".to_string()),
            ..Default::default()
        };

        let anonymous = query.filter(None);
        assert_eq!(anonymous.favorited_by, None);
        assert_eq!(anonymous.author_user_id, Some(3));
        assert_eq!(anonymous.tag_slugs, vec!["lunch", "dinner"]);

        let signed_in = query.filter(Some(8));
        assert_eq!(signed_in.favorited_by, Some(8));
        assert_eq!(signed_in.in_shopping_cart_of, None);
    }

    #[tokio::test]
    async fn repeated_tags_parse_from_the_query_string() {
        let (mut parts, ()) = axum::http::Request::builder()
            .uri("/api/recipes/?tags=lunch&tags=dinner&is_favorited=1")
            .body(())
            .unwrap()
            .into_parts();

        let Query(query) = Query::<RecipeQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert_eq!(query.tags, vec!["lunch", "dinner"]);
        assert!(truthy(query.is_favorited.as_deref()));
    }
}
