use axum::{
    extract::{Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use color_eyre::eyre::eyre;
use db::cooking::{Favorite, Recipe, ShoppingCartEntry};
use shopping_list::Attachment;

use super::representations::MembershipView;
use crate::{
    http_server::{
        auth::CurrentUser,
        errors::{OrNotFound as _, WithStatus as _},
        ResponseResult,
    },
    AppState,
};

const ALREADY_FAVORITED: &str = "Рецепт был добавлен в избранное";
const ALREADY_IN_CART: &str = "Рецепт был добавлен в список покупок";
const NOT_FAVORITED: &str = "Рецепта нет в избранном";
const NOT_IN_CART: &str = "Рецепта нет в списке покупок";

#[tracing::instrument(skip(state, current), fields(user_id = current.user.user_id))]
pub(crate) async fn add_favorite(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(recipe_id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let recipe = Recipe::get_by_id(&state.db, recipe_id).await?.or_not_found()?;

    let favorite = Favorite::add(&state.db, current.user.user_id, recipe.recipe_id)
        .await?
        .ok_or_else(|| eyre!(ALREADY_FAVORITED))
        .with_status(StatusCode::BAD_REQUEST)?;

    Ok((StatusCode::CREATED, Json(MembershipView::from(favorite))))
}

#[tracing::instrument(skip(state, current), fields(user_id = current.user.user_id))]
pub(crate) async fn remove_favorite(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(recipe_id): Path<i64>,
) -> ResponseResult<StatusCode> {
    let recipe = Recipe::get_by_id(&state.db, recipe_id).await?.or_not_found()?;

    if !Favorite::remove(&state.db, current.user.user_id, recipe.recipe_id).await? {
        return Err(eyre!(NOT_FAVORITED)).with_status(StatusCode::NOT_FOUND);
    }

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, current), fields(user_id = current.user.user_id))]
pub(crate) async fn add_to_cart(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(recipe_id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let recipe = Recipe::get_by_id(&state.db, recipe_id).await?.or_not_found()?;

    let entry = ShoppingCartEntry::add(&state.db, current.user.user_id, recipe.recipe_id)
        .await?
        .ok_or_else(|| eyre!(ALREADY_IN_CART))
        .with_status(StatusCode::BAD_REQUEST)?;

    Ok((StatusCode::CREATED, Json(MembershipView::from(entry))))
}

#[tracing::instrument(skip(state, current), fields(user_id = current.user.user_id))]
pub(crate) async fn remove_from_cart(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(recipe_id): Path<i64>,
) -> ResponseResult<StatusCode> {
    let recipe = Recipe::get_by_id(&state.db, recipe_id).await?.or_not_found()?;

    if !ShoppingCartEntry::remove(&state.db, current.user.user_id, recipe.recipe_id).await? {
        return Err(eyre!(NOT_IN_CART)).with_status(StatusCode::NOT_FOUND);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Totals every ingredient across the caller's cart and sends the list as a
/// plain text download.
#[tracing::instrument(skip_all, fields(user_id = current.user.user_id))]
pub(crate) async fn download_shopping_cart(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ResponseResult<Response> {
    let contents = ShoppingCartEntry::contents(&state.db, current.user.user_id).await?;

    let lines = shopping_list::aggregate(contents.usages);
    let attachment = shopping_list::format(&current.user.username, &contents.recipes, &lines);

    tracing::info!(
        recipes = contents.recipes.len(),
        lines = lines.len(),
        file_name = %attachment.file_name,
        "Built shopping list"
    );

    attachment_response(attachment)
}

pub(crate) fn attachment_response(attachment: Attachment) -> ResponseResult<Response> {
    let disposition = format!("attachment; filename={}", attachment.file_name);
    let disposition = HeaderValue::from_bytes(disposition.as_bytes())
        .map_err(|e| eyre!("Attachment file name can't be sent as a header: {e}"))?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("text/plain")),
            (CONTENT_DISPOSITION, disposition),
        ],
        attachment.body,
    )
        .into_response())
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn attachment_headers_and_body() {
        let attachment = Attachment {
            file_name: "alice_ingredients.txt".to_string(),
            body: "Список покупок для приготовления:\nPancakes\nFlour: 250, g".to_string(),
        };

        let response = attachment_response(attachment).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=alice_ingredients.txt"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            "Список покупок для приготовления:\nPancakes\nFlour: 250, g"
        );
    }

    #[test]
    fn non_ascii_usernames_still_make_a_header() {
        let attachment = Attachment {
            file_name: "алиса_ingredients.txt".to_string(),
            body: String::new(),
        };

        let response = attachment_response(attachment).unwrap();

        assert_eq!(
            response.headers()[CONTENT_DISPOSITION].as_bytes(),
            "attachment; filename=алиса_ingredients.txt".as_bytes()
        );
    }

    #[test]
    fn control_characters_are_refused() {
        let attachment = Attachment {
            file_name: "evil\r\nSet-Cookie: x_ingredients.txt".to_string(),
            body: String::new(),
        };

        assert!(attachment_response(attachment).is_err());
    }
}
