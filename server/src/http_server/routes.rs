use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::{api, errors::NOT_FOUND};
use crate::AppState;

pub(crate) fn make_router() -> Router<AppState> {
    Router::new()
        .nest("/api", api_routes())
        .fallback(fallback)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", get(api::users::list).post(api::users::register))
        .route("/users/me/", get(api::users::me))
        .route("/users/set_password/", post(api::users::set_password))
        .route("/users/subscriptions/", get(api::subscriptions::list))
        .route("/users/{id}/", get(api::users::get))
        .route(
            "/users/{id}/subscribe/",
            post(api::subscriptions::subscribe).delete(api::subscriptions::unsubscribe),
        )
        .route("/auth/token/login/", post(api::tokens::login))
        .route("/auth/token/logout/", post(api::tokens::logout))
        .route("/tags/", get(api::catalog::list_tags))
        .route("/tags/{id}/", get(api::catalog::get_tag))
        .route("/ingredients/", get(api::catalog::list_ingredients))
        .route("/ingredients/{id}/", get(api::catalog::get_ingredient))
        .route(
            "/recipes/",
            get(api::recipes::list).post(api::recipes::create),
        )
        .route(
            "/recipes/download_shopping_cart/",
            get(api::membership::download_shopping_cart),
        )
        .route(
            "/recipes/{id}/",
            get(api::recipes::get)
                .patch(api::recipes::update)
                .delete(api::recipes::delete),
        )
        .route(
            "/recipes/{id}/favorite/",
            post(api::membership::add_favorite).delete(api::membership::remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(api::membership::add_to_cart).delete(api::membership::remove_from_cart),
        )
}

async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": NOT_FOUND })))
}
