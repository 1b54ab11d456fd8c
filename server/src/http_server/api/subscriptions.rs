use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use color_eyre::eyre::eyre;
use db::{subscriptions::Subscription, users::User};
use serde::Deserialize;

use super::representations::{subscription_views, SubscribeView, SubscriptionView};
use crate::{
    http_server::{
        auth::CurrentUser,
        errors::{OrNotFound as _, ServerError, WithStatus as _},
        pagination::{Page, PageParams},
        ResponseResult,
    },
    AppState,
};

const SELF_SUBSCRIPTION: &str = "Нельзя подписаться на самого себя.";
const ALREADY_SUBSCRIBED: &str = "Вы уже подписаны на этого автора.";
const NOT_SUBSCRIBED: &str = "Вы не подписаны на этого автора.";

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct SubscriptionsQuery {
    page: Option<i64>,
    limit: Option<i64>,
    recipes_limit: Option<i64>,
}

impl SubscriptionsQuery {
    fn page_params(self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }

    /// Negative limits mean "show none" rather than an error.
    fn recipes_limit(self) -> Option<i64> {
        self.recipes_limit.map(|limit| limit.max(0))
    }
}

#[tracing::instrument(skip_all, fields(user_id = current.user.user_id))]
pub(crate) async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<SubscriptionsQuery>,
    uri: Uri,
) -> ResponseResult<Json<Page<SubscriptionView>>> {
    let user_id = current.user.user_id;
    let params = query.page_params();

    let authors =
        Subscription::authors(&state.db, user_id, params.limit(), params.offset()).await?;
    let count = Subscription::count_authors(&state.db, user_id).await?;

    let views = subscription_views(&state.db, authors, query.recipes_limit()).await?;

    Ok(Json(Page::new(
        views,
        count,
        params,
        &state.app.base_url,
        &uri,
    )))
}

#[tracing::instrument(skip(state, current), fields(user_id = current.user.user_id))]
pub(crate) async fn subscribe(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(author_id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let author = User::get_by_id(&state.db, author_id).await?.or_not_found()?;

    if author.user_id == current.user.user_id {
        return Err(ServerError(eyre!(SELF_SUBSCRIPTION), StatusCode::BAD_REQUEST));
    }

    let subscription = Subscription::create(&state.db, current.user.user_id, author.user_id)
        .await?
        .ok_or_else(|| eyre!(ALREADY_SUBSCRIBED))
        .with_status(StatusCode::BAD_REQUEST)?;

    Ok((StatusCode::CREATED, Json(SubscribeView::from(subscription))))
}

#[tracing::instrument(skip(state, current), fields(user_id = current.user.user_id))]
pub(crate) async fn unsubscribe(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(author_id): Path<i64>,
) -> ResponseResult<StatusCode> {
    let author = User::get_by_id(&state.db, author_id).await?.or_not_found()?;

    let removed = Subscription::delete(&state.db, current.user.user_id, author.user_id).await?;
    if !removed {
        return Err(eyre!(NOT_SUBSCRIBED)).with_status(StatusCode::NOT_FOUND);
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn recipes_limit_is_clamped_at_zero() {
        let query = SubscriptionsQuery {
            recipes_limit: Some(-3),
            ..Default::default()
        };
        assert_eq!(query.recipes_limit(), Some(0));

        assert_eq!(SubscriptionsQuery::default().recipes_limit(), None);
    }
}
