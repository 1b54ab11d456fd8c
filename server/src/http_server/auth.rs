use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use color_eyre::Report;
use db::{auth_tokens::AuthToken, users::User};
use serde_json::json;
use uuid::Uuid;

use super::errors::ServerError;
use crate::AppState;

const TOKEN_SCHEME: &str = "Token";

/// The authenticated caller and the token they used.
#[derive(Debug, Clone)]
pub(crate) struct CurrentUser {
    pub user: User,
    pub token: Uuid,
}

/// Like [`CurrentUser`] but anonymous callers are allowed through. A token
/// that is present but wrong is still rejected.
#[derive(Debug, Clone)]
pub(crate) struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub(crate) fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|current| current.user.user_id)
    }
}

#[derive(Debug)]
pub(crate) enum AuthRejection {
    Missing,
    Invalid,
    Lookup(Report),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let detail = match self {
            AuthRejection::Missing => "Учетные данные не были предоставлены.",
            AuthRejection::Invalid => "Недопустимый токен.",
            AuthRejection::Lookup(report) => {
                return ServerError(report, StatusCode::INTERNAL_SERVER_ERROR).into_response()
            }
        };

        (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response()
    }
}

/// `Ok(None)` when no `Authorization` header was sent at all.
pub(crate) fn token_from_headers(headers: &HeaderMap) -> Result<Option<Uuid>, AuthRejection> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthRejection::Invalid)?;
    let (scheme, key) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthRejection::Invalid)?;

    if !scheme.eq_ignore_ascii_case(TOKEN_SCHEME) {
        return Err(AuthRejection::Invalid);
    }

    let token = Uuid::parse_str(key.trim()).map_err(|_| AuthRejection::Invalid)?;

    Ok(Some(token))
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AuthRejection> {
    let Some(token) = token_from_headers(&parts.headers)? else {
        return Ok(None);
    };

    let user = AuthToken::find_user(&state.db, token)
        .await
        .map_err(AuthRejection::Lookup)?
        .ok_or(AuthRejection::Invalid)?;

    tracing::Span::current().record("user_id", user.user_id);

    Ok(Some(CurrentUser { user, token }))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await?.ok_or(AuthRejection::Missing)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(authenticate(parts, state).await?))
    }
}
