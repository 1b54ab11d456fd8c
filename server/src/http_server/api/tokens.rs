use axum::{extract::State, http::StatusCode, Json};
use db::{auth_tokens::AuthToken, users::User};
use serde::{Deserialize, Serialize};

use crate::{
    http_server::{
        auth::CurrentUser,
        validation::{FieldError, ValidationErrors},
        ResponseResult,
    },
    passwords, AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    auth_token: String,
}

fn invalid_credentials() -> ValidationErrors {
    ValidationErrors::single("non_field_errors", &FieldError::InvalidCredentials)
}

#[tracing::instrument(skip_all)]
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ResponseResult<Json<LoginResponse>> {
    let Some(user) = User::get_by_email(&state.db, &body.email).await? else {
        return Err(invalid_credentials().into());
    };

    let verified =
        passwords::verify_password_blocking(body.password, user.password_hash.clone()).await?;
    if !verified {
        tracing::warn!(user_id = user.user_id, "Login with a wrong password");
        return Err(invalid_credentials().into());
    }

    let token = AuthToken::get_or_create(&state.db, user.user_id).await?;

    Ok(Json(LoginResponse {
        auth_token: token.token.to_string(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = current.user.user_id))]
pub(crate) async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ResponseResult<StatusCode> {
    AuthToken::delete(&state.db, current.token).await?;

    Ok(StatusCode::NO_CONTENT)
}
