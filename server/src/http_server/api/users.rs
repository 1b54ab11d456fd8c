use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use db::users::{NewUser, User};
use serde::Deserialize;

use super::representations::{user_view, user_views, NewUserView, UserView};
use crate::{
    http_server::{
        auth::{CurrentUser, MaybeUser},
        errors::OrNotFound as _,
        pagination::{Page, PageParams},
        validation::{self, FieldError, ValidationErrors},
        ResponseResult,
    },
    passwords, AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterBody {
    email: Option<String>,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
}

impl RegisterBody {
    /// Every field is required; all problems are reported at once.
    fn validate(self) -> Result<(NewUser, String), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let mut required = |field: &'static str, value: Option<String>| match value {
            Some(value) => value,
            None => {
                errors.add(field, &FieldError::Required);
                String::new()
            }
        };

        let email = required("email", self.email);
        let username = required("username", self.username);
        let first_name = required("first_name", self.first_name);
        let last_name = required("last_name", self.last_name);
        let password = required("password", self.password);

        if !errors.fields().contains(&"email") {
            errors.check("email", validation::validate_email(&email));
        }
        if !errors.fields().contains(&"username") {
            errors.check("username", validation::validate_username(&username));
        }
        if !errors.fields().contains(&"first_name") {
            errors.check(
                "first_name",
                validation::validate_text(&first_name, validation::PERSON_NAME_MAX),
            );
        }
        if !errors.fields().contains(&"last_name") {
            errors.check(
                "last_name",
                validation::validate_text(&last_name, validation::PERSON_NAME_MAX),
            );
        }
        if !errors.fields().contains(&"password") && password.is_empty() {
            errors.add("password", &FieldError::Blank);
        }

        errors.into_result()?;

        Ok((
            NewUser {
                email,
                username,
                first_name,
                last_name,
                password_hash: String::new(),
            },
            password,
        ))
    }
}

#[tracing::instrument(skip_all)]
pub(crate) async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> ResponseResult<impl IntoResponse> {
    let (mut new_user, password) = body.validate()?;

    let conflicts = User::conflicts(&state.db, &new_user.username, &new_user.email).await?;
    if conflicts.any() {
        let mut errors = ValidationErrors::default();
        if conflicts.username {
            errors.add("username", &FieldError::UsernameTaken);
        }
        if conflicts.email {
            errors.add("email", &FieldError::EmailTaken);
        }
        return Err(errors.into());
    }

    new_user.password_hash = passwords::hash_password_blocking(password).await?;

    let username = new_user.username.clone();
    let email = new_user.email.clone();
    let Some(user) = User::create(&state.db, new_user).await? else {
        // Lost a race with a concurrent registration
        let conflicts = User::conflicts(&state.db, &username, &email).await?;
        let mut errors = ValidationErrors::default();
        if conflicts.username || !conflicts.email {
            errors.add("username", &FieldError::UsernameTaken);
        }
        if conflicts.email {
            errors.add("email", &FieldError::EmailTaken);
        }
        return Err(errors.into());
    };

    tracing::info!(user_id = user.user_id, "Registered user");

    Ok((StatusCode::CREATED, Json(NewUserView::from(user))))
}

#[tracing::instrument(skip_all)]
pub(crate) async fn list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(params): Query<PageParams>,
    uri: Uri,
) -> ResponseResult<Json<Page<UserView>>> {
    let users = User::list(&state.db, params.limit(), params.offset()).await?;
    let count = User::count(&state.db).await?;

    let views = user_views(&state.db, viewer.user_id(), users).await?;

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
    Path(user_id): Path<i64>,
) -> ResponseResult<Json<UserView>> {
    let user = User::get_by_id(&state.db, user_id).await?.or_not_found()?;

    Ok(Json(user_view(&state.db, viewer.user_id(), user).await?))
}

pub(crate) async fn me(current: CurrentUser) -> Json<UserView> {
    // Nobody can follow themselves
    Json(UserView::new(current.user, false))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetPasswordBody {
    new_password: String,
    current_password: String,
}

#[tracing::instrument(skip_all, fields(user_id = current.user.user_id))]
pub(crate) async fn set_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<SetPasswordBody>,
) -> ResponseResult<StatusCode> {
    let verified = passwords::verify_password_blocking(
        body.current_password,
        current.user.password_hash.clone(),
    )
    .await?;

    let mut errors = ValidationErrors::default();
    if !verified {
        errors.add("current_password", &FieldError::WrongPassword);
    }
    if body.new_password.is_empty() {
        errors.add("new_password", &FieldError::Blank);
    }
    errors.into_result()?;

    let password_hash = passwords::hash_password_blocking(body.new_password).await?;
    current
        .user
        .set_password_hash(&state.db, password_hash)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod test {
    use super::*;

    fn body(username: &str) -> RegisterBody {
        RegisterBody {
            email: Some("alice@example.com".to_string()),
            username: Some(username.to_string()),
            first_name: Some("Alice".to_string()),
            last_name: Some("Liddell".to_string()),
            password: Some("pa55word".to_string()),
        }
    }

    #[test]
    fn valid_registration() {
        let (new_user, password) = body("alice").validate().unwrap();

        assert_eq!(new_user.username, "alice");
        assert_eq!(new_user.email, "alice@example.com");
        assert_eq!(password, "pa55word");
    }

    #[test]
    fn reserved_username_is_rejected() {
        let errors = body("Me").validate().unwrap_err();

        assert_eq!(errors.fields(), vec!["username"]);
    }

    #[test]
    fn missing_fields_are_required() {
        let errors = RegisterBody {
            email: None,
            username: Some("alice".to_string()),
            first_name: None,
            last_name: Some("Liddell".to_string()),
            password: Some(String::new()),
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.fields(), vec!["email", "first_name", "password"]);
        assert_eq!(
            serde_json::to_value(&errors).unwrap()["email"][0],
            FieldError::Required.to_string()
        );
    }
}
