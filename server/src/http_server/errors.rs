use std::fmt::{Debug, Display};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use color_eyre::Report;
use serde_json::json;

use super::validation::ValidationErrors;

pub(crate) const NOT_FOUND: &str = "Страница не найдена.";
const INTERNAL_ERROR: &str = "Внутренняя ошибка сервера.";

pub(crate) struct ServerError(pub(crate) Report, pub(crate) StatusCode);

impl Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.1, self.0)
    }
}

impl Debug for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Status Code: {}\nServerError: {:?}", self.1, self.0)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let Some(errors) = self.0.downcast_ref::<ValidationErrors>() {
            return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
        }

        if self.1.is_server_error() {
            tracing::error!(error = ?self, "ServerError");

            return (self.1, Json(json!({ "detail": INTERNAL_ERROR }))).into_response();
        }

        tracing::debug!(status = %self.1, error = %self.0, "Request rejected");

        (self.1, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

impl<E> From<E> for ServerError
where
    E: Into<Report>,
{
    fn from(err: E) -> Self {
        ServerError(err.into(), StatusCode::INTERNAL_SERVER_ERROR)
    }
}

pub(crate) trait WithStatus<T> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError>;
}

impl<T, E> WithStatus<T> for Result<T, E>
where
    E: Into<Report>,
{
    fn with_status(self, status: StatusCode) -> Result<T, ServerError> {
        self.map_err(|e| ServerError(e.into(), status))
    }
}

/// `None` becomes a 404 with the stock message.
pub(crate) trait OrNotFound<T> {
    fn or_not_found(self) -> Result<T, ServerError>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_not_found(self) -> Result<T, ServerError> {
        self.ok_or_else(|| ServerError(Report::msg(NOT_FOUND), StatusCode::NOT_FOUND))
    }
}
