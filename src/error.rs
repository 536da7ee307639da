use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error type for everything the request path can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    /// The request body was well-formed JSON but semantically invalid.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The translation service misbehaved (bad payload, failed stream).
    #[error("Translator error: {0}")]
    Translator(String),

    /// The HTTP call to the translation service failed.
    #[error("Translator service unreachable: {0}")]
    Upstream(#[from] reqwest::Error),

    /// A message was addressed to a session that is no longer open.
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Translator(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::ConnectionClosed(_) => StatusCode::GONE,
            AppError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
