use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

/// The `{"error": ...}` envelope every endpoint uses for failures.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();

    if status.is_server_error() {
        tracing::error!("Error: {}: {}", status, message);
    } else {
        tracing::warn!("Error: {}: {}", status, message);
    }

    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiring_failures_are_internal_errors() {
        let response = AppError::Config("ttl".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::Startup("bind".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
