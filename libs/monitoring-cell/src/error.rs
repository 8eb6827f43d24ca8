use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use shared_models::error_response;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitoringError {
    #[error("Redis unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Redis did not answer within {0}ms")]
    Timeout(u64),
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
    }
}
