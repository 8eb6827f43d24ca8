use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use shared_models::error_response;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatsError {
    /// No snapshot has ever been computed and the last attempt failed.
    #[error("Statistics unavailable: {0}")]
    Upstream(String),

    /// Raised by catalog sources.
    #[error("Catalog fetch failed: {0}")]
    Catalog(String),
}

// Catalog failures are folded into `Upstream` by the refresh coordinator, so
// every error that reaches a handler means no snapshot can be served.
impl IntoResponse for StatsError {
    fn into_response(self) -> Response {
        error_response(StatusCode::SERVICE_UNAVAILABLE, self.to_string())
    }
}
