use axum::{extract::State, Json};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::instrument;

use crate::error::StatsError;
use crate::models::StatsResponse;
use crate::services::RefreshCoordinator;

pub struct StatsHandlers {
    coordinator: Arc<RefreshCoordinator>,
}

impl StatsHandlers {
    pub fn new(coordinator: Arc<RefreshCoordinator>) -> Self {
        Self { coordinator }
    }
}

/// `cache_info` is measured when the response is built, not when the
/// snapshot was computed.
#[instrument(skip(handlers))]
pub async fn get_stats(
    State(handlers): State<Arc<StatsHandlers>>,
) -> Result<Json<StatsResponse>, StatsError> {
    let entry = handlers.coordinator.ensure_fresh().await?;
    let cache_info = handlers.coordinator.cache_info(&entry, Instant::now()).await;

    Ok(Json(StatsResponse {
        stats: entry.snapshot().as_ref().clone(),
        cache_info,
    }))
}
