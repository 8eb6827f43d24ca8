// =====================================================================================
// MONITORING CELL HANDLERS
// =====================================================================================

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::instrument;

use crate::error::MonitoringError;
use crate::models::{HealthResponse, RedisDebugResponse};
use crate::services::HealthMonitorService;

pub struct MonitoringHandlers {
    health_service: Arc<HealthMonitorService>,
}

impl MonitoringHandlers {
    pub fn new(health_service: Arc<HealthMonitorService>) -> Self {
        Self { health_service }
    }
}

/// Always 200; an unreachable backend is reported in the body.
#[instrument(skip(handlers))]
pub async fn get_health_status(
    State(handlers): State<Arc<MonitoringHandlers>>,
) -> Json<HealthResponse> {
    Json(handlers.health_service.probe().await.into())
}

#[instrument(skip(handlers))]
pub async fn get_redis_debug(
    State(handlers): State<Arc<MonitoringHandlers>>,
) -> Result<Json<RedisDebugResponse>, MonitoringError> {
    let details = handlers.health_service.describe_backend().await?;
    Ok(Json(details))
}
