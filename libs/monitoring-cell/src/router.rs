// =====================================================================================
// MONITORING CELL ROUTER
// =====================================================================================

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::{get_health_status, get_redis_debug, MonitoringHandlers};
use crate::services::HealthMonitorService;

pub fn create_monitoring_router(health_service: Arc<HealthMonitorService>) -> Router {
    let handlers = Arc::new(MonitoringHandlers::new(health_service));

    Router::new()
        .route("/health", get(get_health_status))
        .route("/debug/redis", get(get_redis_debug))
        .with_state(handlers)
}
