use axum::{routing::get, Router};
use std::sync::Arc;

use crate::handlers::{get_stats, StatsHandlers};
use crate::services::RefreshCoordinator;

pub fn create_stats_router(coordinator: Arc<RefreshCoordinator>) -> Router {
    let handlers = Arc::new(StatsHandlers::new(coordinator));

    Router::new()
        .route("/stats", get(get_stats))
        .with_state(handlers)
}
