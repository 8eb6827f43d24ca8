// =====================================================================================
// MONITORING CELL - BACKING CACHE HEALTH & DIAGNOSTICS
// =====================================================================================
//
// Probes the key-value cache the service depends on and exposes:
// - /health        connectivity signal used by orchestration and the dashboard
// - /debug/redis   key listing for operators
//
// =====================================================================================

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::MonitoringError;
pub use models::{
    BackendStatus, HealthResponse, HealthState, HealthStatus, KeyInfo, RedisDebugResponse,
};
pub use router::create_monitoring_router;
pub use services::HealthMonitorService;
pub use handlers::MonitoringHandlers;
