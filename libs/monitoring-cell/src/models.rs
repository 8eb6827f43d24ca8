// =====================================================================================
// MONITORING CELL MODELS
// =====================================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    Connected,
    Disconnected,
}

/// Result of the most recent probe. Replaced wholesale on every probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthState {
    pub status: HealthStatus,
    pub backend: BackendStatus,
    pub checked_at: DateTime<Utc>,
}

impl HealthState {
    /// There is no degraded state: healthy exactly when the backend answered.
    pub fn from_backend(backend: BackendStatus, checked_at: DateTime<Utc>) -> Self {
        let status = match backend {
            BackendStatus::Connected => HealthStatus::Healthy,
            BackendStatus::Disconnected => HealthStatus::Unhealthy,
        };

        Self {
            status,
            backend,
            checked_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub redis: BackendStatus,
    pub timestamp: DateTime<Utc>,
}

impl From<HealthState> for HealthResponse {
    fn from(state: HealthState) -> Self {
        Self {
            status: state.status,
            redis: state.backend,
            timestamp: state.checked_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    pub ttl: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisDebugResponse {
    pub redis_connected: bool,
    pub cached_keys: usize,
    pub key_details: BTreeMap<String, KeyInfo>,
    pub timestamp: DateTime<Utc>,
}
