// =====================================================================================
// HEALTH MONITORING SERVICE
// =====================================================================================

use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::error::MonitoringError;
use crate::models::{BackendStatus, HealthState, KeyInfo, RedisDebugResponse};
use shared_config::AppConfig;
use shared_database::KeyValueBackend;

const DEBUG_TIMEOUT: Duration = Duration::from_secs(2);

pub struct HealthMonitorService {
    backend: Arc<dyn KeyValueBackend>,
    probe_timeout: Duration,
    last_probe: RwLock<Option<HealthState>>,
}

impl HealthMonitorService {
    pub fn new(config: &AppConfig, backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            backend,
            probe_timeout: config.health_probe_timeout(),
            last_probe: RwLock::new(None),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Pings the backend within the probe budget. Never fails: errors and
    /// timeouts both read as `disconnected`.
    #[instrument(skip(self))]
    pub async fn probe(&self) -> HealthState {
        let backend = match tokio::time::timeout(self.probe_timeout, self.backend.ping()).await {
            Ok(Ok(())) => BackendStatus::Connected,
            Ok(Err(e)) => {
                warn!("Redis health probe failed: {}", e);
                BackendStatus::Disconnected
            }
            Err(_) => {
                warn!(
                    "Redis health probe timed out after {}ms",
                    self.probe_timeout.as_millis()
                );
                BackendStatus::Disconnected
            }
        };

        let state = HealthState::from_backend(backend, Utc::now());
        *self.last_probe.write().await = Some(state.clone());
        debug!("Health probe result: {:?}", state.status);

        state
    }

    pub async fn last_probe(&self) -> Option<HealthState> {
        self.last_probe.read().await.clone()
    }

    #[instrument(skip(self))]
    pub async fn describe_backend(&self) -> Result<RedisDebugResponse, MonitoringError> {
        bounded(self.backend.ping()).await?;
        let keys = bounded(self.backend.describe_keys()).await?;

        let key_details = keys
            .into_iter()
            .map(|details| {
                (
                    details.key,
                    KeyInfo {
                        ttl: details.ttl,
                        kind: details.kind,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();

        Ok(RedisDebugResponse {
            redis_connected: true,
            cached_keys: key_details.len(),
            key_details,
            timestamp: Utc::now(),
        })
    }
}

async fn bounded<T, E, F>(operation: F) -> Result<T, MonitoringError>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(DEBUG_TIMEOUT, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(MonitoringError::BackendUnavailable(e.to_string())),
        Err(_) => Err(MonitoringError::Timeout(DEBUG_TIMEOUT.as_millis() as u64)),
    }
}
