// =====================================================================================
// SINGLE-FLIGHT REFRESH COORDINATION
// =====================================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::error::StatsError;
use crate::models::CacheInfo;
use crate::services::aggregator;
use crate::services::cache::{CacheEntry, CacheStore};
use crate::services::catalog::CatalogSource;
use shared_config::{AppConfig, StalePolicy};
use shared_database::KeyValueBackend;

const MIRROR_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
struct RefreshState {
    last_error: Option<String>,
}

/// Keeps the cache store populated. At most one recomputation runs at a time;
/// the mutex guarding [`RefreshState`] is the refresh slot.
pub struct RefreshCoordinator {
    store: CacheStore,
    catalog: Arc<dyn CatalogSource>,
    mirror: Option<Arc<dyn KeyValueBackend>>,
    policy: StalePolicy,
    retry_after_failure: Duration,
    refresh_slot: Mutex<RefreshState>,
    // Set after a failed refresh, cleared by the next successful one.
    retry_at: RwLock<Option<Instant>>,
    completed_attempts: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(config: &AppConfig, catalog: Arc<dyn CatalogSource>) -> Self {
        Self {
            store: CacheStore::new(config.cache_ttl(), config.refresh_ahead()),
            catalog,
            mirror: None,
            policy: config.stats_stale_policy,
            retry_after_failure: config.refresh_retry(),
            refresh_slot: Mutex::new(RefreshState::default()),
            retry_at: RwLock::new(None),
            completed_attempts: AtomicU64::new(0),
        }
    }

    /// Also publish every new snapshot to the backing key-value cache.
    pub fn with_mirror(mut self, backend: Arc<dyn KeyValueBackend>) -> Self {
        self.mirror = Some(backend);
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn retry_after_failure(&self) -> Duration {
        self.retry_after_failure
    }

    /// When the next refresh attempt after a failure is due, if one failed.
    pub async fn retry_at(&self) -> Option<Instant> {
        *self.retry_at.read().await
    }

    /// Countdown for `entry` as served at `now`. An expired entry kept in
    /// service after a failed refresh counts down to the retry instead.
    pub async fn cache_info(&self, entry: &CacheEntry, now: Instant) -> CacheInfo {
        if entry.is_stale(now) {
            if let Some(retry_at) = self.retry_at().await {
                return entry.cache_info_until(now, retry_at);
            }
        }

        entry.cache_info(now)
    }

    /// Number of finished recomputations, successful or not.
    pub fn completed_attempts(&self) -> u64 {
        self.completed_attempts.load(Ordering::Acquire)
    }

    /// Returns a servable entry, recomputing it first if it is missing or
    /// stale. Only fails when no snapshot has ever been produced.
    #[instrument(skip(self))]
    pub async fn ensure_fresh(&self) -> Result<Arc<CacheEntry>, StatsError> {
        let attempts_seen = self.completed_attempts();
        let current = self.store.read().await;

        if let Some(entry) = &current {
            if !entry.is_stale(Instant::now()) {
                return Ok(entry.clone());
            }
        }

        match current {
            Some(stale) if self.policy == StalePolicy::ServeStale => self.revalidate(stale).await,
            current => self.refresh_or_wait(current, attempts_seen).await,
        }
    }

    /// Refreshes if the current entry has reached its scheduled update time
    /// (or does not exist). Used by the background refresher; ignores the
    /// failure cool-down because it is the retry cadence.
    #[instrument(skip(self))]
    pub async fn refresh_if_due(&self) -> Result<Arc<CacheEntry>, StatsError> {
        let mut state = self.refresh_slot.lock().await;

        if let Some(entry) = self.store.read().await {
            if !entry.is_due(Instant::now()) {
                debug!("Stats snapshot not due yet, skipping refresh");
                return Ok(entry);
            }
        }

        self.refresh_locked(&mut state).await
    }

    /// Recomputes unconditionally, still one at a time.
    #[instrument(skip(self))]
    pub async fn refresh_now(&self) -> Result<Arc<CacheEntry>, StatsError> {
        let mut state = self.refresh_slot.lock().await;
        self.refresh_locked(&mut state).await
    }

    async fn revalidate(&self, stale: Arc<CacheEntry>) -> Result<Arc<CacheEntry>, StatsError> {
        let Ok(mut state) = self.refresh_slot.try_lock() else {
            debug!("Stats refresh in flight, serving previous snapshot");
            return Ok(stale);
        };

        if let Some(entry) = self.fresh_entry().await {
            return Ok(entry);
        }

        if self.cooling_down(Instant::now()).await {
            return Ok(self.serve_stale(stale));
        }

        match self.refresh_locked(&mut state).await {
            Ok(entry) => Ok(entry),
            Err(_) => Ok(self.serve_stale(stale)),
        }
    }

    async fn refresh_or_wait(
        &self,
        current: Option<Arc<CacheEntry>>,
        attempts_seen: u64,
    ) -> Result<Arc<CacheEntry>, StatsError> {
        let mut state = self.refresh_slot.lock().await;

        if let Some(entry) = self.fresh_entry().await {
            return Ok(entry);
        }

        let latest = self.store.read().await.or(current);

        // A refresh finished while this caller waited for the slot; share its
        // outcome instead of running another one.
        if self.completed_attempts() != attempts_seen {
            return match latest {
                Some(stale) => Ok(self.serve_stale(stale)),
                None => Err(StatsError::Upstream(
                    state
                        .last_error
                        .clone()
                        .unwrap_or_else(|| "statistics have not been computed yet".to_string()),
                )),
            };
        }

        if let Some(stale) = &latest {
            if self.cooling_down(Instant::now()).await {
                return Ok(self.serve_stale(stale.clone()));
            }
        }

        match self.refresh_locked(&mut state).await {
            Ok(entry) => Ok(entry),
            Err(e) => match latest {
                Some(stale) => Ok(self.serve_stale(stale)),
                None => Err(StatsError::Upstream(e.to_string())),
            },
        }
    }

    // Caller holds the refresh slot.
    async fn refresh_locked(
        &self,
        state: &mut RefreshState,
    ) -> Result<Arc<CacheEntry>, StatsError> {
        let started = Instant::now();
        info!("Refreshing product statistics");

        let outcome = match self.catalog.fetch_products().await {
            Ok(products) => {
                let entry = self.store.write(aggregator::compute(&products)).await;
                *self.retry_at.write().await = None;
                state.last_error = None;

                info!(
                    "Product statistics refreshed in {}ms ({} products)",
                    started.elapsed().as_millis(),
                    entry.snapshot().total_products
                );

                self.mirror(&entry).await;
                Ok(entry)
            }
            Err(e) => {
                error!("Product statistics refresh failed: {}", e);
                *self.retry_at.write().await = Some(Instant::now() + self.retry_after_failure);
                state.last_error = Some(e.to_string());
                Err(e)
            }
        };

        self.completed_attempts.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    async fn cooling_down(&self, now: Instant) -> bool {
        self.retry_at().await.is_some_and(|retry_at| now < retry_at)
    }

    async fn fresh_entry(&self) -> Option<Arc<CacheEntry>> {
        self.store
            .read()
            .await
            .filter(|entry| !entry.is_stale(Instant::now()))
    }

    fn serve_stale(&self, entry: Arc<CacheEntry>) -> Arc<CacheEntry> {
        warn!(
            "Serving expired stats snapshot (age {}s)",
            entry.age(Instant::now()).as_secs()
        );
        entry
    }

    async fn mirror(&self, entry: &CacheEntry) {
        let Some(backend) = &self.mirror else {
            return;
        };

        let payload = match serde_json::to_string(entry.snapshot().as_ref()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize stats snapshot for mirroring: {}", e);
                return;
            }
        };

        let publish = backend.publish_snapshot(&payload, entry.ttl().as_secs());
        match tokio::time::timeout(MIRROR_TIMEOUT, publish).await {
            Ok(Ok(())) => debug!("Stats snapshot mirrored to key-value cache"),
            Ok(Err(e)) => warn!("Failed to mirror stats snapshot: {}", e),
            Err(_) => warn!("Mirroring stats snapshot timed out after {:?}", MIRROR_TIMEOUT),
        }
    }
}
