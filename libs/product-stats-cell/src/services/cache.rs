// =====================================================================================
// SNAPSHOT CACHE STORE
// =====================================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::models::{CacheInfo, StatsSnapshot};

/// The single live snapshot with the timing needed to count it down.
#[derive(Debug)]
pub struct CacheEntry {
    snapshot: Arc<StatsSnapshot>,
    computed_at: Instant,
    ttl: Duration,
    refresh_ahead: Duration,
}

impl CacheEntry {
    pub fn new(
        snapshot: StatsSnapshot,
        computed_at: Instant,
        ttl: Duration,
        refresh_ahead: Duration,
    ) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            computed_at,
            ttl,
            refresh_ahead: refresh_ahead.min(ttl),
        }
    }

    pub fn snapshot(&self) -> &Arc<StatsSnapshot> {
        &self.snapshot
    }

    pub fn computed_at(&self) -> Instant {
        self.computed_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.computed_at)
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        self.age(now) >= self.ttl
    }

    /// Time left before the entry expires.
    pub fn expires_in(&self, now: Instant) -> Duration {
        self.ttl.saturating_sub(self.age(now))
    }

    /// Time left before the background refresher replaces the entry. Always
    /// shorter than [`expires_in`](Self::expires_in) by `refresh_ahead`.
    pub fn next_update_in(&self, now: Instant) -> Duration {
        (self.ttl - self.refresh_ahead).saturating_sub(self.age(now))
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_update_in(now).is_zero()
    }

    /// Countdown values as whole seconds, measured at `now`.
    pub fn cache_info(&self, now: Instant) -> CacheInfo {
        countdown(self.expires_in(now), self.next_update_in(now))
    }

    /// Countdown for an expired entry that stays in service until the refresh
    /// retry scheduled at `retry_at`.
    pub fn cache_info_until(&self, now: Instant, retry_at: Instant) -> CacheInfo {
        let remaining = retry_at.saturating_duration_since(now);
        countdown(remaining, remaining)
    }
}

// `ttl_seconds` rounds up and never drops below 1; `next_update_in` stays
// strictly below it.
fn countdown(expires_in: Duration, next_update_in: Duration) -> CacheInfo {
    let mut ttl_seconds = expires_in.as_secs();
    if expires_in.subsec_nanos() > 0 {
        ttl_seconds += 1;
    }
    let ttl_seconds = ttl_seconds.max(1);

    CacheInfo {
        ttl_seconds,
        next_update_in: next_update_in.as_secs().min(ttl_seconds - 1),
    }
}

/// Owns the one live [`CacheEntry`]. Entries are swapped whole, so readers see
/// either nothing, the previous entry, or the new one.
pub struct CacheStore {
    entry: RwLock<Option<Arc<CacheEntry>>>,
    ttl: Duration,
    refresh_ahead: Duration,
}

impl CacheStore {
    pub fn new(ttl: Duration, refresh_ahead: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
            refresh_ahead,
        }
    }

    /// `None` until the first successful computation.
    pub async fn read(&self) -> Option<Arc<CacheEntry>> {
        self.entry.read().await.clone()
    }

    pub(crate) async fn write(&self, snapshot: StatsSnapshot) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry::new(
            snapshot,
            Instant::now(),
            self.ttl,
            self.refresh_ahead,
        ));
        *self.entry.write().await = Some(entry.clone());
        entry
    }

    pub fn is_stale(&self, entry: &CacheEntry, now: Instant) -> bool {
        entry.is_stale(now)
    }
}
