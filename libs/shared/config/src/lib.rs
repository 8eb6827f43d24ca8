use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const MAX_CACHE_TTL_SECONDS: u64 = 3600;
pub const MAX_HEALTH_PROBE_TIMEOUT_MS: u64 = 500;

/// What readers get while a snapshot is being recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Return the expired snapshot immediately; one caller refreshes.
    ServeStale,
    /// Every reader waits for the in-flight recomputation.
    Block,
}

impl FromStr for StalePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "serve-stale" | "serve_stale" | "stale" => Ok(Self::ServeStale),
            "block" | "blocking" => Ok(Self::Block),
            other => Err(ConfigError::Invalid {
                key: "STATS_STALE_POLICY",
                reason: format!("unknown policy '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_port: u16,
    pub redis_url: String,
    pub oda_api_base_url: String,
    pub cors_allowed_origin: String,
    pub stats_cache_ttl_seconds: u64,
    pub stats_refresh_ahead_seconds: u64,
    pub stats_refresh_retry_seconds: u64,
    pub stats_stale_policy: StalePolicy,
    pub stats_background_refresh: bool,
    pub health_probe_timeout_ms: u64,
    pub catalog_max_retries: u32,
    pub catalog_page_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: 8000,
            redis_url: "redis://redis:6379".to_string(),
            oda_api_base_url: "https://oda.com/api/v1".to_string(),
            cors_allowed_origin: "http://localhost:3000".to_string(),
            stats_cache_ttl_seconds: MAX_CACHE_TTL_SECONDS,
            stats_refresh_ahead_seconds: 1800,
            stats_refresh_retry_seconds: 300,
            stats_stale_policy: StalePolicy::ServeStale,
            stats_background_refresh: true,
            health_probe_timeout_ms: 250,
            catalog_max_retries: 3,
            catalog_page_delay_ms: 200,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Missing or unparseable
    /// values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_port = lookup("API_PORT")
            .or_else(|| lookup("FASTAPI_PORT"))
            .and_then(|raw| parse_or_warn("API_PORT", &raw))
            .unwrap_or_else(|| {
                warn!("API_PORT not set, using default {}", defaults.api_port);
                defaults.api_port
            });

        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| {
            let host = lookup("REDIS_HOST").unwrap_or_else(|| "redis".to_string());
            let port = lookup("REDIS_PORT").unwrap_or_else(|| "6379".to_string());
            warn!("REDIS_URL not set, using redis://{}:{}", host, port);
            format!("redis://{}:{}", host, port)
        });

        let oda_api_base_url = lookup("ODA_API_BASE_URL").unwrap_or_else(|| {
            warn!("ODA_API_BASE_URL not set, using default");
            defaults.oda_api_base_url.clone()
        });

        let stats_stale_policy = match lookup("STATS_STALE_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to serve-stale", e);
                defaults.stats_stale_policy
            }),
            None => defaults.stats_stale_policy,
        };

        Self {
            api_port,
            redis_url,
            oda_api_base_url,
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN")
                .unwrap_or(defaults.cors_allowed_origin),
            stats_cache_ttl_seconds: number(
                &lookup,
                "STATS_CACHE_TTL_SECONDS",
                defaults.stats_cache_ttl_seconds,
            ),
            stats_refresh_ahead_seconds: number(
                &lookup,
                "STATS_REFRESH_AHEAD_SECONDS",
                defaults.stats_refresh_ahead_seconds,
            ),
            stats_refresh_retry_seconds: number(
                &lookup,
                "STATS_REFRESH_RETRY_SECONDS",
                defaults.stats_refresh_retry_seconds,
            ),
            stats_stale_policy,
            stats_background_refresh: number(
                &lookup,
                "STATS_BACKGROUND_REFRESH",
                defaults.stats_background_refresh,
            ),
            health_probe_timeout_ms: number(
                &lookup,
                "HEALTH_PROBE_TIMEOUT_MS",
                defaults.health_probe_timeout_ms,
            ),
            catalog_max_retries: number(
                &lookup,
                "CATALOG_MAX_RETRIES",
                defaults.catalog_max_retries,
            ),
            catalog_page_delay_ms: number(
                &lookup,
                "CATALOG_PAGE_DELAY_MS",
                defaults.catalog_page_delay_ms,
            ),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CACHE_TTL_SECONDS).contains(&self.stats_cache_ttl_seconds) {
            return Err(ConfigError::Invalid {
                key: "STATS_CACHE_TTL_SECONDS",
                reason: format!("must be within 1..={}", MAX_CACHE_TTL_SECONDS),
            });
        }
        if self.stats_refresh_ahead_seconds == 0
            || self.stats_refresh_ahead_seconds >= self.stats_cache_ttl_seconds
        {
            return Err(ConfigError::Invalid {
                key: "STATS_REFRESH_AHEAD_SECONDS",
                reason: format!("must be within 1..{}", self.stats_cache_ttl_seconds),
            });
        }
        if !(1..MAX_HEALTH_PROBE_TIMEOUT_MS).contains(&self.health_probe_timeout_ms) {
            return Err(ConfigError::Invalid {
                key: "HEALTH_PROBE_TIMEOUT_MS",
                reason: format!("must be within 1..{}", MAX_HEALTH_PROBE_TIMEOUT_MS),
            });
        }
        if self.catalog_max_retries == 0 {
            return Err(ConfigError::Invalid {
                key: "CATALOG_MAX_RETRIES",
                reason: "at least one attempt is required".to_string(),
            });
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_cache_ttl_seconds)
    }

    pub fn refresh_ahead(&self) -> Duration {
        Duration::from_secs(self.stats_refresh_ahead_seconds)
    }

    pub fn refresh_retry(&self) -> Duration {
        Duration::from_secs(self.stats_refresh_retry_seconds)
    }

    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.health_probe_timeout_ms)
    }
}

fn number<T, F>(lookup: &F, key: &'static str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|raw| parse_or_warn(key, &raw))
        .unwrap_or(default)
}

fn parse_or_warn<T>(key: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} has invalid value '{}' ({}), using default", key, raw, e);
            None
        }
    }
}
