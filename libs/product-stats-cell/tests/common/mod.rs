#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use product_stats_cell::{CatalogSource, RefreshCoordinator, StatsError};
use shared_config::{AppConfig, StalePolicy};
use shared_database::{KeyDetails, KeyValueBackend};
use shared_models::Product;

/// In-memory catalog that counts fetches and can be switched into failure.
pub struct FakeCatalog {
    products: Mutex<Vec<Product>>,
    failing: AtomicBool,
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeCatalog {
    pub fn new(products: Vec<Product>) -> Arc<Self> {
        Self::with_delay(products, Duration::ZERO)
    }

    pub fn with_delay(products: Vec<Product>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            products: Mutex::new(products),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_products(&self, products: Vec<Product>) {
        *self.products.lock().unwrap() = products;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_products(&self) -> Result<Vec<Product>, StatsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(StatsError::Catalog("catalog offline".to_string()));
        }

        Ok(self.products.lock().unwrap().clone())
    }
}

/// Key-value backend that remembers what was published.
#[derive(Default)]
pub struct RecordingBackend {
    pub published: Mutex<Vec<(String, u64)>>,
    pub failing: AtomicBool,
}

#[async_trait]
impl KeyValueBackend for RecordingBackend {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn publish_snapshot(&self, payload: &str, ttl_seconds: u64) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        self.published
            .lock()
            .unwrap()
            .push((payload.to_string(), ttl_seconds));
        Ok(())
    }

    async fn describe_keys(&self) -> anyhow::Result<Vec<KeyDetails>> {
        Ok(Vec::new())
    }
}

pub fn test_config(policy: StalePolicy) -> AppConfig {
    AppConfig {
        stats_cache_ttl_seconds: 60,
        stats_refresh_ahead_seconds: 30,
        stats_refresh_retry_seconds: 10,
        stats_stale_policy: policy,
        stats_background_refresh: false,
        ..AppConfig::default()
    }
}

pub fn sample_products() -> Vec<Product> {
    vec![
        Product::new(10.0, "A").with_categories(["Dairy"]),
        Product::new(60.0, "A").with_categories(["Dairy", "Cheese"]),
        Product::new(150.0, "B").with_categories(["Meat"]),
        Product {
            brand: None,
            ..Product::new(600.0, "")
        },
    ]
}

pub fn coordinator(catalog: Arc<FakeCatalog>, policy: StalePolicy) -> Arc<RefreshCoordinator> {
    Arc::new(RefreshCoordinator::new(&test_config(policy), catalog))
}

/// Polls until the catalog has been hit `expected` times.
pub async fn wait_for_calls(catalog: &FakeCatalog, expected: usize) {
    for _ in 0..1000 {
        if catalog.calls() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("catalog was called {} times, expected {}", catalog.calls(), expected);
}
