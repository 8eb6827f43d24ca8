use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TOP_BRANDS_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandInfo {
    pub name: String,
    pub count: u64,
}

/// Item counts per fixed price bucket. Serializes as an object keyed by the
/// bucket labels, in ascending price order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRanges {
    #[serde(rename = "0-50")]
    pub up_to_50: u64,
    #[serde(rename = "51-100")]
    pub up_to_100: u64,
    #[serde(rename = "101-200")]
    pub up_to_200: u64,
    #[serde(rename = "201-500")]
    pub up_to_500: u64,
    #[serde(rename = "500+")]
    pub over_500: u64,
}

impl PriceRanges {
    pub const LABELS: [&'static str; 5] = ["0-50", "51-100", "101-200", "201-500", "500+"];

    /// Upper bounds are inclusive: 50 lands in `0-50`, 50.01 in `51-100`.
    pub fn record(&mut self, price: f64) {
        let bucket = if price <= 50.0 {
            &mut self.up_to_50
        } else if price <= 100.0 {
            &mut self.up_to_100
        } else if price <= 200.0 {
            &mut self.up_to_200
        } else if price <= 500.0 {
            &mut self.up_to_500
        } else {
            &mut self.over_500
        };
        *bucket += 1;
    }

    pub fn counts(&self) -> [u64; 5] {
        [
            self.up_to_50,
            self.up_to_100,
            self.up_to_200,
            self.up_to_500,
            self.over_500,
        ]
    }

    pub fn total(&self) -> u64 {
        self.counts().iter().sum()
    }
}

/// One immutable statistics result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_products: u64,
    pub average_price: f64,
    pub price_ranges: PriceRanges,
    pub top_brands: Vec<BrandInfo>,
    pub categories: BTreeMap<String, u64>,
    #[serde(rename = "last_updated")]
    pub computed_at: DateTime<Utc>,
}

impl StatsSnapshot {
    pub fn empty(computed_at: DateTime<Utc>) -> Self {
        Self {
            total_products: 0,
            average_price: 0.0,
            price_ranges: PriceRanges::default(),
            top_brands: Vec::new(),
            categories: BTreeMap::new(),
            computed_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    /// Seconds until the served snapshot expires.
    pub ttl_seconds: u64,
    /// Seconds until the snapshot is scheduled to be recomputed.
    pub next_update_in: u64,
}

/// Body of `GET /api/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub cache_info: CacheInfo,
}
