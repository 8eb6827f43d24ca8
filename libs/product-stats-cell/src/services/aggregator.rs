// =====================================================================================
// CATALOG AGGREGATION
// =====================================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::models::{BrandInfo, PriceRanges, StatsSnapshot, TOP_BRANDS_LIMIT};
use shared_models::Product;

pub fn compute(products: &[Product]) -> StatsSnapshot {
    compute_at(products, Utc::now())
}

/// Folds the catalog into a snapshot stamped with `computed_at`.
///
/// Never fails. Items without a usable price are left out of every figure, so
/// the price buckets always add up to `total_products`. Items without a brand
/// count everywhere except `top_brands`. Brand ties are broken by name,
/// ascending.
pub fn compute_at(products: &[Product], computed_at: DateTime<Utc>) -> StatsSnapshot {
    if products.is_empty() {
        warn!("No products provided for stats calculation");
        return StatsSnapshot::empty(computed_at);
    }

    info!("Starting stats calculation for {} products", products.len());

    let mut total_products: u64 = 0;
    let mut total_price = 0.0;
    let mut price_ranges = PriceRanges::default();
    let mut brands: BTreeMap<String, u64> = BTreeMap::new();
    let mut categories: BTreeMap<String, u64> = BTreeMap::new();
    let mut skipped = 0usize;

    for product in products {
        let Some(price) = product.usable_price() else {
            debug!("Skipping product {:?} without a usable price", product.id);
            skipped += 1;
            continue;
        };

        total_products += 1;
        total_price += price;
        price_ranges.record(price);

        if let Some(brand) = brand_name(product) {
            *brands.entry(brand).or_insert(0) += 1;
        }

        for category in &product.categories {
            *categories.entry(category.clone()).or_insert(0) += 1;
        }
    }

    if skipped > 0 {
        warn!("Skipped {} products with missing or invalid prices", skipped);
    }

    let average_price = if total_products == 0 {
        0.0
    } else {
        round_cents(total_price / total_products as f64)
    };

    let top_brands = top_brands(brands);

    info!(
        "Stats calculation completed: {} products, top brand {}",
        total_products,
        top_brands.first().map(|b| b.name.as_str()).unwrap_or("None")
    );

    StatsSnapshot {
        total_products,
        average_price,
        price_ranges,
        top_brands,
        categories,
        computed_at,
    }
}

fn brand_name(product: &Product) -> Option<String> {
    product
        .brand
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}

// `brands` iterates in name order and the sort is stable, which fixes the
// tie-break.
fn top_brands(brands: BTreeMap<String, u64>) -> Vec<BrandInfo> {
    let mut ranked: Vec<BrandInfo> = brands
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, count)| BrandInfo { name, count })
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(TOP_BRANDS_LIMIT);
    ranked
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
