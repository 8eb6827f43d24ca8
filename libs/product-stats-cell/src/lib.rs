// =====================================================================================
// PRODUCT STATS CELL - CATALOG AGGREGATION & SNAPSHOT CACHE
// =====================================================================================

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::StatsError;
pub use models::*;
pub use router::create_stats_router;
pub use services::{
    BackgroundRefresher, CacheEntry, CacheStore, CatalogSource, OdaCatalogSource,
    RefreshCoordinator,
};
