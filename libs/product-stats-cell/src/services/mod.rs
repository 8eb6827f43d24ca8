pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod refresh;
pub mod scheduler;

pub use cache::{CacheEntry, CacheStore};
pub use catalog::{CatalogSource, OdaCatalogSource};
pub use refresh::RefreshCoordinator;
pub use scheduler::BackgroundRefresher;
