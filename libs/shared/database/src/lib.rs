pub mod key_value;
pub mod oda;

pub use key_value::{KeyDetails, KeyValueBackend, RedisBackend, STATS_CACHE_KEY};
pub use oda::OdaCatalogClient;
