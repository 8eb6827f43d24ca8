use async_trait::async_trait;

use crate::error::StatsError;
use shared_config::AppConfig;
use shared_database::OdaCatalogClient;
use shared_models::Product;

/// Where the aggregator's input comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_products(&self) -> Result<Vec<Product>, StatsError>;
}

pub struct OdaCatalogSource {
    client: OdaCatalogClient,
}

impl OdaCatalogSource {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: OdaCatalogClient::new(config),
        }
    }
}

#[async_trait]
impl CatalogSource for OdaCatalogSource {
    async fn fetch_products(&self) -> Result<Vec<Product>, StatsError> {
        self.client
            .fetch_all_products()
            .await
            .map_err(|e| StatsError::Catalog(e.to_string()))
    }
}
