use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;
use shared_models::Product;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<SearchItem>,
    #[serde(default)]
    attributes: PageAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct PageAttributes {
    #[serde(default)]
    has_more_items: bool,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    attributes: Value,
}

/// Paginated client for the ODA mixed search API, the catalog behind the
/// product statistics.
pub struct OdaCatalogClient {
    client: Client,
    search_url: String,
    max_retries: u32,
    page_delay: Duration,
    retry_pause: Duration,
}

impl OdaCatalogClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            search_url: format!("{}/search/mixed/", config.oda_api_base_url.trim_end_matches('/')),
            max_retries: config.catalog_max_retries.max(1),
            page_delay: Duration::from_millis(config.catalog_page_delay_ms),
            retry_pause: RETRY_PAUSE,
        }
    }

    pub fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }

    /// Walks every page until the API reports the end of the listing.
    #[instrument(skip(self))]
    pub async fn fetch_all_products(&self) -> Result<Vec<Product>> {
        let mut products = Vec::new();
        let mut page: u32 = 1;

        loop {
            let Some(search_page) = self.fetch_page_with_retry(page).await? else {
                info!("Finished fetching products. Total products: {}", products.len());
                return Ok(products);
            };

            products.extend(
                search_page
                    .items
                    .iter()
                    .filter(|item| item.kind == "product")
                    .map(|item| product_from_attributes(&item.attributes)),
            );

            if !search_page.attributes.has_more_items {
                info!("No more items flag received after page {}", page);
                return Ok(products);
            }

            page += 1;
            tokio::time::sleep(self.page_delay).await;
        }
    }

    async fn fetch_page_with_retry(&self, page: u32) -> Result<Option<SearchPage>> {
        let mut attempt = 1;

        loop {
            match self.fetch_page(page).await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < self.max_retries => {
                    warn!("Attempt {} failed for page {}: {}", attempt, page, e);
                    attempt += 1;
                    tokio::time::sleep(self.retry_pause).await;
                }
                Err(e) => {
                    error!("Failed to fetch page {} after {} attempts: {}", page, attempt, e);
                    return Err(e);
                }
            }
        }
    }

    /// `Ok(None)` marks the end of pagination (the API answers 422 past the
    /// last page).
    async fn fetch_page(&self, page: u32) -> Result<Option<SearchPage>> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", String::new()), ("page", page.to_string())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        debug!("GET {} page={} status={}", self.search_url, page, status);

        match status {
            StatusCode::OK => Ok(Some(response.json::<SearchPage>().await?)),
            StatusCode::UNPROCESSABLE_ENTITY => {
                info!("Reached end of pagination at page {}", page);
                Ok(None)
            }
            other => Err(anyhow!("Catalog API error ({}) for page {}", other, page)),
        }
    }
}

fn product_from_attributes(attrs: &Value) -> Product {
    let categories = attrs
        .get("client_classifiers")
        .and_then(Value::as_array)
        .map(|classifiers| {
            classifiers
                .iter()
                .filter_map(|c| c.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Product {
        id: attrs.get("id").and_then(Value::as_i64),
        name: attrs.get("name").and_then(Value::as_str).map(str::to_string),
        brand: attrs.get("brand").and_then(Value::as_str).map(str::to_string),
        price: attrs.get("gross_price").and_then(parse_price),
        categories,
    }
}

// gross_price arrives as a decimal string ("12.90"), occasionally as a number.
fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
