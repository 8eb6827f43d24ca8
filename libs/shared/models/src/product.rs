use serde::{Deserialize, Serialize};

/// One catalog item as the statistics pipeline sees it.
///
/// Every field except the identity is optional upstream; items without a
/// usable price are kept here and filtered out during aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Product {
    pub fn new(price: f64, brand: impl Into<String>) -> Self {
        Self {
            price: Some(price),
            brand: Some(brand.into()),
            ..Self::default()
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// The price if it can take part in statistics.
    pub fn usable_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p >= 0.0)
    }
}
