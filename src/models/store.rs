//! Storefront payloads
//!
//! The data shapes cached for each entity kind, as delivered by the remote
//! commerce API.

use serde::{Deserialize, Serialize};

/// Public store profile. Cached under the store id, its subdomain and its
/// username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl StoreProfile {
    /// Every public handle of this store that lookups may use.
    pub fn aliases(&self) -> Vec<&str> {
        [self.subdomain.as_deref(), self.username.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Price in minor currency units
    pub price: i64,
    #[serde(default)]
    pub compare_at_price: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub in_stock: bool,
}

/// One page of the product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub product_count: u64,
}

/// Consolidated category list of a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: String,
    /// 1 to 5
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Aggregate rating figures returned with each review fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub average_rating: f64,
    pub total_reviews: u64,
    /// Review count per star rating, index 0 = 1 star
    #[serde(default)]
    pub distribution: [u64; 5],
}

/// One page of reviews together with the stats of that fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPage {
    pub page: u32,
    pub total_pages: u32,
    pub items: Vec<Review>,
    pub stats: ReviewStats,
}
