use serde::{Deserialize, Serialize};

pub const NO_DISCOUNT: &str = "No Discount";
pub const NO_LINK: &str = "No Link";
pub const NO_STRIP_SIZE: &str = "No strip size available";
pub const NO_TOTAL_PRICE: &str = "No total price available";

/// First hit on the upstream search page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub name: String,
    pub discount: String,
    pub link: String,
}

impl SearchResult {
    /// Whether `link` points somewhere a detail page can be rendered from.
    pub fn has_link(&self) -> bool {
        !self.link.is_empty() && self.link != NO_LINK
    }
}

/// Fields read off a rendered product page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DetailResult {
    pub strip_size: String,
    pub total_price: String,
}

impl Default for DetailResult {
    fn default() -> Self {
        Self {
            strip_size: NO_STRIP_SIZE.to_string(),
            total_price: NO_TOTAL_PRICE.to_string(),
        }
    }
}

/// Response body of a successful lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CombinedResult {
    pub name: String,
    pub discount: String,
    pub link: String,
    pub strip_size: String,
    pub total_price: String,
}

impl CombinedResult {
    pub fn merge(search: SearchResult, detail: DetailResult) -> Self {
        Self {
            name: search.name,
            discount: search.discount,
            link: search.link,
            strip_size: detail.strip_size,
            total_price: detail.total_price,
        }
    }
}
