//! CSS selectors used against the upstream pages.
//!
//! These follow the pharmacy's markup, positional ones included. When the
//! site changes, override them through configuration instead of code.

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Selectors {
    /// Product header anchor on the search page; gives name and link.
    pub result_link: String,
    pub discount: String,
    /// Second paragraph of the inventory block on the detail page.
    pub strip_size: String,
    pub total_price: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            result_link: "h2.header a".to_string(),
            discount: ".reduce-price.label-discount".to_string(),
            strip_size: ".inventory-detail p:nth-child(2)".to_string(),
            total_price: ".total-price .product_price".to_string(),
        }
    }
}

impl Selectors {
    /// Compiles every selector once so bad configuration fails at start-up
    /// rather than on the first request.
    pub fn validate(&self) -> Result<(), ExtractError> {
        for selector in [
            &self.result_link,
            &self.discount,
            &self.strip_size,
            &self.total_price,
        ] {
            kuchikiki::Selectors::compile(selector)
                .map_err(|_| ExtractError::Selector(selector.clone()))?;
        }
        Ok(())
    }
}
