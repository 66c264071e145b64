use super::{DetailExtractor, SearchExtractor, SearchOutcome};
use crate::error::LookupError;
use crate::model::CombinedResult;
use std::sync::Arc;
use url::Url;

/// Runs search then detail extraction for one medicine and merges the two.
pub struct PriceService {
    search: Arc<dyn SearchExtractor>,
    detail: Arc<dyn DetailExtractor>,
    link_base: Option<Url>,
}

impl PriceService {
    pub fn new(search: Arc<dyn SearchExtractor>, detail: Arc<dyn DetailExtractor>) -> Self {
        Self {
            search,
            detail,
            link_base: None,
        }
    }

    /// Relative product links are resolved against `base` before rendering.
    pub fn with_link_base(mut self, base: Url) -> Self {
        self.link_base = Some(base);
        self
    }

    pub async fn lookup(&self, medicine: Option<&str>) -> Result<CombinedResult, LookupError> {
        let medicine = match medicine {
            Some(m) if !m.is_empty() => m,
            _ => return Err(LookupError::MissingMedicine),
        };

        let found = match self.search.search(medicine).await {
            Ok(SearchOutcome::Found(result)) => result,
            Ok(SearchOutcome::NotFound) => {
                tracing::warn!("No search results for {:?}", medicine);
                return Err(LookupError::NoLink(medicine.to_string()));
            }
            Err(e) => {
                tracing::error!("Error fetching search data for {:?}: {}", medicine, e);
                return Err(LookupError::Search(e));
            }
        };

        if !found.has_link() {
            tracing::warn!("Search result {:?} has no product link", found.name);
            return Err(LookupError::NoLink(medicine.to_string()));
        }

        let target = self.resolve_link(&found.link);
        let detail = match self.detail.details(&target).await {
            Ok(detail) => detail,
            Err(e) => {
                tracing::error!("Error scraping product detail {}: {}", target, e);
                return Err(LookupError::Detail(e));
            }
        };

        tracing::info!("Fetched price for {:?}", found.name);
        Ok(CombinedResult::merge(found, detail))
    }

    fn resolve_link(&self, link: &str) -> String {
        match &self.link_base {
            Some(base) if Url::parse(link).is_err() => base
                .join(link)
                .map(String::from)
                .unwrap_or_else(|_| link.to_string()),
            _ => link.to_string(),
        }
    }
}
