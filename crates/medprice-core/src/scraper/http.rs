use super::{element_text, SearchExtractor, SearchOutcome};
use crate::error::ExtractError;
use crate::model::{SearchResult, NO_DISCOUNT, NO_LINK};
use crate::selectors::Selectors;
use async_trait::async_trait;
use kuchikiki::traits::TendrilSink;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SEARCH_URL_TEMPLATE: &str = "https://dawaai.pk/search/index?search={query}";

/// Fetches the pharmacy search page over plain HTTP and reads the first hit.
pub struct HttpSearchExtractor {
    client: reqwest::Client,
    url_template: String,
    selectors: Selectors,
    timeout: Option<Duration>,
}

impl HttpSearchExtractor {
    pub fn new(url_template: impl Into<String>, selectors: Selectors) -> Self {
        Self {
            client: reqwest::Client::new(),
            url_template: url_template.into(),
            selectors,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<&str>) -> anyhow::Result<Self> {
        if let Some(agent) = user_agent {
            let mut headers = HeaderMap::new();
            headers.insert(USER_AGENT, HeaderValue::from_str(agent)?);
            self.client = reqwest::Client::builder()
                .default_headers(headers)
                .build()?;
        }
        Ok(self)
    }

    /// The query is substituted verbatim; URL parsing in the client does
    /// whatever percent-encoding is needed.
    pub fn search_url(&self, medicine: &str) -> String {
        self.url_template.replace("{query}", medicine)
    }
}

impl Default for HttpSearchExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_URL_TEMPLATE, Selectors::default())
    }
}

#[async_trait]
impl SearchExtractor for HttpSearchExtractor {
    async fn search(&self, medicine: &str) -> Result<SearchOutcome, ExtractError> {
        let url = self.search_url(medicine);
        debug!("Fetching search page {}", url);

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status(status.as_u16()));
        }
        let body = response.text().await?;

        parse_search_page(&body, &self.selectors)
    }
}

/// Reads name, discount and link of the first result on a search page.
pub fn parse_search_page(html: &str, selectors: &Selectors) -> Result<SearchOutcome, ExtractError> {
    let document = kuchikiki::parse_html().one(html);

    let header = document
        .select(&selectors.result_link)
        .map_err(|_| ExtractError::Selector(selectors.result_link.clone()))?
        .next();
    let discount = document
        .select(&selectors.discount)
        .map_err(|_| ExtractError::Selector(selectors.discount.clone()))?
        .next()
        .map(|node| element_text(node.as_node()))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NO_DISCOUNT.to_string());

    let Some(header) = header else {
        return Ok(SearchOutcome::NotFound);
    };

    let name = element_text(header.as_node());
    let link = header
        .attributes
        .borrow()
        .get("href")
        .filter(|href| !href.is_empty())
        .unwrap_or(NO_LINK)
        .to_string();

    Ok(SearchOutcome::Found(SearchResult {
        name,
        discount,
        link,
    }))
}
