use std::time::Duration;

use thiserror::Error;

pub const MISSING_MEDICINE_MESSAGE: &str = "Please provide a medicine name in the request body.";
pub const SEARCH_FAILED_MESSAGE: &str = "Error fetching search data or missing product link";
pub const DETAIL_FAILED_MESSAGE: &str = "Error fetching product details";

/// Why a single extraction stage failed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("failed to launch rendering session: {0}")]
    Launch(#[source] anyhow::Error),
    #[error("navigation failed: {0}")]
    Navigation(#[source] anyhow::Error),
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),
    #[error("failed to read rendered page: {0}")]
    Render(#[source] anyhow::Error),
}

/// Failure of a whole lookup, as reported to clients.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no medicine name given")]
    MissingMedicine,
    #[error("search failed: {0}")]
    Search(#[source] ExtractError),
    #[error("search for {0:?} returned no product link")]
    NoLink(String),
    #[error("product detail extraction failed: {0}")]
    Detail(#[source] ExtractError),
}

impl LookupError {
    /// HTTP status code for this failure.
    pub fn status(&self) -> u16 {
        match self {
            LookupError::MissingMedicine => 400,
            _ => 500,
        }
    }

    /// The fixed message sent to the client. Details stay in the logs.
    pub fn client_message(&self) -> &'static str {
        match self {
            LookupError::MissingMedicine => MISSING_MEDICINE_MESSAGE,
            LookupError::Search(_) | LookupError::NoLink(_) => SEARCH_FAILED_MESSAGE,
            LookupError::Detail(_) => DETAIL_FAILED_MESSAGE,
        }
    }
}
