use super::browser::{RenderBackend, RenderSession};
use super::idle::IdleOptions;
use super::{rendered_text, DetailExtractor};
use crate::error::ExtractError;
use crate::model::{DetailResult, NO_STRIP_SIZE, NO_TOTAL_PRICE};
use crate::selectors::Selectors;
use async_trait::async_trait;
use kuchikiki::traits::TendrilSink;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// A guard that ensures the session is closed exactly once, even when the
/// owning future is dropped mid-render.
struct SessionGuard {
    session: Option<Box<dyn RenderSession>>,
}

impl SessionGuard {
    fn new(session: Box<dyn RenderSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    async fn render(
        &mut self,
        url: &str,
        timeout: Duration,
        idle: IdleOptions,
    ) -> Result<String, ExtractError> {
        let Some(session) = self.session.as_deref_mut() else {
            return Err(ExtractError::Render(anyhow::anyhow!("session already released")));
        };
        match tokio::time::timeout(timeout, session.render(url, idle)).await {
            Ok(Ok(html)) => Ok(html),
            Ok(Err(e)) => Err(ExtractError::Navigation(e)),
            Err(_) => Err(ExtractError::NavigationTimeout(timeout)),
        }
    }

    async fn release(mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("Failed to close rendering session: {}", e);
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Rendering abandoned, closing session in background");
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        debug!("Failed to close session in Drop: {}", e);
                    }
                });
            }
            Err(_) => warn!("No runtime available to close abandoned rendering session"),
        }
    }
}

/// Renders the product page in a throwaway session and reads pack size and
/// price from the resulting DOM.
pub struct RenderedDetailExtractor {
    backend: Arc<dyn RenderBackend>,
    selectors: Selectors,
    navigation_timeout: Duration,
    idle: IdleOptions,
}

impl RenderedDetailExtractor {
    pub fn new(backend: Arc<dyn RenderBackend>, selectors: Selectors) -> Self {
        Self {
            backend,
            selectors,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            idle: IdleOptions::default(),
        }
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_idle_options(mut self, idle: IdleOptions) -> Self {
        self.idle = idle;
        self
    }
}

#[async_trait]
impl DetailExtractor for RenderedDetailExtractor {
    async fn details(&self, url: &str) -> Result<DetailResult, ExtractError> {
        let session = self.backend.open().await.map_err(ExtractError::Launch)?;
        let mut guard = SessionGuard::new(session);

        debug!("Rendering detail page {}", url);
        let rendered = guard
            .render(url, self.navigation_timeout, self.idle)
            .await;
        guard.release().await;

        let html = rendered?;
        parse_detail_page(&html, &self.selectors)
    }
}

/// Reads strip size and total price from a rendered product page.
pub fn parse_detail_page(html: &str, selectors: &Selectors) -> Result<DetailResult, ExtractError> {
    let document = kuchikiki::parse_html().one(html);

    let field = |selector: &str, fallback: &str| -> Result<String, ExtractError> {
        Ok(document
            .select(selector)
            .map_err(|_| ExtractError::Selector(selector.to_string()))?
            .next()
            .map(|node| rendered_text(node.as_node()))
            .unwrap_or_else(|| fallback.to_string()))
    };

    Ok(DetailResult {
        strip_size: field(&selectors.strip_size, NO_STRIP_SIZE)?,
        total_price: field(&selectors.total_price, NO_TOTAL_PRICE)?,
    })
}
