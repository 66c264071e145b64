use crate::routes::{router, AppState};
use crate::settings::Settings;
use axum::Router;
use medprice_core::scraper::browser::{ChromiumBackend, ChromiumOptions};
use medprice_core::scraper::detail::RenderedDetailExtractor;
use medprice_core::scraper::http::HttpSearchExtractor;
use medprice_core::scraper::service::PriceService;
use std::sync::Arc;
use url::Url;

/// The HTTP server, built once at start-up from `Settings`.
pub struct Server {
    settings: Settings,
    app: Router,
}

impl Server {
    pub fn build(settings: Settings) -> anyhow::Result<Self> {
        settings.selectors.validate()?;
        let price_service = price_service(&settings)?;
        let app = router(Arc::new(AppState { price_service }));
        Ok(Self { settings, app })
    }

    pub fn with_service(settings: Settings, price_service: PriceService) -> Self {
        let app = router(Arc::new(AppState { price_service }));
        Self { settings, app }
    }

    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.settings.addr()?).await?;
        tracing::info!("listening on {}", listener.local_addr()?);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

fn price_service(settings: &Settings) -> anyhow::Result<PriceService> {
    let search = HttpSearchExtractor::new(&settings.search_url_template, settings.selectors.clone())
        .with_timeout(settings.search_timeout)
        .with_user_agent(settings.user_agent.as_deref())?;

    let backend = ChromiumBackend::new(ChromiumOptions {
        executable: settings.chrome_executable.clone(),
        proxy_server: settings.proxy_server.clone(),
        request_timeout: Some(settings.navigation_timeout),
    });
    let detail = RenderedDetailExtractor::new(Arc::new(backend), settings.selectors.clone())
        .with_navigation_timeout(settings.navigation_timeout);

    let service = PriceService::new(Arc::new(search), Arc::new(detail));

    // Product links on the search page may be site-relative.
    let base = settings.search_url_template.replace("{query}", "");
    Ok(match Url::parse(&base) {
        Ok(base) => service.with_link_base(base),
        Err(e) => {
            tracing::warn!("Search URL {:?} has no usable base: {}", base, e);
            service
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
