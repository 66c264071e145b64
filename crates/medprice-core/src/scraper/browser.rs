use super::idle::{wait_for_network_idle, IdleOptions, NetworkEvent};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Starts isolated rendering sessions.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn open(&self) -> anyhow::Result<Box<dyn RenderSession>>;
}

/// One disposable browser context. `close` must be called exactly once.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigates to `url`, waits for the network to settle and returns the
    /// serialized DOM.
    async fn render(&mut self, url: &str, idle: IdleOptions) -> anyhow::Result<String>;

    async fn close(self: Box<Self>) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct ChromiumOptions {
    pub executable: Option<PathBuf>,
    pub proxy_server: Option<String>,
    /// Upper bound chromiumoxide applies to each CDP request.
    pub request_timeout: Option<Duration>,
}

/// Launches a fresh headless Chrome per session.
#[derive(Debug, Clone, Default)]
pub struct ChromiumBackend {
    options: ChromiumOptions,
}

impl ChromiumBackend {
    pub fn new(options: ChromiumOptions) -> Self {
        Self { options }
    }

    fn config(&self, user_data_dir: &Path) -> anyhow::Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .user_data_dir(user_data_dir);

        if let Some(executable) = &self.options.executable {
            builder = builder.chrome_executable(executable);
        }
        if let Some(proxy) = &self.options.proxy_server {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }
        if let Some(timeout) = self.options.request_timeout {
            builder = builder.request_timeout(timeout);
        }

        builder.build().map_err(|e| anyhow::anyhow!(e))
    }
}

#[async_trait]
impl RenderBackend for ChromiumBackend {
    async fn open(&self) -> anyhow::Result<Box<dyn RenderSession>> {
        let user_data_dir =
            std::env::temp_dir().join(format!("medprice-chrome-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&user_data_dir)?;

        let config = match self.config(&user_data_dir) {
            Ok(config) => config,
            Err(e) => {
                remove_profile(&user_data_dir);
                return Err(e);
            }
        };

        let (browser, mut handler) = match Browser::launch(config).await {
            Ok(launched) => launched,
            Err(e) => {
                remove_profile(&user_data_dir);
                return Err(e.into());
            }
        };

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    debug!("Browser handler error: {:?}", h);
                    break;
                }
            }
        });

        debug!("Launched browser with profile {}", user_data_dir.display());
        Ok(Box::new(ChromiumSession {
            browser,
            handle,
            user_data_dir,
            page: None,
        }))
    }
}

struct ChromiumSession {
    browser: Browser,
    handle: JoinHandle<()>,
    user_data_dir: PathBuf,
    page: Option<Page>,
}

impl ChromiumSession {
    async fn network_events(
        page: &Page,
    ) -> anyhow::Result<futures::stream::BoxStream<'static, NetworkEvent>> {
        let started = page
            .event_listener::<EventRequestWillBeSent>()
            .await?
            .map(|e| NetworkEvent::Started(e.request_id.inner().clone()));
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await?
            .map(|e| NetworkEvent::Finished(e.request_id.inner().clone()));
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await?
            .map(|e| NetworkEvent::Failed(e.request_id.inner().clone()));

        Ok(futures::stream::select_all(vec![
            started.boxed(),
            finished.boxed(),
            failed.boxed(),
        ])
        .boxed())
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn render(&mut self, url: &str, idle: IdleOptions) -> anyhow::Result<String> {
        let page = self.browser.new_page("about:blank").await?;
        self.page = Some(page.clone());

        // Subscribe before navigating so no request goes uncounted.
        let mut events = Self::network_events(&page).await?;
        page.goto(url).await?;
        wait_for_network_idle(&mut events, idle).await;

        Ok(page.content().await?)
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        let mut this = self;
        if let Some(page) = this.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }

        let closed = this.browser.close().await;
        if let Err(e) = this.browser.wait().await {
            warn!("Failed waiting for browser exit: {}", e);
        }
        this.handle.abort();
        remove_profile(&this.user_data_dir);

        closed.map(|_| ()).map_err(Into::into)
    }
}

fn remove_profile(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        warn!("Failed to remove browser profile {}: {}", path.display(), e);
    }
}
