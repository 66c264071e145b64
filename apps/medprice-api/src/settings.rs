use anyhow::Context;
use medprice_core::scraper::http::DEFAULT_SEARCH_URL_TEMPLATE;
use medprice_core::Selectors;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Process configuration, read once at start-up.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub search_url_template: String,
    pub search_timeout: Option<Duration>,
    pub user_agent: Option<String>,
    pub navigation_timeout: Duration,
    pub chrome_executable: Option<PathBuf>,
    pub proxy_server: Option<String>,
    pub selectors: Selectors,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            search_url_template: DEFAULT_SEARCH_URL_TEMPLATE.to_string(),
            search_timeout: None,
            user_agent: None,
            navigation_timeout: Duration::from_secs(60),
            chrome_executable: None,
            proxy_server: None,
            selectors: Selectors::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(port) => port.parse().with_context(|| format!("invalid PORT {:?}", port))?,
            None => defaults.port,
        };
        let search_timeout = var("SEARCH_TIMEOUT_MS")
            .map(|ms| parse_millis("SEARCH_TIMEOUT_MS", &ms))
            .transpose()?;
        let navigation_timeout = var("NAVIGATION_TIMEOUT_MS")
            .map(|ms| parse_millis("NAVIGATION_TIMEOUT_MS", &ms))
            .transpose()?
            .unwrap_or(defaults.navigation_timeout);

        let selectors = match var("SELECTORS_FILE") {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read selectors file {}", path))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("failed to parse selectors file {}", path))?
            }
            None => defaults.selectors,
        };

        let search_url_template = var("SEARCH_URL_TEMPLATE").unwrap_or(defaults.search_url_template);
        if !search_url_template.contains("{query}") {
            anyhow::bail!("SEARCH_URL_TEMPLATE must contain a {{query}} placeholder");
        }

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port,
            search_url_template,
            search_timeout,
            user_agent: var("USER_AGENT"),
            navigation_timeout,
            chrome_executable: var("CHROME_EXECUTABLE").map(PathBuf::from),
            proxy_server: var("PROXY_SERVER"),
            selectors,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_millis(key: &str, value: &str) -> anyhow::Result<Duration> {
    let ms: u64 = value
        .parse()
        .with_context(|| format!("invalid {} {:?}", key, value))?;
    Ok(Duration::from_millis(ms))
}
