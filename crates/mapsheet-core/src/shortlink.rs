//! Short map link expansion

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::error::{provider_detail, SheetError};

/// Hosts whose links only carry a redirect, never coordinates
pub const SHORTENER_HOSTS: &[&str] = &["goo.gl", "g.co"];

const EXPAND_TIMEOUT: Duration = Duration::from_secs(15);
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Follows a short link to the URL it finally lands on
#[async_trait]
pub trait LinkExpander: Send + Sync {
    async fn expand(&self, url: &str) -> Result<String, SheetError>;
}

/// True when the link's host is one of [`SHORTENER_HOSTS`] or a subdomain of one
pub fn is_short_link(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    SHORTENER_HOSTS
        .iter()
        .any(|s| host == *s || host.ends_with(&format!(".{}", s)))
}

/// Expands links with a single redirect-following GET
pub struct HttpLinkExpander {
    client: reqwest::Client,
}

impl HttpLinkExpander {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(EXPAND_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LinkExpander for HttpLinkExpander {
    async fn expand(&self, url: &str) -> Result<String, SheetError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!("Short link expansion failed for {}: {}", url, provider_detail(e));
            SheetError::UrlResolutionFailed
        })?;

        let expanded = response.url().to_string();
        debug!("Expanded short link {} -> {}", url, expanded);
        Ok(expanded)
    }
}
