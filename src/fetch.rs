use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

pub const WIKI_BASE_URL: &str = "https://en.wikipedia.org/wiki/";
const USER_AGENT: &str = "Mozilla/5.0";

/// Raw response for one topic page.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

/// Why a topic page could not be used. Never fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Page, FetchFailure>;
}

/// Reference page for a topic: spaces become `_`, appended to the wiki base path.
pub fn topic_url(topic: &str) -> String {
    format!("{}{}", WIKI_BASE_URL, topic.replace(' ', "_"))
}

pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, e: reqwest::Error) -> FetchFailure {
        if e.is_timeout() {
            FetchFailure::Timeout(self.timeout)
        } else {
            FetchFailure::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, FetchFailure> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        Ok(Page { status, body })
    }
}
