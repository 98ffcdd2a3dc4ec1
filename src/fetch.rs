use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

const USER_AGENT: &str = concat!("docset_builder/", env!("CARGO_PKG_VERSION"));

/// Where page markup comes from.
pub trait PageSource {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Save one binary resource (the docset icon) to `dest`.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<usize> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await
            .with_context(|| format!("Failed to download {}", url))?;
        tokio::fs::write(dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", dest))?;
        info!("Saved {} ({} bytes)", dest.display(), bytes.len());
        Ok(bytes.len())
    }
}

impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        info!("Fetching {}", url);
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?;
        Ok(html)
    }
}
