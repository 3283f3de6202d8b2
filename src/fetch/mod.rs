//! Document acquisition boundary.
//!
//! The extraction pipeline operates on an already-fetched document; this
//! trait is the seam that keeps browsers, proxies, and fixtures out of the
//! core. The stock implementation is a plain HTTP GET — no rendering, no
//! scrolling, no anti-bot games.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

/// Supplies the rendered listing-page HTML for one extraction pass.
#[async_trait]
pub trait DealSource: Send + Sync {
    async fn fetch_listing(&self) -> Result<String>;
}

/// HTTP document source for the storefront's deals page.
pub struct HttpDealSource {
    client: Client,
    url: String,
}

impl HttpDealSource {
    pub fn new(url: String) -> Self {
        let client = Client::builder()
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )
            .build()
            .expect("Failed to create HTTP client");

        Self { client, url }
    }
}

#[async_trait]
impl DealSource for HttpDealSource {
    async fn fetch_listing(&self) -> Result<String> {
        info!("Fetching deals page: {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header("Accept-Language", "pt-BR,pt;q=0.9")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to fetch deals page: {}",
                response.status()
            ));
        }

        Ok(response.text().await?)
    }
}
