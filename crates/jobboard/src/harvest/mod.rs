//! Phase 1 discovery: fetch a category page over plain HTTP and turn its list
//! items into candidate listings.
//!
//! Fetch failures never abort a run; they are logged and produce an empty
//! harvest, so the caller simply has nothing to insert.

pub mod extract;

use std::time::Duration;

use anyhow::Context;
use thiserror::Error;

use crate::listings::NewJobListing;
pub use extract::{FieldStrategies, SiteProfile};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct Harvester {
    client: reqwest::Client,
    profile: SiteProfile,
}

impl Harvester {
    pub fn new(profile: SiteProfile, timeout: Duration) -> Result<Self, HarvestError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, profile })
    }

    /// Fetch `listing_url` and extract its listings. Any network failure is
    /// logged and yields an empty vec.
    pub async fn harvest(&self, listing_url: &str) -> Vec<NewJobListing> {
        tracing::info!(url = listing_url, "scraping jobs");

        let html = match self.fetch_html(listing_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(url = listing_url, error = ?e, "listing page request failed");
                return Vec::new();
            }
        };

        self.profile.parse_listings(&html)
    }

    async fn fetch_html(&self, url: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {status} for {url}");
        }

        response.text().await.context("failed to read response body")
    }
}
