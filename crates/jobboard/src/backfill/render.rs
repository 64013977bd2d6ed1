use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("timed out after {}s waiting for {selector:?} on {url}", .timeout.as_secs())]
    Timeout {
        url: String,
        selector: String,
        timeout: Duration,
    },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("could not read {selector:?} on {url}: {reason}")]
    Extraction {
        url: String,
        selector: String,
        reason: String,
    },

    #[error("browser session error: {0}")]
    Session(String),
}

impl RenderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RenderError::Timeout { .. })
    }
}

/// A browser-like session that executes client-side scripts before content
/// is read. One session serves a whole backfill run.
#[async_trait]
pub trait PageRenderer: Send {
    /// Navigate to `url`, wait up to `timeout` for `selector` to appear, and
    /// return the element's rendered text.
    async fn render_text(
        &mut self,
        url: &str,
        selector: &str,
        timeout: Duration,
    ) -> Result<String, RenderError>;

    /// End the session. Called exactly once, on every exit path.
    async fn close(&mut self) -> Result<(), RenderError>;
}
