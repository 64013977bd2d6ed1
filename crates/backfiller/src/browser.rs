use std::time::Duration;

use async_trait::async_trait;
use fantoccini::{error::CmdError, Client, ClientBuilder, Locator};
use jobboard::backfill::{PageRenderer, RenderError};
use serde_json::json;

/// Firefox driven over WebDriver (geckodriver). Rendering happens in the
/// browser, so client-side content is visible to the selector wait.
pub struct FirefoxSession {
    client: Option<Client>,
}

impl FirefoxSession {
    pub async fn connect(webdriver_url: &str, headless: bool) -> anyhow::Result<Self> {
        let mut caps = serde_json::Map::new();
        caps.insert("browserName".to_string(), json!("firefox"));
        if headless {
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .map_err(|e| anyhow::anyhow!("cannot start WebDriver session at {webdriver_url}: {e}"))?;

        tracing::info!(webdriver = webdriver_url, headless, "browser session started");
        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&self) -> Result<&Client, RenderError> {
        self.client
            .as_ref()
            .ok_or_else(|| RenderError::Session("session already closed".to_string()))
    }
}

#[async_trait]
impl PageRenderer for FirefoxSession {
    async fn render_text(
        &mut self,
        url: &str,
        selector: &str,
        timeout: Duration,
    ) -> Result<String, RenderError> {
        let client = self.client()?;

        client
            .goto(url)
            .await
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let element = client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
            .map_err(|e| match e {
                CmdError::WaitTimeout => RenderError::Timeout {
                    url: url.to_string(),
                    selector: selector.to_string(),
                    timeout,
                },
                other => RenderError::Extraction {
                    url: url.to_string(),
                    selector: selector.to_string(),
                    reason: other.to_string(),
                },
            })?;

        element.text().await.map_err(|e| RenderError::Extraction {
            url: url.to_string(),
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        match self.client.take() {
            Some(client) => client
                .close()
                .await
                .map_err(|e| RenderError::Session(e.to_string())),
            None => Ok(()),
        }
    }
}
