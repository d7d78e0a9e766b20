// W3C WebDriver session — a thin reqwest wrapper over the REST protocol.
//
// Talks to a locally running driver (chromedriver by default) rather than
// bundling a browser. Only the handful of endpoints the pipeline needs are
// implemented: session create/delete, navigate, find elements, click, and
// element text.
//
// Protocol reference: https://www.w3.org/TR/webdriver2/

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::traits::{ElementId, Locator, PageSession};

/// Default endpoint for a locally running chromedriver.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// One live browser session driven over the WebDriver protocol.
pub struct WebDriverSession {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// Create a new headless session against the driver at `base_url`.
    ///
    /// The browser is pinned to a large fixed viewport and the Japanese
    /// locale so the target page renders the same element text on every
    /// run.
    pub async fn connect(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            "--headless=new",
                            "--window-size=1920,1080",
                            "--lang=ja-JP",
                        ]
                    }
                }
            }
        });

        let response = client
            .post(format!("{base_url}/session"))
            .json(&capabilities)
            .send()
            .await
            .with_context(|| format!("Failed to reach WebDriver at {base_url}"))?;

        let created: NewSessionResponse = decode(response)
            .await
            .context("WebDriver session creation failed")?;

        debug!(session_id = %created.value.session_id, "WebDriver session created");

        Ok(Self {
            client,
            base_url,
            session_id: created.value.session_id,
        })
    }

    fn session_url(&self, suffix: &str) -> String {
        format!("{}/session/{}{}", self.base_url, self.session_id, suffix)
    }
}

#[async_trait]
impl PageSession for WebDriverSession {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        // Page-load timeout applies to the navigation call that follows.
        let response = self
            .client
            .post(self.session_url("/timeouts"))
            .json(&json!({ "pageLoad": timeout.as_millis() as u64 }))
            .send()
            .await
            .context("Failed to set page-load timeout")?;
        decode::<Ignored>(response).await?;

        debug!(url = url, "Navigating");
        let response = self
            .client
            .post(self.session_url("/url"))
            .json(&json!({ "url": url }))
            .send()
            .await
            .context("Navigation request failed")?;
        decode::<Ignored>(response)
            .await
            .with_context(|| format!("Navigation to {url} failed"))?;
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementId>> {
        let response = self
            .client
            .post(self.session_url("/elements"))
            .json(&json!({ "using": locator.using, "value": locator.value }))
            .send()
            .await
            .with_context(|| format!("Element query failed: {}", locator.value))?;

        let found: ValueResponse<Vec<ElementRef>> = decode(response)
            .await
            .with_context(|| format!("Element query failed: {}", locator.value))?;

        Ok(found.value.into_iter().map(|e| ElementId(e.id)).collect())
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        let response = self
            .client
            .post(self.session_url(&format!("/element/{}/click", element.0)))
            .json(&json!({}))
            .send()
            .await
            .context("Click request failed")?;
        decode::<Ignored>(response).await.context("Click rejected")?;
        Ok(())
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        let response = self
            .client
            .get(self.session_url(&format!("/element/{}/text", element.0)))
            .send()
            .await
            .context("Text request failed")?;
        let text: ValueResponse<String> = decode(response)
            .await
            .context("Failed to read element text")?;
        Ok(text.value)
    }

    async fn close(&self) -> Result<()> {
        let response = self
            .client
            .delete(self.session_url(""))
            .send()
            .await
            .context("Session delete request failed")?;
        decode::<Ignored>(response).await?;
        debug!(session_id = %self.session_id, "WebDriver session closed");
        Ok(())
    }
}

/// Check the HTTP status and deserialize a WebDriver response body.
///
/// Error responses carry a JSON `{"value": {"error", "message"}}` body;
/// surface the message rather than the raw payload when we can parse it.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| format!("{}: {}", e.value.error, e.value.message))
            .unwrap_or(body);
        anyhow::bail!("WebDriver returned {status}: {detail}");
    }
    response
        .json::<T>()
        .await
        .context("Failed to deserialize WebDriver response")
}

// -- Serde types for the WebDriver protocol --

#[derive(Deserialize)]
struct NewSessionResponse {
    value: NewSessionValue,
}

#[derive(Deserialize)]
struct NewSessionValue {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Deserialize)]
struct ValueResponse<T> {
    value: T,
}

/// An element reference, keyed by the W3C element identifier constant.
#[derive(Deserialize)]
struct ElementRef {
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    value: ErrorValue,
}

#[derive(Deserialize)]
struct ErrorValue {
    error: String,
    message: String,
}

/// Response body we don't need anything from (`{"value": null}`).
#[derive(Deserialize)]
struct Ignored {
    #[serde(rename = "value")]
    _value: serde_json::Value,
}
