// Page session trait — the swap-ready automation boundary.
//
// The pipeline only needs six capabilities from the browser: navigate,
// wait, query, click, read text, and shut down. Everything else about the
// session (launch flags, viewport, locale) belongs to the implementation.
// Tests drive the pipeline against a scripted in-memory page.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// Opaque handle to an element on the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementId(pub String);

/// A concrete element query, in WebDriver terms: a location strategy name
/// plus its selector value. Produced by lowering a `SelectorCandidate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub using: &'static str,
    pub value: String,
}

/// Driving interface for one live page session.
///
/// Implementations must not retry internally — the caller owns the
/// skip-vs-abort decision for every step.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate to a URL, waiting up to `timeout` for the load to complete.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Fixed settle delay to let client-side rendering catch up.
    /// The default just sleeps; test sessions override to a no-op.
    async fn settle(&self, wait: Duration) {
        tokio::time::sleep(wait).await;
    }

    /// Query the current document. Zero matches is a success with an empty
    /// vec, never an error.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementId>>;

    /// Click an element previously returned by `find_all`.
    async fn click(&self, element: &ElementId) -> Result<()>;

    /// Read an element's visible text.
    async fn text(&self, element: &ElementId) -> Result<String>;

    /// Cleanly terminate the session. Called on every exit path.
    async fn close(&self) -> Result<()>;
}
