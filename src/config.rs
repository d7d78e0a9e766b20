use std::env;

use anyhow::Result;

use crate::session::webdriver::DEFAULT_WEBDRIVER_URL;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file is
/// loaded automatically at startup via dotenvy.
pub struct Config {
    /// The map-listing page to watch.
    pub target_url: String,
    /// LINE channel access token. Empty means notifications are disabled —
    /// a valid configuration, the run still completes.
    pub line_access_token: String,
    /// Path of the plain-text file holding the last-notified signature.
    pub state_file: String,
    /// WebDriver endpoint (chromedriver by default).
    pub webdriver_url: String,
}

impl Config {
    /// Load configuration from environment variables. Only the target URL
    /// has no default — everything else degrades gracefully.
    pub fn load() -> Result<Self> {
        Ok(Self {
            target_url: env::var("KUCHIKOMI_TARGET_URL").unwrap_or_default(),
            line_access_token: env::var("LINE_ACCESS_TOKEN").unwrap_or_default(),
            state_file: env::var("KUCHIKOMI_STATE_FILE")
                .unwrap_or_else(|_| "./last_review.txt".to_string()),
            webdriver_url: env::var("WEBDRIVER_URL")
                .unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string()),
        })
    }

    /// Check that the target URL is configured.
    /// Call this before any operation that drives the page.
    pub fn require_target(&self) -> Result<()> {
        if self.target_url.is_empty() {
            anyhow::bail!(
                "KUCHIKOMI_TARGET_URL not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    pub fn notifications_enabled(&self) -> bool {
        !self.line_access_token.is_empty()
    }
}
