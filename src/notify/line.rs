// LINE Messaging API implementation.
//
// Sends the new-review message to every friend of the bot via the
// broadcast endpoint. One POST per run, no retry — the dedup gate persists
// the signature whether or not delivery succeeds, so a lost message stays
// lost rather than repeating on every subsequent run.
//
// API docs: https://developers.line.biz/en/reference/messaging-api/#send-broadcast-message

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::traits::Notifier;

/// Broadcast endpoint of the LINE Messaging API.
pub const BROADCAST_URL: &str = "https://api.line.me/v2/bot/message/broadcast";

/// LINE broadcast notifier, authorized by a channel access token.
pub struct LineNotifier {
    client: Client,
    access_token: String,
    endpoint: String,
}

impl LineNotifier {
    pub fn new(access_token: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
            endpoint: BROADCAST_URL.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let request = BroadcastRequest {
            messages: vec![TextMessage {
                kind: "text",
                text: message.to_string(),
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .context("Failed to call LINE broadcast API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LINE broadcast returned {status}: {body}");
        }

        debug!(chars = message.chars().count(), "Broadcast sent");
        Ok(())
    }
}

// --- LINE request types ---

#[derive(Serialize)]
struct BroadcastRequest {
    messages: Vec<TextMessage>,
}

#[derive(Serialize)]
struct TextMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}
