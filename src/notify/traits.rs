// Notifier trait — the swap-ready broadcast abstraction.
//
// The pipeline calls this at most once per run, only on a classified-new
// review, and never retries: delivery is best-effort and a failed send is
// the caller's to log and swallow.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Trait for broadcasting a notification message. Implementations must be
/// async because delivery is an HTTP call.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a single message. Errors are reported to the caller, which
    /// decides whether they matter; they never abort the run.
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Notifier used when no credential is configured. Missing credentials are
/// a valid setup ("notifications disabled"), not an error: the run logs
/// the skipped send and completes normally.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, _message: &str) -> Result<()> {
        info!("Notifications disabled — no LINE access token configured");
        Ok(())
    }
}
