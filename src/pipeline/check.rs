// One poll run: drive the page to the reviews section, extract the top
// review, and classify it against the persisted signature.
//
// Only navigation failure aborts a run. Every other step (consent popup,
// reviews tab, sort preference) is best-effort: the page ships two layout
// variants and two locales, and a step that's absent on one variant is
// simply skipped. Under sort failure the "latest" review may actually be
// stale; that is a known, accepted limitation.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::normalize::normalize;
use crate::notify::Notifier;
use crate::selector::{self, targets};
use crate::session::PageSession;
use crate::signature::SignatureStore;

/// Raw-text prefix (in characters) fed to the normalizer. Keeps signatures
/// small and stable even when trailing content varies between renders.
pub const SIGNATURE_PREFIX_CHARS: usize = 150;

/// Normalized signatures at or below this length are noise (near-empty or
/// garbled extraction), never a notifiable review.
pub const NOISE_FLOOR_CHARS: usize = 5;

/// Raw-text prefix included in the notification message body.
pub const MESSAGE_PREFIX_CHARS: usize = 200;

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(60);
const RENDER_SETTLE: Duration = Duration::from_secs(5);
const CONSENT_SETTLE: Duration = Duration::from_secs(3);
const MENU_SETTLE: Duration = Duration::from_secs(2);

/// Terminal classification of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A genuinely new review was seen; the notifier was invoked and the
    /// signature persisted.
    New { preview: String },
    /// Same review as last run (or a sub-threshold extraction).
    Duplicate,
    /// No review nodes found on the page.
    Empty,
}

/// What one run observed and decided.
#[derive(Debug)]
pub struct CheckReport {
    pub outcome: Outcome,
    pub review_count: usize,
    pub sort_applied: bool,
    pub captured_at: DateTime<Utc>,
}

/// The raw extraction of one run. Lives only until classification.
struct ReviewObservation {
    raw_text: String,
    captured_at: DateTime<Utc>,
}

/// Run one poll against the target page.
///
/// The session is closed on every exit path, including the fatal
/// navigation-failure one.
pub async fn run(
    page: &dyn PageSession,
    notifier: &dyn Notifier,
    store: &SignatureStore,
    target_url: &str,
) -> Result<CheckReport> {
    let result = drive(page, notifier, store, target_url).await;
    if let Err(e) = page.close().await {
        warn!(error = %e, "Failed to close the page session");
    }
    result
}

async fn drive(
    page: &dyn PageSession,
    notifier: &dyn Notifier,
    store: &SignatureStore,
    target_url: &str,
) -> Result<CheckReport> {
    // 1. Navigation, the one fatal step. No state is touched on abort.
    info!(url = target_url, "Loading target page");
    page.goto(target_url, PAGE_LOAD_TIMEOUT)
        .await
        .context("Could not load the target page")?;
    page.settle(RENDER_SETTLE).await;

    // 2. Consent popup, when the session lands on one.
    if let Some(button) = selector::resolve(page, &targets::CONSENT_BUTTON).await {
        info!("Dismissing consent popup");
        match page.click(&button).await {
            Ok(()) => page.settle(CONSENT_SETTLE).await,
            Err(e) => warn!(error = %e, "Failed to dismiss consent popup"),
        }
    }

    // 3. Reviews tab. Some page variants land directly on the reviews
    // section, so an unresolved tab is not a failure.
    match selector::resolve(page, &targets::REVIEWS_TAB).await {
        Some(tab) => match page.click(&tab).await {
            Ok(()) => {
                info!("Opened the reviews tab");
                page.settle(RENDER_SETTLE).await;
            }
            Err(e) => warn!(error = %e, "Failed to open the reviews tab, continuing"),
        },
        None => info!("No reviews tab found, assuming reviews are already visible"),
    }

    // 4. Newest-first ordering, best effort.
    let sort_applied = apply_sort(page).await;
    page.settle(RENDER_SETTLE).await;

    // 5. Extraction.
    let reviews = selector::resolve_all(page, &targets::REVIEW_NODES).await;
    let captured_at = Utc::now();
    info!(count = reviews.len(), "Review nodes found");

    let Some(first) = reviews.first() else {
        return Ok(CheckReport {
            outcome: Outcome::Empty,
            review_count: 0,
            sort_applied,
            captured_at,
        });
    };

    let observation = match page.text(first).await {
        Ok(raw_text) => ReviewObservation {
            raw_text,
            captured_at,
        },
        Err(e) => {
            // An unreadable node is indistinguishable from a half-rendered
            // page; treat it like an empty extraction rather than aborting.
            warn!(error = %e, "Could not read the top review node");
            return Ok(CheckReport {
                outcome: Outcome::Empty,
                review_count: reviews.len(),
                sort_applied,
                captured_at,
            });
        }
    };

    // 6. Classification.
    let outcome = classify(notifier, store, &observation).await?;

    Ok(CheckReport {
        outcome,
        review_count: reviews.len(),
        sort_applied,
        captured_at: observation.captured_at,
    })
}

/// Apply the newest-first sort preference. Two page variants exist: one
/// with a sort menu, one with a direct "newest" button. Returns whether
/// either path completed.
async fn apply_sort(page: &dyn PageSession) -> bool {
    // Variant A: sort button opens a menu with a "newest first" entry.
    if let Some(sort) = selector::resolve(page, &targets::SORT_CONTROL).await {
        match page.click(&sort).await {
            Ok(()) => {
                page.settle(MENU_SETTLE).await;
                if let Some(option) = selector::resolve(page, &targets::NEWEST_OPTION).await {
                    match page.click(&option).await {
                        Ok(()) => {
                            info!("Sort set to newest-first via the sort menu");
                            return true;
                        }
                        Err(e) => warn!(error = %e, "Failed to select the newest-first option"),
                    }
                } else {
                    warn!("Sort menu opened but no newest-first option found");
                }
            }
            Err(e) => warn!(error = %e, "Failed to open the sort menu"),
        }
    }

    // Variant B: the page exposes a direct "newest" button instead.
    if let Some(button) = selector::resolve(page, &targets::DIRECT_NEWEST_BUTTON).await {
        match page.click(&button).await {
            Ok(()) => {
                info!("Sort set to newest-first via the direct button");
                return true;
            }
            Err(e) => warn!(error = %e, "Failed to click the direct newest button"),
        }
    }

    warn!("Could not apply newest-first sort, using the page's current ordering");
    false
}

/// Compare the extracted text against the stored signature and decide
/// notify-or-not. The signature is persisted after the notification
/// attempt, whether or not delivery succeeded: a lost message must not
/// repeat on every later run.
async fn classify(
    notifier: &dyn Notifier,
    store: &SignatureStore,
    observation: &ReviewObservation,
) -> Result<Outcome> {
    let raw_text = observation.raw_text.as_str();
    let prefix: String = raw_text.chars().take(SIGNATURE_PREFIX_CHARS).collect();
    let signature = normalize(&prefix);
    let last = store.load()?;

    if signature == last {
        info!("Top review unchanged");
        return Ok(Outcome::Duplicate);
    }

    if signature.chars().count() <= NOISE_FLOOR_CHARS {
        warn!(
            chars = signature.chars().count(),
            "Extraction below the noise floor, ignoring"
        );
        return Ok(Outcome::Duplicate);
    }

    info!("New review detected, notifying");
    let body: String = raw_text.chars().take(MESSAGE_PREFIX_CHARS).collect();
    let message = format!("【新しいクチコミ】\n{body}...");
    if let Err(e) = notifier.notify(&message).await {
        warn!(error = %e, "Notification failed (will not retry)");
    }
    store.save(&signature)?;

    Ok(Outcome::New {
        preview: preview(raw_text),
    })
}

/// Single-line preview of a review for terminal output.
fn preview(text: &str) -> String {
    let flat: String = text
        .chars()
        .take(50)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    if text.chars().count() > 50 {
        format!("{flat}...")
    } else {
        flat
    }
}
