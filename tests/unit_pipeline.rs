// Pipeline tests — the whole run driven against a scripted page.
//
// Exercises the classification outcomes end to end: first run, duplicate
// across runs, noise floor, zero reviews, sort fallback, and the
// persist-despite-transport-failure rule. No network, no browser.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::tempdir;

use kuchikomi::normalize::normalize;
use kuchikomi::notify::Notifier;
use kuchikomi::pipeline::check::{self, Outcome};
use kuchikomi::session::{ElementId, Locator, PageSession};
use kuchikomi::signature::SignatureStore;

/// A scripted map-listing page. Serves review nodes, a reviews tab, and
/// (optionally) a sort menu; records clicks and the session teardown.
struct FakeListingPage {
    review_texts: Vec<String>,
    has_sort_menu: bool,
    fail_navigation: bool,
    clicks: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl FakeListingPage {
    fn with_reviews(texts: &[&str]) -> Self {
        Self {
            review_texts: texts.iter().map(|t| t.to_string()).collect(),
            has_sort_menu: true,
            fail_navigation: false,
            clicks: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn without_sort_menu(mut self) -> Self {
        self.has_sort_menu = false;
        self
    }

    fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }
}

#[async_trait]
impl PageSession for FakeListingPage {
    async fn goto(&self, _url: &str, _timeout: Duration) -> Result<()> {
        if self.fail_navigation {
            anyhow::bail!("net::ERR_TIMED_OUT");
        }
        Ok(())
    }

    async fn settle(&self, _wait: Duration) {}

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementId>> {
        let v = &locator.value;
        if v == "div[data-review-id]" {
            return Ok((0..self.review_texts.len())
                .map(|i| ElementId(format!("review-{i}")))
                .collect());
        }
        if v.contains("クチコミ") || v.contains("Reviews") {
            return Ok(vec![ElementId("reviews-tab".to_string())]);
        }
        if self.has_sort_menu {
            if v.contains("並べ替え") || v.contains("Sort") {
                return Ok(vec![ElementId("sort-button".to_string())]);
            }
            if v.contains("新しい順") || v.contains("Newest") || v == "[role=\"menuitemradio\"]" {
                return Ok(vec![ElementId("newest-option".to_string())]);
            }
        }
        Ok(Vec::new())
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.clicks.lock().unwrap().push(element.0.clone());
        Ok(())
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        let index: usize = element
            .0
            .strip_prefix("review-")
            .and_then(|i| i.parse().ok())
            .ok_or_else(|| anyhow::anyhow!("not a review node: {}", element.0))?;
        Ok(self.review_texts[index].clone())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Notifier that records every message.
#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Notifier whose transport always fails.
struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn notify(&self, _message: &str) -> Result<()> {
        anyhow::bail!("503 from the messaging API")
    }
}

fn store_in(dir: &tempfile::TempDir) -> SignatureStore {
    SignatureStore::new(dir.path().join("last_review.txt"))
}

const REVIEW_JA: &str = "ネタが新鮮でとても美味しかったです。店内も清潔でまた行きたいです。 3 時間前";

// ============================================================
// Classification outcomes
// ============================================================

#[tokio::test]
async fn first_run_classifies_as_new_and_notifies_once() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let page = FakeListingPage::with_reviews(&[REVIEW_JA]);
    let notifier = RecordingNotifier::default();

    let report = check::run(&page, &notifier, &store, "https://maps.example/place")
        .await
        .unwrap();

    assert!(matches!(report.outcome, Outcome::New { .. }));
    assert_eq!(report.review_count, 1);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1, "exactly one notification per new review");
    assert!(sent[0].starts_with("【新しいクチコミ】\n"));

    let expected: String = REVIEW_JA.chars().take(150).collect();
    assert_eq!(store.load().unwrap(), normalize(&expected));
}

#[tokio::test]
async fn same_review_with_newer_timestamp_is_duplicate() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);

    let first = FakeListingPage::with_reviews(&[REVIEW_JA]);
    let notifier1 = RecordingNotifier::default();
    check::run(&first, &notifier1, &store, "https://maps.example/place")
        .await
        .unwrap();
    assert_eq!(notifier1.sent().len(), 1);

    // Same review, rendered two hours later.
    let aged = REVIEW_JA.replace("3 時間前", "5 時間前");
    let second = FakeListingPage::with_reviews(&[aged.as_str()]);
    let notifier2 = RecordingNotifier::default();
    let report = check::run(&second, &notifier2, &store, "https://maps.example/place")
        .await
        .unwrap();

    assert!(matches!(report.outcome, Outcome::Duplicate));
    assert_eq!(notifier2.sent().len(), 0, "duplicate must not notify");
}

#[tokio::test]
async fn genuinely_new_review_replaces_the_stored_signature() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    store.save(&normalize("古いレビューの内容です。")).unwrap();

    let page = FakeListingPage::with_reviews(&[REVIEW_JA]);
    let notifier = RecordingNotifier::default();
    let report = check::run(&page, &notifier, &store, "https://maps.example/place")
        .await
        .unwrap();

    assert!(matches!(report.outcome, Outcome::New { .. }));
    assert_eq!(notifier.sent().len(), 1);
    let expected: String = REVIEW_JA.chars().take(150).collect();
    assert_eq!(store.load().unwrap(), normalize(&expected));
}

#[tokio::test]
async fn sub_threshold_extraction_is_noise_not_news() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    // Normalizes to "OK" — two characters, under the floor.
    let page = FakeListingPage::with_reviews(&["OK 1 分前"]);
    let notifier = RecordingNotifier::default();

    let report = check::run(&page, &notifier, &store, "https://maps.example/place")
        .await
        .unwrap();

    assert!(matches!(report.outcome, Outcome::Duplicate));
    assert_eq!(notifier.sent().len(), 0);
    assert_eq!(store.load().unwrap(), "", "noise must not touch stored state");
}

#[tokio::test]
async fn zero_review_nodes_terminates_without_mutation() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    store.save("previoussignature").unwrap();

    let page = FakeListingPage::with_reviews(&[]);
    let notifier = RecordingNotifier::default();
    let report = check::run(&page, &notifier, &store, "https://maps.example/place")
        .await
        .unwrap();

    assert!(matches!(report.outcome, Outcome::Empty));
    assert_eq!(report.review_count, 0);
    assert_eq!(notifier.sent().len(), 0);
    assert_eq!(store.load().unwrap(), "previoussignature");
}

// ============================================================
// Extraction details
// ============================================================

#[tokio::test]
async fn only_the_first_review_in_document_order_is_read() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let page = FakeListingPage::with_reviews(&[REVIEW_JA, "二番目のレビューは読まれません。"]);
    let notifier = RecordingNotifier::default();

    let report = check::run(&page, &notifier, &store, "https://maps.example/place")
        .await
        .unwrap();

    assert_eq!(report.review_count, 2);
    let expected: String = REVIEW_JA.chars().take(150).collect();
    assert_eq!(store.load().unwrap(), normalize(&expected));
}

#[tokio::test]
async fn notification_body_is_bounded_to_200_chars_of_raw_text() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let long_review = "あ".repeat(300);
    let page = FakeListingPage::with_reviews(&[long_review.as_str()]);
    let notifier = RecordingNotifier::default();

    check::run(&page, &notifier, &store, "https://maps.example/place")
        .await
        .unwrap();

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let body = sent[0]
        .strip_prefix("【新しいクチコミ】\n")
        .and_then(|m| m.strip_suffix("..."))
        .expect("message shape");
    assert_eq!(body.chars().count(), 200);
}

// ============================================================
// Degraded pages
// ============================================================

#[tokio::test]
async fn missing_sort_controls_still_classifies() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let page = FakeListingPage::with_reviews(&[REVIEW_JA]).without_sort_menu();
    let notifier = RecordingNotifier::default();

    let report = check::run(&page, &notifier, &store, "https://maps.example/place")
        .await
        .unwrap();

    assert!(!report.sort_applied);
    assert!(matches!(report.outcome, Outcome::New { .. }));
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn sort_menu_path_clicks_the_newest_option() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let page = FakeListingPage::with_reviews(&[REVIEW_JA]);
    let notifier = RecordingNotifier::default();

    let report = check::run(&page, &notifier, &store, "https://maps.example/place")
        .await
        .unwrap();

    assert!(report.sort_applied);
    let clicks = page.clicks.lock().unwrap().clone();
    assert!(clicks.contains(&"sort-button".to_string()));
    assert!(clicks.contains(&"newest-option".to_string()));
}

#[tokio::test]
async fn navigation_failure_aborts_with_no_mutation_but_closes_the_session() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let page = FakeListingPage::with_reviews(&[REVIEW_JA]).failing_navigation();
    let notifier = RecordingNotifier::default();

    let result = check::run(&page, &notifier, &store, "https://maps.example/place").await;

    assert!(result.is_err());
    assert_eq!(notifier.sent().len(), 0);
    assert_eq!(store.load().unwrap(), "");
    assert!(
        page.closed.load(Ordering::SeqCst),
        "session must be released on the fatal path too"
    );
}

// ============================================================
// Transport failure policy
// ============================================================

#[tokio::test]
async fn failed_notification_still_persists_the_signature() {
    let dir = tempdir().unwrap();
    let store = store_in(&dir);
    let page = FakeListingPage::with_reviews(&[REVIEW_JA]);

    let report = check::run(&page, &BrokenNotifier, &store, "https://maps.example/place")
        .await
        .unwrap();

    assert!(matches!(report.outcome, Outcome::New { .. }));
    let expected: String = REVIEW_JA.chars().take(150).collect();
    assert_eq!(
        store.load().unwrap(),
        normalize(&expected),
        "a lost message must not repeat on the next run"
    );
}
