// Selector resolution cascade: ordered-fallback lookup of UI targets.
//
// The target page ships two structurally different UI variants and two
// locales, and parts of its markup are randomized per render. Instead of
// bespoke try/fallback code at every step, each named target carries an
// ordered list of candidate strategies; resolution walks the list and
// commits to the first candidate that matches anything.

use tracing::{debug, warn};

use crate::session::{ElementId, Locator, PageSession};

/// How a candidate pattern is matched against the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// CSS selector, typically on a stable attribute (`button[aria-label*=…]`).
    Attribute,
    /// Visible-text containment on clickable elements (buttons and menu
    /// items), lowered to an XPath union.
    Text,
    /// ARIA role name, lowered to `[role="…"]`.
    Role,
    /// Partial link text, using the driver's native link-text strategy.
    LinkText,
}

/// One concrete way of locating a named UI target.
#[derive(Debug, Clone, Copy)]
pub struct SelectorCandidate {
    pub strategy: Strategy,
    pub pattern: &'static str,
}

impl SelectorCandidate {
    /// Lower to a WebDriver-level locator.
    pub fn to_locator(&self) -> Locator {
        match self.strategy {
            Strategy::Attribute => Locator {
                using: "css selector",
                value: self.pattern.to_string(),
            },
            Strategy::Text => Locator {
                using: "xpath",
                value: format!(
                    "//button[contains(normalize-space(.), \"{p}\")] \
                     | //*[@role=\"menuitemradio\" or @role=\"menuitem\"]\
                     [contains(normalize-space(.), \"{p}\")]",
                    p = self.pattern
                ),
            },
            Strategy::Role => Locator {
                using: "css selector",
                value: format!("[role=\"{}\"]", self.pattern),
            },
            Strategy::LinkText => Locator {
                using: "partial link text",
                value: self.pattern.to_string(),
            },
        }
    }
}

/// A named UI target and its fallback chain.
pub struct Target {
    pub name: &'static str,
    pub candidates: &'static [SelectorCandidate],
}

/// Resolve a target to a single element: the first match, in document
/// order, of the first candidate that matches anything. Later candidates
/// are never consulted once one succeeds. Returns `None` when nothing on
/// the page matches — callers treat that as "skip this step".
///
/// A candidate whose query errors out is logged and skipped; a broken
/// lookup must not abort the run.
pub async fn resolve(page: &dyn PageSession, target: &Target) -> Option<ElementId> {
    resolve_all(page, target).await.into_iter().next()
}

/// Like `resolve`, but returns every element the winning candidate
/// matched. Used for the review-node query, where the caller wants the
/// count as well as the first element.
pub async fn resolve_all(page: &dyn PageSession, target: &Target) -> Vec<ElementId> {
    for candidate in target.candidates {
        match page.find_all(&candidate.to_locator()).await {
            Ok(found) if !found.is_empty() => {
                debug!(
                    target = target.name,
                    strategy = ?candidate.strategy,
                    pattern = candidate.pattern,
                    matches = found.len(),
                    "Target resolved"
                );
                return found;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!(
                    target = target.name,
                    pattern = candidate.pattern,
                    error = %e,
                    "Candidate query failed, trying next"
                );
                continue;
            }
        }
    }
    debug!(target = target.name, "No candidate matched");
    Vec::new()
}

/// Static target definitions for the map-listing page. Patterns cover both
/// the Japanese and English renderings.
pub mod targets {
    use super::{SelectorCandidate, Strategy, Target};

    /// The cookie-consent button that sometimes covers the page on first load.
    pub static CONSENT_BUTTON: Target = Target {
        name: "consent button",
        candidates: &[
            SelectorCandidate {
                strategy: Strategy::Text,
                pattern: "すべて同意",
            },
            SelectorCandidate {
                strategy: Strategy::Text,
                pattern: "Accept all",
            },
        ],
    };

    /// Tab that switches the listing to its reviews section.
    pub static REVIEWS_TAB: Target = Target {
        name: "reviews tab",
        candidates: &[
            SelectorCandidate {
                strategy: Strategy::Attribute,
                pattern: "button[aria-label*=\"クチコミ\"]",
            },
            SelectorCandidate {
                strategy: Strategy::Attribute,
                pattern: "button[aria-label*=\"Reviews\"]",
            },
            SelectorCandidate {
                strategy: Strategy::Text,
                pattern: "クチコミ",
            },
            SelectorCandidate {
                strategy: Strategy::Text,
                pattern: "Reviews",
            },
            SelectorCandidate {
                strategy: Strategy::LinkText,
                pattern: "クチコミ",
            },
            SelectorCandidate {
                strategy: Strategy::LinkText,
                pattern: "Reviews",
            },
        ],
    };

    /// Button that opens the sort menu (newer page variant).
    pub static SORT_CONTROL: Target = Target {
        name: "sort control",
        candidates: &[
            SelectorCandidate {
                strategy: Strategy::Attribute,
                pattern: "button[aria-label*=\"並べ替え\"]",
            },
            SelectorCandidate {
                strategy: Strategy::Attribute,
                pattern: "button[aria-label*=\"Sort\"]",
            },
            SelectorCandidate {
                strategy: Strategy::Text,
                pattern: "並べ替え",
            },
        ],
    };

    /// "Newest first" entry inside the opened sort menu. The bare role
    /// fallback selects the menu's current (default) entry, which leaves
    /// the ordering unchanged when neither text variant matches.
    pub static NEWEST_OPTION: Target = Target {
        name: "newest-first option",
        candidates: &[
            SelectorCandidate {
                strategy: Strategy::Text,
                pattern: "新しい順",
            },
            SelectorCandidate {
                strategy: Strategy::Text,
                pattern: "Newest",
            },
            SelectorCandidate {
                strategy: Strategy::Role,
                pattern: "menuitemradio",
            },
        ],
    };

    /// Direct "newest" button (older page variant without a sort menu).
    pub static DIRECT_NEWEST_BUTTON: Target = Target {
        name: "direct newest button",
        candidates: &[
            SelectorCandidate {
                strategy: Strategy::Text,
                pattern: "最新",
            },
            SelectorCandidate {
                strategy: Strategy::Text,
                pattern: "新しい順",
            },
            SelectorCandidate {
                strategy: Strategy::Text,
                pattern: "Newest",
            },
        ],
    };

    /// Review container nodes. `data-review-id` has survived every layout
    /// shuffle so far, so a single candidate suffices.
    pub static REVIEW_NODES: Target = Target {
        name: "review nodes",
        candidates: &[SelectorCandidate {
            strategy: Strategy::Attribute,
            pattern: "div[data-review-id]",
        }],
    };
}
