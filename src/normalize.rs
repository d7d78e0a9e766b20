// Review text normalization: strips the volatile timestamp phrasing.
//
// Raw review text embeds a relative timestamp ("3 時間前", "2 days ago")
// that changes between polling runs even when the review itself hasn't.
// Stripping those phrases, plus all whitespace, is what makes the stored
// signature stable across runs. Google Maps serves the page in either
// Japanese or English depending on the session, so both locales are
// stripped.

use std::sync::OnceLock;

use regex_lite::Regex;

// The character class lists the ideographic space (U+3000) explicitly
// because regex-lite's \s is ASCII-only.
const WS: &str = r"[\s　]";

fn relative_time_ja() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"\d+{WS}*(分|時間|日|週間|か?ヶ?月|年)前")).expect("valid pattern")
    })
}

fn relative_time_en() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\d+{WS}*(minute|hour|day|week|month|year)s?{WS}+ago"
        ))
        .expect("valid pattern")
    })
}

fn relative_day_ja() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"新規|先月|先週|昨日|今日").expect("valid pattern"))
}

fn relative_day_en() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b(new|last{WS}+month|last{WS}+week|yesterday|today)\b"
        ))
        .expect("valid pattern")
    })
}

/// Normalize raw review text into a comparison-stable signature candidate.
///
/// Removes relative-time phrases ("5 分前", "3 hours ago"), bare
/// relative-day tokens ("新規", "昨日", "yesterday"), and every whitespace
/// character. Pure and total: the regexes are compiled once and infallible,
/// so the worst case is the whitespace-stripped original. Idempotent; the
/// output contains nothing left for a second pass to remove.
pub fn normalize(text: &str) -> String {
    let stripped = relative_time_ja().replace_all(text, "");
    let stripped = relative_time_en().replace_all(&stripped, "");
    let stripped = relative_day_ja().replace_all(&stripped, "");
    let stripped = relative_day_en().replace_all(&stripped, "");
    stripped.chars().filter(|c| !c.is_whitespace()).collect()
}
