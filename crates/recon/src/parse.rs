//! Heuristic field extraction from flat document text.
//!
//! Both parsers are pure: text in, value out. Neither can fail; a document
//! the heuristics do not understand simply yields nothing useful.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// `$`, optional whitespace, digits with optional thousands separators and an
/// optional decimal fraction.
static DOLLAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([0-9,]+(?:\.[0-9]+)?)").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A labelled section followed by 100..=1000 characters of narrative.
static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(
        r"(?:Description|Summary|Justification|Project Overview)[:\n]\s*(.{100,1000}?)(?:\n[A-Z]|$)",
    )
    .case_insensitive(true)
    // The bounded Unicode repetition needs more room than the default limit.
    .size_limit(64 * (1 << 20))
    .build()
    .unwrap()
});

const FALLBACK_CHARS: usize = 500;
const ELLIPSIS: &str = "...";

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// Which dollar figure to take when a document mentions several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountStrategy {
    /// The first figure in reading order.
    #[default]
    First,
    /// The numerically largest figure; earliest wins on ties.
    Largest,
}

/// First dollar figure in `text`, as matched (separators kept, no `$`).
///
/// This is a plausible candidate, not a verified total: a line item that
/// appears before the request total wins.
pub fn parse_amount(text: &str) -> Option<String> {
    parse_amount_with(text, AmountStrategy::First)
}

pub fn parse_amount_with(text: &str, strategy: AmountStrategy) -> Option<String> {
    let mut candidates = DOLLAR_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str());

    match strategy {
        AmountStrategy::First => candidates.next().map(str::to_string),
        AmountStrategy::Largest => {
            let mut best: Option<(&str, f64)> = None;
            for token in candidates {
                let Some(value) = amount_value(token) else {
                    continue;
                };
                if best.map_or(true, |(_, b)| value > b) {
                    best = Some((token, value));
                }
            }
            best.map(|(token, _)| token.to_string())
        }
    }
}

/// Numeric value of a matched token: `$` and `,` stripped, then parsed.
pub fn amount_value(token: &str) -> Option<f64> {
    let cleaned: String = token
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Description
// ---------------------------------------------------------------------------

/// Collapse every whitespace run to one space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// The narrative following a Description/Summary/Justification/Project
/// Overview label, or the first 500 characters of the document.
///
/// The search runs over whitespace-normalized text, so a labelled section
/// only matches when 100..=1000 characters remain after the label.
pub fn parse_description(text: &str) -> String {
    let clean = normalize_whitespace(text);

    if let Some(section) = SECTION_RE.captures(&clean).and_then(|caps| caps.get(1)) {
        return section.as_str().trim().to_string();
    }

    match clean.char_indices().nth(FALLBACK_CHARS) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &clean[..cut]),
        None => clean,
    }
}

/// Leading `n` characters of `s` (fewer when `s` is shorter).
pub fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((cut, _)) => &s[..cut],
        None => s,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
