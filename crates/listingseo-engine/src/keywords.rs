//! Keyword extraction from listing titles and product text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Default number of keywords kept by [`extract_keywords`].
pub const DEFAULT_KEYWORD_LIMIT: usize = 20;

/// Tokens shorter than this (in characters) are discarded.
pub const MIN_KEYWORD_CHARS: usize = 3;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "these", "those", "your", "you", "our",
    "are", "was", "were", "has", "have", "had", "but", "not", "all", "any", "can", "will", "into",
    "onto", "over", "under", "per", "via", "its", "his", "her", "their", "them", "they", "also",
    "than", "then", "more", "most", "such", "very", "just", "only", "each", "other", "some",
    "what", "which", "when", "where", "who", "how", "why", "about", "after", "before", "while",
    "use", "used", "using", "buy", "online", "india", "pack", "set", "new",
];

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s-]").expect("valid keyword filter regex"));

/// Extract an ordered, deduplicated list of lowercase keywords from `text`.
///
/// Characters other than letters, digits, whitespace and hyphens are deleted
/// in place before splitting on whitespace, so `2.4GHz` becomes `24ghz`. Stopwords and tokens shorter than
/// [`MIN_KEYWORD_CHARS`] are dropped; first-seen order is kept and the result
/// is truncated to `limit`.
#[must_use]
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = DISALLOWED.replace_all(&lowered, "");

    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for raw in cleaned.split_whitespace() {
        if out.len() >= limit {
            break;
        }
        let token = raw.trim_matches('-');
        if token.chars().count() < MIN_KEYWORD_CHARS || STOPWORDS.contains(&token) {
            continue;
        }
        if seen.insert(token.to_string()) {
            out.push(token.to_string());
        }
    }

    out
}

/// Deduplicate case-insensitively, keeping the first spelling of each entry.
/// Blank entries are dropped.
#[must_use]
pub fn dedupe_case_insensitive<I, S>(items: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for item in items {
        if out.len() >= limit {
            break;
        }
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }

    out
}
