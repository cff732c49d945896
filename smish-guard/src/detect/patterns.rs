//! Regex-based indicator extraction
//!
//! All detectors run on the original message text: normalization would
//! destroy the punctuation that bounds these patterns.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"']+"#).expect("valid URL regex")
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});

/// The number itself is group 1; the leading group keeps it from starting
/// inside a longer digit run.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\d])((?:\+\d{1,3}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4})\b")
        .expect("valid phone regex")
});

static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b")
        .expect("valid domain regex")
});

/// Punctuation that ends a sentence rather than a URL
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}'];

/// Extract URLs (`http://`, `https://` or `www.` prefixed)
pub fn detect_urls(text: &str) -> Vec<String> {
    unique(
        URL_RE
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(URL_TRAILING))
            .filter(|s| !s.is_empty()),
    )
}

/// Extract email addresses
pub fn detect_emails(text: &str) -> Vec<String> {
    unique(EMAIL_RE.find_iter(text).map(|m| m.as_str()))
}

/// Extract North American style phone numbers, with optional country code
pub fn detect_phone_numbers(text: &str) -> Vec<String> {
    unique(
        PHONE_RE
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim()),
    )
}

/// Extract bare domain names, including hosts inside URLs and emails
///
/// Email local parts (`john.doe@`) and sentences joined without a space
/// (`today.Thanks`) are not domains.
pub fn detect_domains(text: &str) -> Vec<String> {
    let local_parts: Vec<Range<usize>> = EMAIL_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().find('@').map(|at| m.start()..m.start() + at))
        .collect();

    unique(
        DOMAIN_RE
            .find_iter(text)
            .filter(|m| !text[m.end()..].starts_with('@'))
            .filter(|m| !local_parts.iter().any(|local| local.contains(&m.start())))
            .map(|m| m.as_str())
            .filter(|domain| !is_sentence_join(domain)),
    )
}

/// `word.Word`: a capitalized, mixed-case last label
fn is_sentence_join(domain: &str) -> bool {
    let Some(tld) = domain.rsplit('.').next() else {
        return false;
    };
    let mut chars = tld.chars();
    chars.next().is_some_and(char::is_uppercase) && chars.any(char::is_lowercase)
}

/// Drop duplicates, keeping the order of first occurrence
fn unique<'a>(matches: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    matches
        .filter(|m| seen.insert(*m))
        .map(str::to_string)
        .collect()
}
