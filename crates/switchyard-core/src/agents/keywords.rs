//! Whole-word keyword matching for the rule tables

use regex::Regex;

/// Case-insensitive matcher for any of `keywords` as whole words.
///
/// A trailing plural `s` is accepted, so `listener` matches "listeners"
/// but `plan` does not match "explanation".
pub(crate) fn keyword_matcher(keywords: &[&str]) -> Regex {
    let alternatives = keywords
        .iter()
        .map(|kw| regex::escape(kw))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})s?\b"))
        .expect("escaped keywords always form a valid pattern")
}
