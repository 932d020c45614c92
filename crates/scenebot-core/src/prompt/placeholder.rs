//! Placeholder extraction for prompt templates.
//!
//! A placeholder is any `{name}` slot in a template. Matching is non-greedy and
//! does not nest: in `{a{b}}` only `b` is a placeholder.

use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+?)\}").expect("placeholder pattern is valid"));

/// The compiled placeholder pattern. Capture group 1 is the slot name.
pub(crate) fn pattern() -> &'static Regex {
    &PLACEHOLDER
}

/// Placeholder names in order of first appearance, without duplicates.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
