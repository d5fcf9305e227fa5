//! Regex helpers for scraping Jenkins HTML pages.
//!
//! Jenkins exposes several settings (system properties, security realm,
//! mailer configuration) only through rendered pages, so collectors fall
//! back to pattern matching on the raw markup.

use regex::{Regex, RegexBuilder};

/// Value returned when a property cannot be found on a page.
pub const UNKNOWN: &str = "Unknown";

const HIDDEN_VALUE: &str = "Hidden value, click to show this value";

/// Compile a literal regex once and hand out a `&'static Regex`.
macro_rules! static_regex {
    ($pattern:expr) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($pattern).expect("failed to compile static regex"))
    }};
}

pub(crate) use static_regex;

/// Remove every `<...>` tag from a fragment.
pub fn strip_tags(fragment: &str) -> String {
    static_regex!(r"<[^>]+>")
        .replace_all(fragment, "")
        .into_owned()
}

/// First capture group of `re` in `text`, trimmed.
pub fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Every first capture group of `re` in `text`, trimmed, in document order.
pub fn all_captures(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Extract a `key -> value` property from a Jenkins HTML table.
///
/// Tries, in order, `key</td><td>value</td>`, `key:</td><td>value</td>` and
/// `key:value<`. Tags inside the value are stripped. Values masked by the
/// "Hidden value" toggle resolve to the text that follows the toggle label.
/// Returns [`UNKNOWN`] when the key does not appear or no pattern matches.
pub fn extract_property(html: &str, key: &str) -> String {
    if !html.contains(key) {
        return UNKNOWN.to_string();
    }

    let key = regex::escape(key);
    let patterns = [
        format!(r"{key}</td><td[^>]*>(.*?)</td>"),
        format!(r"{key}:</td><td[^>]*>(.*?)</td>"),
        format!(r"{key}:(.*?)<"),
    ];

    for pattern in &patterns {
        let Ok(re) = RegexBuilder::new(pattern).dot_matches_new_line(true).build() else {
            continue;
        };

        if let Some(raw) = first_capture(&re, html) {
            let value = strip_tags(&raw);
            if let Some((_, after)) = value.split_once(HIDDEN_VALUE) {
                let after = after.trim();
                if !after.is_empty() {
                    return after.to_string();
                }
            }
            return value;
        }
    }

    UNKNOWN.to_string()
}
