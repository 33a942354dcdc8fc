use regex::Regex;
use std::sync::LazyLock;

/// Mobile number: `1` then `3`, `5` or `8` then nine ASCII digits, optionally
/// with the `86` country code in front. `\d` would also accept other Unicode
/// decimal digits.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:1|861)[358][0-9]{9}").expect("phone pattern is valid"));

/// Extract every phone number in `text`, joined with commas in order of
/// appearance. Returns an empty string when nothing matches.
///
/// Matches never overlap. A longer digit run contributes only the first
/// qualifying number; the digits after it are scanned as fresh input.
pub fn extract_phone_numbers(text: &str) -> String {
    PHONE_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
