//! SWIFT/BIC code rules shared by the CSV importer and the HTTP create path.
//!
//! A code is 4 letters (bank) + 2 letters (country) + 2 alphanumerics
//! (location) + optionally 3 alphanumerics (branch). Codes ending in
//! `XXX` designate a headquarter; the first 8 characters form the key
//! that links branches to their headquarter.

use std::sync::LazyLock;

use regex::Regex;

/// Suffix that marks a headquarter code.
pub const HEADQUARTER_SUFFIX: &str = "XXX";

/// Length of the bank + country + location prefix shared by a headquarter
/// and its branches.
pub const HEADQUARTER_KEY_LEN: usize = 8;

pub const MIN_CODE_LEN: usize = 8;
pub const MAX_CODE_LEN: usize = 11;

/// Placeholder stored when a record arrives without an address.
pub const UNKNOWN_ADDRESS: &str = "UNKNOWN";

static SWIFT_CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{4}[A-Z]{2}[A-Z0-9]{2}([A-Z0-9]{3})?$").unwrap()
});

static COUNTRY_ISO2_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").unwrap());

/// Trim and uppercase a SWIFT code.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Trim and uppercase an ISO2 country code.
pub fn normalize_country(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Empty addresses become [`UNKNOWN_ADDRESS`].
pub fn normalize_address(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_ADDRESS.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Length is measured in characters so multi-byte input is rejected by
/// the pattern rather than miscounted.
pub fn has_valid_code_length(code: &str) -> bool {
    (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.chars().count())
}

/// Structural check on an already-normalized code.
pub fn is_valid_swift_code(code: &str) -> bool {
    has_valid_code_length(code) && SWIFT_CODE_PATTERN.is_match(code)
}

/// Exactly two uppercase ASCII letters.
pub fn is_valid_country_iso2(country: &str) -> bool {
    COUNTRY_ISO2_PATTERN.is_match(country)
}

pub fn is_headquarter_code(code: &str) -> bool {
    code.ends_with(HEADQUARTER_SUFFIX)
}

/// First 8 characters of the code, or `None` when it is shorter.
pub fn headquarter_key(code: &str) -> Option<&str> {
    code.get(..HEADQUARTER_KEY_LEN)
}

/// The headquarter code a branch would link to (`key + "XXX"`).
pub fn headquarter_code_for(code: &str) -> Option<String> {
    headquarter_key(code).map(|key| format!("{key}{HEADQUARTER_SUFFIX}"))
}
