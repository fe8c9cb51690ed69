//! Canonical forms for address components.
//!
//! Every function here is pure and idempotent, so the same canonical form is
//! produced when a segment is registered and when an address is resolved.

use crate::model::ParityRule;
use crate::Result;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Length of the postal-code prefix stored on a street segment.
pub const POSTAL_PREFIX_LEN: usize = 5;

/// Canonical street name: upper-cased, without diacritics, single-spaced.
///
/// ```
/// use teamroute_core::normalize::normalize_street_name;
/// assert_eq!(normalize_street_name("  Rua   das Flôres "), "RUA DAS FLORES");
/// ```
pub fn normalize_street_name(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    collapse_whitespace(&strip_diacritics(&upper))
}

/// Canonical street type. Known abbreviations map to their full form,
/// anything else is returned trimmed and upper-cased.
pub fn normalize_street_type(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    let canonical = match upper.as_str() {
        "R" | "R." | "RUA" => "RUA",
        "AV" | "AV." | "AVE" | "AVEN" => "AVENIDA",
        "AL" | "AL." => "ALAMEDA",
        "EST" | "EST." => "ESTRADA",
        "PÇ" | "PC" | "PCA" | "PÇA" | "PRAÇA" => "PRACA",
        _ => return upper,
    };
    canonical.to_string()
}

/// Keeps only decimal digits, in order.
pub fn normalize_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// First five digits of a postal code (CEP). Shorter inputs are returned as-is.
pub fn postal_prefix(raw: &str) -> String {
    normalize_digits(raw)
        .chars()
        .take(POSTAL_PREFIX_LEN)
        .collect()
}

/// Canonical city, state or neighborhood.
pub fn normalize_locality(raw: &str) -> String {
    normalize_street_name(raw)
}

/// Parses a parity rule, ignoring case and surrounding whitespace.
pub fn normalize_parity(raw: &str) -> Result<ParityRule> {
    raw.parse()
}

fn strip_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
