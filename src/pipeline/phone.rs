//! Phone normalization and mobile/landline classification.
//!
//! ## Normalization
//!
//! OCR output for a phone line is messy: separators, parentheses, the odd
//! letter the model mistook for a digit. [`normalize`] repairs the common
//! glyph confusions (`O`→`0`, `l`/`I`→`1`), strips everything that is not a
//! digit, keeps a single leading `+`, and rewrites a leading `00`
//! international prefix to `+`. Candidates with fewer digits than the
//! configured minimum are rejected as implausible — postcodes, street
//! numbers, and extensions all fall below 7 digits far more often than real
//! numbers do.
//!
//! ## Classification
//!
//! [`classify`] is an ordered table of per-country heuristics followed by a
//! generic fallback. These rules are deliberately approximate: they match
//! national numbering-plan conventions closely enough to route a number into
//! the right bucket on a card, without pretending to be an authoritative
//! numbering database. Misclassification of exotic ranges is expected and
//! tolerated downstream.
//!
//! Both functions are pure; every rule is testable against a fixed table of
//! `(input, expected)` pairs.

use crate::contact::PhoneKind;

/// Default minimum digit count used by [`normalize_default`].
pub const DEFAULT_MIN_DIGITS: usize = 7;

/// Canonicalize a raw phone candidate.
///
/// Returns digits with an optional leading `+`, or `None` when the candidate
/// has fewer than `min_digits` digits after cleaning. Never errors: an
/// implausible candidate is "not a phone number", not a failure.
///
/// Normalizing an already-normalized number is a no-op.
pub fn normalize(raw: &str, min_digits: usize) -> Option<String> {
    let mut digits = String::with_capacity(raw.len());
    let mut plus = false;

    for (i, ch) in raw.trim().char_indices() {
        match ch {
            '0'..='9' => digits.push(ch),
            // Common OCR glyph confusions inside digit runs.
            'O' | 'o' => digits.push('0'),
            'l' | 'I' => digits.push('1'),
            '+' if i == 0 => plus = true,
            _ => {}
        }
    }

    // "00" is the ITU international call prefix; rewrite to "+".
    if !plus && digits.starts_with("00") {
        plus = true;
        digits.drain(..2);
    }

    if digits.len() < min_digits {
        return None;
    }

    Some(if plus { format!("+{digits}") } else { digits })
}

/// [`normalize`] with the default 7-digit plausibility floor.
pub fn normalize_default(raw: &str) -> Option<String> {
    normalize(raw, DEFAULT_MIN_DIGITS)
}

/// Per-country classification rule: country-code prefix plus a classifier
/// over the national (post-prefix) digits.
///
/// The table is ordered and scanned first-match; extending coverage to a new
/// country means adding one entry, not touching control flow.
static COUNTRY_RULES: &[(&str, fn(&str) -> PhoneKind)] = &[
    ("+91", classify_india),
    ("+44", classify_uk),
    ("+49", classify_germany),
];

/// Classify a normalized number as mobile or landline.
///
/// Pure function of the normalized string; the same input always yields the
/// same class.
pub fn classify(normalized: &str) -> PhoneKind {
    for (prefix, rule) in COUNTRY_RULES {
        if let Some(national) = normalized.strip_prefix(prefix) {
            return rule(national);
        }
    }
    classify_generic(normalized)
}

/// India: subscriber numbers are 10 digits and mobiles start 6–9.
fn classify_india(national: &str) -> PhoneKind {
    let last10 = &national[national.len().saturating_sub(10)..];
    if last10.len() == 10 && matches!(last10.as_bytes()[0], b'6'..=b'9') {
        PhoneKind::Mobile
    } else {
        PhoneKind::Landline
    }
}

/// United Kingdom: mobiles are the 07xxx range, so after +44 the first
/// significant digit of the subscriber number is 7.
fn classify_uk(national: &str) -> PhoneKind {
    match national.trim_start_matches('0').as_bytes().first() {
        Some(b'7') => PhoneKind::Mobile,
        _ => PhoneKind::Landline,
    }
}

/// Germany: mobile blocks are 15x/16x/17x.
fn classify_germany(national: &str) -> PhoneKind {
    let sig = national.trim_start_matches('0');
    if ["15", "16", "17"].iter().any(|p| sig.starts_with(p)) {
        PhoneKind::Mobile
    } else {
        PhoneKind::Landline
    }
}

/// Generic fallback for countries without a dedicated rule.
///
/// International numbers (leading `+`) default to mobile — a QR or card
/// rarely prints an international landline. A bare digit string longer than
/// 10 carries an embedded country code and gets the same default; a 10-digit
/// domestic number is mobile iff it starts 6–9; anything else is a landline.
fn classify_generic(normalized: &str) -> PhoneKind {
    if normalized.starts_with('+') {
        return PhoneKind::Mobile;
    }
    let digits = normalized.as_bytes();
    match digits.len() {
        11.. => PhoneKind::Mobile,
        10 if matches!(digits[0], b'6'..=b'9') => PhoneKind::Mobile,
        _ => PhoneKind::Landline,
    }
}
