//! Machine-code payload classification: vCard, MeCard, URL, or opaque text.
//!
//! A QR code on a business card usually carries one of four things: a full
//! vCard, the more compact MeCard encoding, a bare website URL, or free text
//! that may still contain a phone number or `mailto:` link. [`decode_payload`]
//! classifies a decoded payload string into the [`MachineCode`] variants and,
//! for contact-bearing payloads, extracts a [`PartialContact`].
//!
//! Classification is best-effort and never fails: a payload that *looks*
//! like contact data but yields no usable field degrades to
//! [`MachineCode::Text`] rather than erroring. Malformed lines inside a
//! vCard are skipped, not fatal — QR encoders in the wild are sloppy about
//! the spec and punishing that loses real contacts.

use crate::contact::{non_empty, MachineCode, PartialContact};
use crate::pipeline::phone;
use once_cell::sync::Lazy;
use regex::Regex;

/// Whole payload is an absolute HTTP(S) URL.
static RE_ABSOLUTE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://\S+$").unwrap());

/// Standard local@domain email shape.
static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

/// Generic scheme-prefixed URL anywhere in free text.
static RE_ANY_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[a-z][a-z0-9+.-]*://[^\s<>]+").unwrap());

/// International-aware digit grouping: optional `+`, then digits with
/// separator noise (spaces only, never newlines), at least 7 characters
/// long end to end.
static RE_PHONE_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d ().\-]{5,}\d").unwrap());

/// `tel:` URI with its dialable part.
static RE_TEL_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)tel:([+0-9().\- ]+)").unwrap());

/// `mailto:` URI with its address part.
static RE_MAILTO_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)mailto:([^\s?]+)").unwrap());

/// Classify one decoded QR/barcode payload.
///
/// `min_phone_digits` is the plausibility floor forwarded to the phone
/// normalizer (see [`crate::config::EngineConfig::min_phone_digits`]).
pub fn decode_payload(raw: &str, min_phone_digits: usize) -> MachineCode {
    let trimmed = raw.trim();

    if starts_with_ignore_case(trimmed, "BEGIN:VCARD") {
        return contact_or_text(parse_vcard(trimmed, min_phone_digits), raw);
    }
    if starts_with_ignore_case(trimmed, "MECARD:") {
        return contact_or_text(parse_mecard(trimmed, min_phone_digits), raw);
    }
    if RE_ABSOLUTE_URL.is_match(trimmed) {
        return MachineCode::Url {
            url: trimmed.to_string(),
        };
    }

    let suspected = RE_TEL_SCHEME.is_match(trimmed)
        || RE_MAILTO_SCHEME.is_match(trimmed)
        || RE_PHONE_CANDIDATE.is_match(trimmed);
    if suspected {
        return contact_or_text(extract_freeform(trimmed, min_phone_digits), raw);
    }

    MachineCode::Text {
        raw: raw.to_string(),
    }
}

/// The structured format a payload announces via its prefix, if any.
///
/// Lets the batch layer report a vCard/MeCard payload that parsed to
/// nothing; the decoder itself still degrades such payloads to `Text`.
pub(crate) fn announced_format(raw: &str) -> Option<&'static str> {
    let trimmed = raw.trim();
    if starts_with_ignore_case(trimmed, "BEGIN:VCARD") {
        Some("vCard")
    } else if starts_with_ignore_case(trimmed, "MECARD:") {
        Some("MeCard")
    } else {
        None
    }
}

/// A suspected contact payload that produced nothing degrades to `Text`.
fn contact_or_text(extracted: PartialContact, raw: &str) -> MachineCode {
    if extracted.is_empty() {
        MachineCode::Text {
            raw: raw.to_string(),
        }
    } else {
        MachineCode::Contact { extracted }
    }
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

// ── vCard ────────────────────────────────────────────────────────────────

/// Parse a `BEGIN:VCARD` payload into a partial contact.
///
/// Handles line unfolding, parameterised properties (`TEL;TYPE=CELL:`), the
/// `N` structured-name fallback when `FN` is absent, and vCard escape
/// sequences. Unknown properties are ignored.
fn parse_vcard(raw: &str, min_phone_digits: usize) -> PartialContact {
    let mut out = PartialContact::default();
    let mut structured_name: Option<String> = None;

    for line in unfold_lines(raw) {
        let Some((lhs, value)) = line.split_once(':') else {
            continue;
        };
        // Property name precedes any ;-separated parameters.
        let prop = lhs.split(';').next().unwrap_or("").trim().to_ascii_uppercase();

        match prop.as_str() {
            "FN" => {
                if out.name.is_none() {
                    out.name = non_empty(unescape(value));
                }
            }
            "N" => {
                if structured_name.is_none() {
                    structured_name = assemble_structured_name(value);
                }
            }
            "ORG" => {
                if out.company.is_none() {
                    // First component is the organisation; the rest are units.
                    let org = split_unescaped(value, ';')
                        .into_iter()
                        .next()
                        .unwrap_or_default();
                    out.company = non_empty(org);
                }
            }
            "EMAIL" => {
                if out.email.is_none() {
                    out.email = non_empty(unescape(value).to_lowercase());
                }
            }
            "TEL" => {
                if let Some(n) = phone::normalize(&unescape(value), min_phone_digits) {
                    if !out.phones.contains(&n) {
                        out.phones.push(n);
                    }
                }
            }
            "URL" => {
                if out.website.is_none() {
                    out.website = non_empty(unescape(value));
                }
            }
            "ADR" => {
                if out.address.is_none() {
                    let joined = split_unescaped(value, ';')
                        .into_iter()
                        .filter(|c| !c.trim().is_empty())
                        .map(|c| c.trim().to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    out.address = non_empty(joined);
                }
            }
            "TITLE" | "ROLE" | "NOTE" => {
                if out.services.is_none() {
                    out.services = non_empty(unescape(value));
                }
            }
            _ => {}
        }
    }

    if out.name.is_none() {
        out.name = structured_name;
    }
    out
}

/// Rebuild a display name from the `N` property
/// (`Family;Given;Additional;Prefix;Suffix`).
fn assemble_structured_name(value: &str) -> Option<String> {
    let parts = split_unescaped(value, ';');
    let component = |i: usize| parts.get(i).map(String::as_str).unwrap_or("").trim();
    let ordered = [
        component(3), // prefix
        component(1), // given
        component(2), // additional
        component(0), // family
        component(4), // suffix
    ];
    let name = ordered
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(name)
}

/// Join folded continuation lines (RFC 2426: a line starting with SPACE or
/// HTAB continues the previous line).
fn unfold_lines(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix(' ').or_else(|| line.strip_prefix('\t')) {
            if let Some(prev) = lines.last_mut() {
                prev.push_str(rest);
                continue;
            }
        }
        lines.push(line.to_string());
    }
    lines
}

/// Split on an unescaped separator, decoding escapes in each piece.
fn split_unescaped(value: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') | Some('N') => current.push('\n'),
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            }
        } else if ch == sep {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);
    parts
}

/// Decode the vCard escape sequences `\n`, `\,`, `\;`, `\\`.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') | Some('N') => out.push('\n'),
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

// ── MeCard ───────────────────────────────────────────────────────────────

/// Parse a `MECARD:` payload (`KEY:value;` pairs terminated by `;;`).
fn parse_mecard(raw: &str, min_phone_digits: usize) -> PartialContact {
    let mut out = PartialContact::default();
    let body = &raw[raw.find(':').map(|i| i + 1).unwrap_or(0)..];

    for field in split_unescaped(body, ';') {
        let Some((key, value)) = field.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_uppercase().as_str() {
            "N" => {
                if out.name.is_none() {
                    // MeCard N is "lastname,firstname"; display order reverses it.
                    let mut parts = value.splitn(2, ',').map(str::trim);
                    let last = parts.next().unwrap_or("");
                    let first = parts.next().unwrap_or("");
                    let display = [first, last]
                        .iter()
                        .filter(|p| !p.is_empty())
                        .copied()
                        .collect::<Vec<_>>()
                        .join(" ");
                    out.name = non_empty(display);
                }
            }
            "ORG" => {
                if out.company.is_none() {
                    out.company = non_empty(value);
                }
            }
            "EMAIL" => {
                if out.email.is_none() {
                    out.email = non_empty(value.to_lowercase());
                }
            }
            "TEL" => {
                if let Some(n) = phone::normalize(value, min_phone_digits) {
                    if !out.phones.contains(&n) {
                        out.phones.push(n);
                    }
                }
            }
            "URL" => {
                if out.website.is_none() {
                    out.website = non_empty(value);
                }
            }
            "ADR" => {
                if out.address.is_none() {
                    out.address = non_empty(value);
                }
            }
            "NOTE" => {
                if out.services.is_none() {
                    out.services = non_empty(value);
                }
            }
            _ => {}
        }
    }
    out
}

// ── Free text ────────────────────────────────────────────────────────────

/// Best-effort extraction from a payload that only *looks* contact-like:
/// `tel:`/`mailto:` schemes, a bare phone grouping, an email, a URL.
fn extract_freeform(raw: &str, min_phone_digits: usize) -> PartialContact {
    let mut out = PartialContact::default();

    for caps in RE_TEL_SCHEME.captures_iter(raw) {
        if let Some(n) = phone::normalize(&caps[1], min_phone_digits) {
            if !out.phones.contains(&n) {
                out.phones.push(n);
            }
        }
    }
    for m in RE_PHONE_CANDIDATE.find_iter(raw) {
        if let Some(n) = phone::normalize(m.as_str(), min_phone_digits) {
            if !out.phones.contains(&n) {
                out.phones.push(n);
            }
        }
    }

    out.email = RE_MAILTO_SCHEME
        .captures(raw)
        .map(|caps| caps[1].to_lowercase())
        .or_else(|| RE_EMAIL.find(raw).map(|m| m.as_str().to_lowercase()))
        .and_then(non_empty);

    out.website = RE_ANY_URL
        .find(raw)
        .map(|m| m.as_str())
        .filter(|u| {
            let lower = u.to_ascii_lowercase();
            !lower.starts_with("tel:") && !lower.starts_with("mailto:")
        })
        .and_then(non_empty);

    out
}
