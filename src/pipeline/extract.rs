//! Text-entity extraction from vision-model output.
//!
//! Two operating modes, selected by what the upstream vision call returned:
//!
//! * **Structured mode** — the model already answered with a JSON object per
//!   card ([`VisionFields`]). Extraction reduces to field cleaning: trim,
//!   lowercase the email, normalize every phone-like string, drop anything
//!   that cleans to empty. Unknown JSON keys are ignored rather than
//!   trusted.
//!
//! * **Free-text mode** — only a raw recognized-text blob is available.
//!   Email and phones come from regexes over the whole blob; name, company,
//!   services, and address are inferred line-by-line through an explicit
//!   ordered strategy table ([`LINE_STRATEGIES`]). The ordering is greedy
//!   and order-dependent: once a line is claimed for one field it is out of
//!   consideration for all later fields. The heuristics are approximate and
//!   card-domain-specific; this is not a general NER system.

use crate::config::EngineConfig;
use crate::contact::{non_empty, ParsedContact};
use crate::pipeline::phone;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The documented field contract of a structured vision response.
///
/// Every field is optional; absent or unparseable fields are "missing", not
/// malformed input. Both `phone` (single) and `phones` (list) spellings are
/// accepted, since models use either.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisionFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub phones: Option<Vec<String>>,
    #[serde(default)]
    pub services: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub social: Option<String>,
}

/// Standard local@domain email shape.
static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

/// Digit groupings in free text. Spaces only, never newlines, so a phone
/// line cannot swallow the digits of the line below it. Deliberately does
/// not consume a leading `+`: recognized card text turns "+1 415 555 1234"
/// into the bare "14155551234" form.
static RE_PHONE_FREE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d ().\-]{5,}\d").unwrap());

/// Two or three capitalized words: a person-name shape.
static RE_NAME_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z'’.\-]*(?: [A-Z][A-Za-z'’.\-]*){1,2}$").unwrap());

/// Corporate-suffix and industry keywords that mark a company line.
static RE_COMPANY_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(company|corp|corporation|inc|incorporated|ltd|limited|llc|llp|gmbh|",
        r"technologies|technology|tech|solutions|services|consulting|consultants|group|",
        r"holdings|industries|enterprises|agency|studio|studios|labs|partners|ventures|",
        r"systems|software)\b",
    ))
    .unwrap()
});

/// Job-title and service keywords that mark a role/services line.
static RE_TITLE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(manager|director|ceo|cto|cfo|coo|cmo|founder|co-founder|president|",
        r"vice president|vp|chairman|officer|head|lead|principal|senior|junior|engineer|",
        r"developer|designer|architect|consultant|advisor|analyst|specialist|coordinator|",
        r"executive|administrator|accountant|attorney|lawyer|agent|broker|sales|marketing|",
        r"support|photography|photographer|repair|plumbing|catering|landscaping|cleaning)\b",
    ))
    .unwrap()
});

/// Street/suite/zip indicators that mark an address line.
static RE_ADDRESS_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(street|avenue|ave|road|suite|ste|floor|blvd|boulevard|drive|lane|",
        r"plaza|square|building|bldg|tower|unit|room|box)\b",
        r"|\b(st|rd|dr|ln|fl|apt)\.?,",
        r"|\b(st|rd|dr|ln|fl|apt)\.\s",
        r"|\b\d{5}\b",
        r"|,\s*[A-Z]{2}\s+\d{5}",
    ))
    .unwrap()
});

/// Fields the line strategies can claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineField {
    Name,
    Company,
    Services,
    Address,
}

/// How a strategy claims matching lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    /// First matching line wins.
    First,
    /// Every matching line is claimed; values join with ", ".
    Joined,
}

/// One entry of the greedy free-text inference order.
struct LineStrategy {
    field: LineField,
    /// Restrict the scan to the first `config.name_scan_lines` lines.
    header_only: bool,
    claim: Claim,
    matches: fn(&str) -> bool,
}

/// The inference order: name → company → services → address. Each strategy
/// only sees lines no earlier strategy (or the email/phone pre-pass) has
/// claimed. Reordering entries changes extraction behaviour; that is the
/// point of keeping the order in data instead of nested conditionals.
static LINE_STRATEGIES: &[LineStrategy] = &[
    LineStrategy {
        field: LineField::Name,
        header_only: true,
        claim: Claim::First,
        matches: is_name_line,
    },
    LineStrategy {
        field: LineField::Company,
        header_only: false,
        claim: Claim::First,
        matches: is_company_line,
    },
    LineStrategy {
        field: LineField::Services,
        header_only: false,
        claim: Claim::First,
        matches: is_services_line,
    },
    LineStrategy {
        field: LineField::Address,
        header_only: false,
        claim: Claim::Joined,
        matches: is_address_line,
    },
];

fn is_name_line(line: &str) -> bool {
    RE_NAME_SHAPE.is_match(line) && !RE_COMPANY_KEYWORD.is_match(line)
}

fn is_company_line(line: &str) -> bool {
    RE_COMPANY_KEYWORD.is_match(line)
}

fn is_services_line(line: &str) -> bool {
    RE_TITLE_KEYWORD.is_match(line)
}

fn is_address_line(line: &str) -> bool {
    RE_ADDRESS_HINT.is_match(line)
}

/// Clean an already-structured vision response into a card candidate.
pub fn extract_structured(fields: &VisionFields, config: &EngineConfig) -> ParsedContact {
    let mut card = ParsedContact {
        name: fields.name.as_deref().and_then(non_empty),
        company: fields.company.as_deref().and_then(non_empty),
        email: fields
            .email
            .as_deref()
            .map(str::to_lowercase)
            .and_then(non_empty),
        services: fields.services.as_deref().and_then(non_empty),
        address: fields.address.as_deref().and_then(non_empty),
        website: fields.website.as_deref().and_then(non_empty),
        social: fields.social.as_deref().and_then(non_empty),
        ..Default::default()
    };

    let singles = fields.phone.iter();
    let lists = fields.phones.iter().flatten();
    for raw in singles.chain(lists) {
        if let Some(n) = phone::normalize(raw, config.min_phone_digits) {
            let kind = phone::classify(&n);
            card.insert_number(n, kind);
        }
    }

    card
}

/// Infer a card candidate from a raw recognized-text blob.
pub fn extract_free_text(text: &str, config: &EngineConfig) -> ParsedContact {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut card = ParsedContact::default();

    // Email and phones come from the whole blob, not line inference.
    card.email = RE_EMAIL
        .find(text)
        .map(|m| m.as_str().to_lowercase())
        .and_then(non_empty);
    for m in RE_PHONE_FREE.find_iter(text) {
        if let Some(n) = phone::normalize(m.as_str(), config.min_phone_digits) {
            let kind = phone::classify(&n);
            card.insert_number(n, kind);
        }
    }

    // Pre-claim email/phone lines so no field strategy can take them.
    let mut claimed: BTreeSet<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contains('@') || RE_PHONE_FREE.is_match(l))
        .map(|(i, _)| i)
        .collect();

    for strategy in LINE_STRATEGIES {
        let limit = if strategy.header_only {
            config.name_scan_lines.min(lines.len())
        } else {
            lines.len()
        };

        let mut collected: Vec<&str> = Vec::new();
        for (i, line) in lines.iter().enumerate().take(limit) {
            if claimed.contains(&i) || !(strategy.matches)(line) {
                continue;
            }
            claimed.insert(i);
            collected.push(line);
            if strategy.claim == Claim::First {
                break;
            }
        }

        // Company keeps a positional fallback: no keyword hit, but a line
        // distinctly longer than the inferred name is very likely the
        // company banner. It runs here, inside the company slot, so it
        // still takes precedence over the services and address passes.
        // Lines the later strategies would recognize are off limits, or a
        // long title line would be mistaken for the company.
        if strategy.field == LineField::Company && collected.is_empty() {
            if let Some(name_len) = card.name.as_ref().map(|n| n.chars().count()) {
                let fallback = lines.iter().enumerate().find(|(i, l)| {
                    !claimed.contains(i)
                        && l.chars().count() > name_len + 3
                        && !is_services_line(l)
                        && !is_address_line(l)
                });
                if let Some((i, line)) = fallback {
                    claimed.insert(i);
                    collected.push(line);
                }
            }
        }

        if collected.is_empty() {
            continue;
        }
        let value = non_empty(collected.join(", "));
        match strategy.field {
            LineField::Name => card.name = value,
            LineField::Company => card.company = value,
            LineField::Services => card.services = value,
            LineField::Address => card.address = value,
        }
    }

    card
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn free_text_full_card() {
        let text = "ACME CORP\nJohn Smith\nSenior Manager\njohn@acme.com\n\
                    +1 415 555 1234\n123 Main St, Suite 400, SF, CA 94105";
        let card = extract_free_text(text, &config());
        assert_eq!(card.name.as_deref(), Some("John Smith"));
        assert_eq!(card.company.as_deref(), Some("ACME CORP"));
        assert_eq!(card.services.as_deref(), Some("Senior Manager"));
        assert_eq!(card.email.as_deref(), Some("john@acme.com"));
        assert!(
            card.phones.contains("14155551234"),
            "phones: {:?}",
            card.phones
        );
        assert_eq!(
            card.address.as_deref(),
            Some("123 Main St, Suite 400, SF, CA 94105")
        );
    }

    #[test]
    fn name_not_taken_from_email_line() {
        let text = "Jane Roe\njane.roe@example.com";
        let card = extract_free_text(text, &config());
        assert_eq!(card.name.as_deref(), Some("Jane Roe"));
        assert_eq!(card.email.as_deref(), Some("jane.roe@example.com"));
    }

    #[test]
    fn name_scan_respects_header_window() {
        // The only name-shaped line sits on line 6: too far down.
        let text = "one\ntwo\nthree\nfour\nfive\nJohn Smith";
        let card = extract_free_text(text, &config());
        assert_eq!(card.name, None);
    }

    #[test]
    fn company_fallback_uses_longer_line() {
        let text = "John Smith\nWidgets and Gadgets Emporium";
        let card = extract_free_text(text, &config());
        assert_eq!(card.name.as_deref(), Some("John Smith"));
        assert_eq!(
            card.company.as_deref(),
            Some("Widgets and Gadgets Emporium")
        );
    }

    #[test]
    fn company_fallback_requires_a_name() {
        // Without an inferred name there is nothing to compare length
        // against, so the fallback stays quiet and address lines survive.
        let text = "Acme Solutions\n123 Main Street\nSuite 400\nSpringfield, IL 62704";
        let card = extract_free_text(text, &config());
        assert_eq!(card.name, None);
        assert_eq!(card.company.as_deref(), Some("Acme Solutions"));
        assert_eq!(
            card.address.as_deref(),
            Some("123 Main Street, Suite 400, Springfield, IL 62704")
        );
    }

    #[test]
    fn claimed_lines_are_exclusive() {
        // "Acme Group" matches both the company keywords and (shape-wise)
        // a person name; the name strategy must refuse it, the company
        // strategy must claim it exactly once.
        let text = "Acme Group\nJane Roe";
        let card = extract_free_text(text, &config());
        assert_eq!(card.name.as_deref(), Some("Jane Roe"));
        assert_eq!(card.company.as_deref(), Some("Acme Group"));
        assert_eq!(card.services, None);
    }

    #[test]
    fn phone_match_stops_at_line_end() {
        // The digits of an address line must not be glued onto the phone.
        let text = "Jane Roe\n415 555 1234\n94105 Berkeley";
        let card = extract_free_text(text, &config());
        assert!(card.has_number("4155551234"), "got {:?}", card);
    }

    #[test]
    fn structured_cleans_fields() {
        let fields = VisionFields {
            name: Some("  Jane Roe  ".into()),
            email: Some(" Jane@Acme.COM ".into()),
            company: Some("   ".into()),
            phone: Some("+1 (415) 555-1234".into()),
            phones: Some(vec!["0044 20 7946 0958".into(), "bogus".into()]),
            ..Default::default()
        };
        let card = extract_structured(&fields, &config());
        assert_eq!(card.name.as_deref(), Some("Jane Roe"));
        assert_eq!(card.email.as_deref(), Some("jane@acme.com"));
        assert_eq!(card.company, None);
        assert!(card.phones.contains("+14155551234"));
        assert!(card.landlines.contains("+442079460958"));
        assert_eq!(card.phones.len() + card.landlines.len(), 2);
    }

    #[test]
    fn structured_ignores_unknown_keys() {
        let fields: VisionFields =
            serde_json::from_str(r#"{"name":"Jane Roe","confidence":0.93,"bbox":[0,0,10,10]}"#)
                .unwrap();
        assert_eq!(fields.name.as_deref(), Some("Jane Roe"));
    }
}
