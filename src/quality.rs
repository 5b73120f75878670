//! Contact completeness scoring.
//!
//! A pure 0–100 score over field presence, with small penalties for fields
//! that are present but suspect (malformed email shape, short address,
//! scheme-less website). Data-quality findings never block a record — they
//! only lower the score and surface as informational issue strings, so a UI
//! can sort "needs review" contacts to the top without the engine dropping
//! anything usable.

use crate::contact::ParsedContact;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

/// Outcome of [`assess_contact_quality`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityReport {
    /// Completeness score, 0–100.
    pub score: u8,
    /// Informational data-quality findings, human-readable.
    pub issues: Vec<String>,
}

/// Completeness score only; see [`assess_contact_quality`] for findings.
pub fn score_contact(contact: &ParsedContact) -> u8 {
    assess_contact_quality(contact).score
}

/// Score a contact and report its data-quality findings.
///
/// Weights favour identity and reachability: a name plus a working email or
/// number already clears the midpoint, while services/address/website are
/// finishing touches. A completeness bonus rewards records where nearly
/// every tracked field is filled.
pub fn assess_contact_quality(contact: &ParsedContact) -> QualityReport {
    let mut score: i32 = 0;
    let mut issues = Vec::new();

    if contact.name.is_some() {
        score += 25;
    } else {
        issues.push("no name detected".to_string());
    }

    if let Some(email) = &contact.email {
        score += 20;
        if !RE_EMAIL_SHAPE.is_match(email) {
            score -= 5;
            issues.push(format!("email '{email}' looks malformed"));
        }
    }

    let has_numbers = !contact.phones.is_empty() || !contact.landlines.is_empty();
    if has_numbers {
        score += 20;
        let short = contact
            .phones
            .iter()
            .chain(contact.landlines.iter())
            .find(|n| n.chars().filter(char::is_ascii_digit).count() < 7);
        if let Some(n) = short {
            score -= 5;
            issues.push(format!("phone '{n}' has fewer than 7 digits"));
        }
    }

    if contact.email.is_none() && !has_numbers {
        issues.push("no contact channel (email or phone)".to_string());
    }

    if contact.company.is_some() {
        score += 15;
    }
    if contact.services.is_some() {
        score += 10;
    }

    if let Some(address) = &contact.address {
        score += 5;
        if address.chars().count() < 10 {
            score -= 2;
            issues.push(format!("address '{address}' looks truncated"));
        }
    }

    if let Some(website) = &contact.website {
        score += 5;
        if !website.contains("://") {
            score -= 2;
            issues.push(format!("website '{website}' is missing a scheme"));
        }
    }

    // Completeness bonus over the 7 tracked fields.
    let present = [
        contact.name.is_some(),
        contact.email.is_some(),
        has_numbers,
        contact.company.is_some(),
        contact.services.is_some(),
        contact.address.is_some(),
        contact.website.is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count();
    let ratio = present as f64 / 7.0;
    if ratio > 0.8 {
        score += 10;
    } else if ratio > 0.6 {
        score += 5;
    }

    QualityReport {
        score: score.clamp(0, 100) as u8,
        issues,
    }
}
