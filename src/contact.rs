//! The contact data model: the canonical record the whole pipeline produces.
//!
//! [`ParsedContact`] is the unit everything else revolves around. Two
//! representation choices carry most of the invariants:
//!
//! * Optional scalar fields are `Option<String>` and are **never**
//!   `Some("")` — setters trim and drop empties, so "absent" has exactly one
//!   representation and downstream code never needs an `is_empty` check.
//! * Phone numbers live in two `BTreeSet`s (mobile vs. landline). Sets give
//!   duplicate-freedom for free, and the B-tree ordering makes exports and
//!   test assertions deterministic. A guarded insert keeps any normalized
//!   number out of both sets at once: whichever classification lands first
//!   wins, later sightings of the same number are ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Classification of a normalized phone number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhoneKind {
    Mobile,
    Landline,
}

/// A decoded QR/barcode payload and its classified interpretation.
///
/// Immutable once decoded; attached to the [`ParsedContact`] record(s) it
/// contributed to as provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MachineCode {
    /// The payload carried contact structure (vCard, MeCard, or recognisable
    /// `tel:`/`mailto:`/phone fragments).
    Contact { extracted: PartialContact },
    /// The payload was a bare absolute HTTP(S) URL.
    Url { url: String },
    /// Opaque payload with no recognisable structure.
    Text { raw: String },
}

/// Contact fields recovered from a single machine-readable payload.
///
/// Phones are already normalized (digits, optional leading `+`) and
/// deduplicated; classification into mobile/landline happens when the
/// record builder folds them into a [`ParsedContact`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<String>,
    /// Normalized phone candidates, in payload order, duplicate-free.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<String>,
}

impl PartialContact {
    /// True when no field at all was recovered from the payload.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.company.is_none()
            && self.email.is_none()
            && self.website.is_none()
            && self.address.is_none()
            && self.services.is_none()
            && self.phones.is_empty()
    }
}

/// The canonical, normalized contact record for one physical card
/// (or for several merged duplicate detections of the same card).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Always lowercase and trimmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Mobile-classified normalized numbers.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub phones: BTreeSet<String>,
    /// Landline-classified normalized numbers.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub landlines: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<String>,
    /// Provenance: every decoded payload that contributed to this record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub machine_codes: Vec<MachineCode>,
}

impl ParsedContact {
    /// Insert a normalized number under its classification.
    ///
    /// Enforces the set invariant: a number already present in the *other*
    /// set is not inserted again — the first classification wins. Returns
    /// true when the number was actually added.
    pub fn insert_number(&mut self, normalized: impl Into<String>, kind: PhoneKind) -> bool {
        let n = normalized.into();
        if n.is_empty() {
            return false;
        }
        match kind {
            PhoneKind::Mobile => {
                if self.landlines.contains(&n) {
                    return false;
                }
                self.phones.insert(n)
            }
            PhoneKind::Landline => {
                if self.phones.contains(&n) {
                    return false;
                }
                self.landlines.insert(n)
            }
        }
    }

    /// True when the given normalized number appears in either set.
    pub fn has_number(&self, normalized: &str) -> bool {
        self.phones.contains(normalized) || self.landlines.contains(normalized)
    }

    /// True when at least one of name/company/email/phones/landlines is
    /// populated — the acceptance bar for a card candidate.
    pub fn has_substance(&self) -> bool {
        self.name.is_some()
            || self.company.is_some()
            || self.email.is_some()
            || !self.phones.is_empty()
            || !self.landlines.is_empty()
    }
}

/// Trim a candidate value and absorb empties into `None`.
///
/// The single entry point through which every optional scalar field is set,
/// keeping the "no empty strings" representation invariant in one place.
pub(crate) fn non_empty(value: impl AsRef<str>) -> Option<String> {
    let trimmed = value.as_ref().trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_respects_first_classification() {
        let mut c = ParsedContact::default();
        assert!(c.insert_number("+14155551234", PhoneKind::Mobile));
        // Same number seen again under the other class: rejected.
        assert!(!c.insert_number("+14155551234", PhoneKind::Landline));
        assert!(c.phones.contains("+14155551234"));
        assert!(c.landlines.is_empty());
    }

    #[test]
    fn insert_deduplicates_within_a_set() {
        let mut c = ParsedContact::default();
        assert!(c.insert_number("+4915112345678", PhoneKind::Mobile));
        assert!(!c.insert_number("+4915112345678", PhoneKind::Mobile));
        assert_eq!(c.phones.len(), 1);
    }

    #[test]
    fn substance_requires_identity_or_reachability() {
        let mut c = ParsedContact {
            address: Some("123 Main St".into()),
            ..Default::default()
        };
        assert!(!c.has_substance());
        c.email = Some("a@b.com".into());
        assert!(c.has_substance());
    }

    #[test]
    fn non_empty_absorbs_whitespace() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" x "), Some("x".to_string()));
    }

    #[test]
    fn partial_contact_emptiness() {
        assert!(PartialContact::default().is_empty());
        let p = PartialContact {
            phones: vec!["+14155551234".into()],
            ..Default::default()
        };
        assert!(!p.is_empty());
    }
}
