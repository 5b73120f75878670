//! Card record assembly: merge text extraction with machine-code data.
//!
//! Precedence is deliberate and asymmetric: the text-extraction candidate is
//! the base record and machine-code data only backfills gaps. QR payloads
//! are often generic company plumbing ("info@company.com", the bare office
//! switchboard) while the printed side of the card carries the
//! person-specific details, so when both sources disagree the printed side
//! wins. Phone numbers are the exception — they union, since a card and its
//! QR code frequently list different numbers for the same person.
//!
//! A candidate that ends up with no name, company, email, or number is not
//! worth keeping: it gets dropped with a non-fatal
//! [`CardError::InsufficientInformation`] the batch records and moves past.

use crate::contact::{MachineCode, ParsedContact, PartialContact};
use crate::error::CardError;
use crate::pipeline::phone;
use tracing::debug;

/// Merge one card's text candidate with its decoded machine codes and apply
/// the acceptance check.
///
/// `image` and `card_index` only feed the error message for rejected cards.
pub fn build_card(
    mut base: ParsedContact,
    codes: Vec<MachineCode>,
    image: &str,
    card_index: usize,
) -> Result<ParsedContact, CardError> {
    for code in &codes {
        if let MachineCode::Contact { extracted } = code {
            backfill(&mut base, extracted);
        }
    }
    base.machine_codes = codes;

    if !base.has_substance() {
        debug!(image, card_index, "dropping card candidate without substance");
        return Err(CardError::InsufficientInformation {
            image: image.to_string(),
            card: card_index,
        });
    }
    Ok(base)
}

/// Fill-only-if-absent for scalar fields; union for phone sets.
fn backfill(base: &mut ParsedContact, extra: &PartialContact) {
    if base.name.is_none() {
        base.name = extra.name.clone();
    }
    if base.company.is_none() {
        base.company = extra.company.clone();
    }
    if base.email.is_none() {
        base.email = extra.email.clone();
    }
    if base.website.is_none() {
        base.website = extra.website.clone();
    }
    if base.address.is_none() {
        base.address = extra.address.clone();
    }
    if base.services.is_none() {
        base.services = extra.services.clone();
    }
    for n in &extra.phones {
        let kind = phone::classify(n);
        base.insert_number(n.clone(), kind);
    }
}
