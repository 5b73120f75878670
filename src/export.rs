//! Serialization of contact records to vCard 3.0, CSV, and JSON.
//!
//! Pure formatting: no network, no storage, no mutation of the records.
//! The vCard output is intentionally conservative — the property subset
//! every importer understands (`FN`/`N`/`ORG`/`TITLE`/`EMAIL`/`TEL`/`ADR`/
//! `URL`/`NOTE`), with proper value escaping — so the file round-trips
//! through this crate's own decoder as well as through phone address books.

use crate::contact::ParsedContact;
use crate::error::CardexError;
use serde::{Deserialize, Serialize};

/// Supported export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    VCard,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::VCard => "vcard",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Serialize contacts in the requested format.
pub fn export_contacts(
    contacts: &[ParsedContact],
    format: ExportFormat,
) -> Result<String, CardexError> {
    match format {
        ExportFormat::VCard => Ok(to_vcard(contacts)),
        ExportFormat::Csv => to_csv(contacts),
        ExportFormat::Json => to_json(contacts),
    }
}

// ── vCard ────────────────────────────────────────────────────────────────

/// Serialize contacts as concatenated vCard 3.0 entries.
pub fn to_vcard(contacts: &[ParsedContact]) -> String {
    let mut out = String::new();
    for contact in contacts {
        push_vcard(&mut out, contact);
    }
    out
}

fn push_vcard(out: &mut String, contact: &ParsedContact) {
    out.push_str("BEGIN:VCARD\r\nVERSION:3.0\r\n");

    if let Some(name) = &contact.name {
        push_property(out, "FN", name);
        // Structured name: last whitespace token as family, rest as given.
        let mut tokens: Vec<&str> = name.split_whitespace().collect();
        let family = tokens.pop().unwrap_or("");
        let given = tokens.join(" ");
        out.push_str(&format!(
            "N:{};{};;;\r\n",
            escape_value(family),
            escape_value(&given)
        ));
    }
    if let Some(company) = &contact.company {
        push_property(out, "ORG", company);
    }
    if let Some(services) = &contact.services {
        push_property(out, "TITLE", services);
    }
    if let Some(email) = &contact.email {
        out.push_str(&format!("EMAIL;TYPE=INTERNET:{}\r\n", escape_value(email)));
    }
    for n in &contact.phones {
        out.push_str(&format!("TEL;TYPE=CELL:{n}\r\n"));
    }
    for n in &contact.landlines {
        out.push_str(&format!("TEL;TYPE=VOICE:{n}\r\n"));
    }
    if let Some(address) = &contact.address {
        // Street slot of the structured ADR value.
        out.push_str(&format!("ADR;TYPE=WORK:;;{};;;;\r\n", escape_value(address)));
    }
    if let Some(website) = &contact.website {
        push_property(out, "URL", website);
    }
    if let Some(social) = &contact.social {
        push_property(out, "NOTE", social);
    }

    out.push_str("END:VCARD\r\n");
}

fn push_property(out: &mut String, prop: &str, value: &str) {
    out.push_str(&format!("{prop}:{}\r\n", escape_value(value)));
}

/// vCard 3.0 value escaping: backslash, semicolon, comma, newline.
fn escape_value(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace(';', r"\;")
        .replace(',', r"\,")
        .replace('\n', r"\n")
}

// ── CSV ──────────────────────────────────────────────────────────────────

const CSV_HEADERS: [&str; 9] = [
    "name",
    "company",
    "email",
    "phones",
    "landlines",
    "services",
    "address",
    "website",
    "social",
];

/// Serialize contacts as CSV with a header row.
///
/// Multi-valued phone sets join with "; " inside one cell; quoting and
/// quote-escaping follow RFC 4180 via the csv crate.
pub fn to_csv(contacts: &[ParsedContact]) -> Result<String, CardexError> {
    let export_err = |detail: String| CardexError::ExportFailed {
        format: "csv".into(),
        detail,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADERS)
        .map_err(|e| export_err(e.to_string()))?;

    for contact in contacts {
        let join = |set: &std::collections::BTreeSet<String>| {
            set.iter().cloned().collect::<Vec<_>>().join("; ")
        };
        writer
            .write_record([
                contact.name.as_deref().unwrap_or(""),
                contact.company.as_deref().unwrap_or(""),
                contact.email.as_deref().unwrap_or(""),
                &join(&contact.phones),
                &join(&contact.landlines),
                contact.services.as_deref().unwrap_or(""),
                contact.address.as_deref().unwrap_or(""),
                contact.website.as_deref().unwrap_or(""),
                contact.social.as_deref().unwrap_or(""),
            ])
            .map_err(|e| export_err(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| export_err(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| export_err(e.to_string()))
}

// ── JSON ─────────────────────────────────────────────────────────────────

/// Serialize contacts as pretty-printed JSON.
pub fn to_json(contacts: &[ParsedContact]) -> Result<String, CardexError> {
    serde_json::to_string_pretty(contacts).map_err(|e| CardexError::ExportFailed {
        format: "json".into(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{MachineCode, PhoneKind};
    use crate::pipeline::machine_code::decode_payload;

    fn sample() -> ParsedContact {
        let mut c = ParsedContact {
            name: Some("Jane Roe".into()),
            company: Some("Acme, Inc.".into()),
            email: Some("jane@acme.com".into()),
            services: Some("VP Engineering".into()),
            address: Some("123 Main St, Suite 400".into()),
            website: Some("https://acme.com".into()),
            ..Default::default()
        };
        c.insert_number("+14155551234", PhoneKind::Mobile);
        c.insert_number("+14155550000", PhoneKind::Landline);
        c
    }

    #[test]
    fn vcard_round_trips_through_decoder() {
        let text = to_vcard(&[sample()]);
        let decoded = decode_payload(&text, 7);
        let MachineCode::Contact { extracted } = decoded else {
            panic!("expected Contact, got {decoded:?}");
        };
        assert_eq!(extracted.name.as_deref(), Some("Jane Roe"));
        assert_eq!(extracted.email.as_deref(), Some("jane@acme.com"));
        assert!(extracted.phones.contains(&"+14155551234".to_string()));
        assert_eq!(extracted.company.as_deref(), Some("Acme, Inc."));
    }

    #[test]
    fn vcard_escapes_reserved_characters() {
        let text = to_vcard(&[sample()]);
        assert!(text.contains(r"ORG:Acme\, Inc."));
        assert!(text.contains("TEL;TYPE=CELL:+14155551234"));
        assert!(text.contains("TEL;TYPE=VOICE:+14155550000"));
    }

    #[test]
    fn csv_quotes_embedded_commas_and_quotes() {
        let mut c = sample();
        c.company = Some(r#"Acme "Widgets", Inc."#.into());
        let text = to_csv(&[c]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,company,email,phones,landlines,services,address,website,social"
        );
        let row = lines.next().unwrap();
        assert!(row.contains(r#""Acme ""Widgets"", Inc.""#), "row: {row}");
        assert!(row.contains("+14155551234"));
    }

    #[test]
    fn json_is_an_array_of_records() {
        let text = to_json(&[sample(), ParsedContact::default()]).unwrap();
        let parsed: Vec<ParsedContact> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name.as_deref(), Some("Jane Roe"));
    }

    #[test]
    fn empty_input_yields_empty_vcard_text() {
        assert_eq!(to_vcard(&[]), "");
    }
}
