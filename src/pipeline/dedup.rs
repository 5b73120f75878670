//! Duplicate detection and merging across a batch of card records.
//!
//! The same physical card often surfaces several times in one batch: the
//! front and back of a card photographed separately, two shots of the same
//! card, or a vCard QR plus the printed side. There is no ground truth to
//! reconcile against, so duplicates are found by fuzzy field agreement and
//! merged greedily.
//!
//! The pass is a pure fold over the input sequence: each unprocessed record
//! opens a group, absorbs every later record whose similarity clears the
//! configured threshold, and is emitted once. The "processed" markers are
//! local function state; nothing global mutates. Deduplicating an already
//! deduplicated sequence is a no-op.

use crate::config::EngineConfig;
use crate::contact::ParsedContact;
use tracing::debug;

/// Merge duplicate records, preserving first-seen order.
///
/// Returns the deduplicated sequence and the number of records that were
/// absorbed into another.
pub fn dedup_contacts(
    records: Vec<ParsedContact>,
    config: &EngineConfig,
) -> (Vec<ParsedContact>, usize) {
    let mut processed = vec![false; records.len()];
    let mut out: Vec<ParsedContact> = Vec::with_capacity(records.len());
    let mut absorbed = 0usize;

    for i in 0..records.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;
        let mut working = records[i].clone();

        for (j, candidate) in records.iter().enumerate().skip(i + 1) {
            if processed[j] {
                continue;
            }
            let score = similarity(&working, candidate, config);
            if score >= config.similarity_threshold {
                debug!(i, j, score, "merging duplicate card records");
                merge_into(&mut working, candidate);
                processed[j] = true;
                absorbed += 1;
            }
        }
        out.push(working);
    }

    (out, absorbed)
}

/// Fuzzy similarity of two records in `0.0..=1.0`.
///
/// Averages up to four component scores; a component participates only when
/// both records populate the relevant field. Name and company contribute
/// their edit-distance ratio only above their configured floors (a weak
/// partial match still occupies a denominator slot but adds nothing), email
/// and phone overlap are exact-match indicators. No comparable component
/// means no evidence: the score is 0.
pub fn similarity(a: &ParsedContact, b: &ParsedContact, config: &EngineConfig) -> f64 {
    let mut score = 0.0;
    let mut comparable = 0u32;

    if let (Some(na), Some(nb)) = (&a.name, &b.name) {
        comparable += 1;
        let r = edit_ratio(na, nb);
        if r > config.name_similarity_floor {
            score += r;
        }
    }

    if let (Some(ea), Some(eb)) = (&a.email, &b.email) {
        comparable += 1;
        if ea.eq_ignore_ascii_case(eb) {
            score += 1.0;
        }
    }

    let a_has_numbers = !a.phones.is_empty() || !a.landlines.is_empty();
    let b_has_numbers = !b.phones.is_empty() || !b.landlines.is_empty();
    if a_has_numbers && b_has_numbers {
        comparable += 1;
        let overlap = a
            .phones
            .iter()
            .chain(a.landlines.iter())
            .any(|n| b.has_number(n));
        if overlap {
            score += 1.0;
        }
    }

    if let (Some(ca), Some(cb)) = (&a.company, &b.company) {
        comparable += 1;
        let r = edit_ratio(ca, cb);
        if r > config.company_similarity_floor {
            score += r;
        }
    }

    if comparable == 0 {
        0.0
    } else {
        score / comparable as f64
    }
}

/// Case-normalized Levenshtein ratio: `1 − distance / max(len)`.
fn edit_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

/// Classic two-row Levenshtein edit distance over chars.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Absorb `other` into `working`.
///
/// Scalars keep whichever value is non-empty and prefer the longer string
/// when both are present (longer card text usually means less truncated
/// OCR). Phone sets union under the usual mobile/landline exclusivity, and
/// machine-code provenance concatenates.
fn merge_into(working: &mut ParsedContact, other: &ParsedContact) {
    merge_scalar(&mut working.name, &other.name);
    merge_scalar(&mut working.company, &other.company);
    merge_scalar(&mut working.email, &other.email);
    merge_scalar(&mut working.services, &other.services);
    merge_scalar(&mut working.address, &other.address);
    merge_scalar(&mut working.website, &other.website);
    merge_scalar(&mut working.social, &other.social);

    for n in &other.phones {
        working.insert_number(n.clone(), crate::contact::PhoneKind::Mobile);
    }
    for n in &other.landlines {
        working.insert_number(n.clone(), crate::contact::PhoneKind::Landline);
    }
    // Provenance concatenates, but a code shared by both detections of the
    // same card must not appear twice in the merged record.
    for code in &other.machine_codes {
        if !working.machine_codes.contains(code) {
            working.machine_codes.push(code.clone());
        }
    }
}

fn merge_scalar(target: &mut Option<String>, other: &Option<String>) {
    match (target.as_ref(), other) {
        (None, Some(v)) => *target = Some(v.clone()),
        (Some(t), Some(v)) if v.len() > t.len() => *target = Some(v.clone()),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::PhoneKind;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn named(name: &str) -> ParsedContact {
        ParsedContact {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn levenshtein_basics() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(levenshtein(&chars("kitten"), &chars("sitting")), 3);
        assert_eq!(levenshtein(&chars(""), &chars("abc")), 3);
        assert_eq!(levenshtein(&chars("abc"), &chars("abc")), 0);
    }

    #[test]
    fn similar_names_merge_and_union_fields() {
        // "John Doe" vs "Jon Doe": edit ratio 0.875 on the single
        // comparable component, above the 0.7 threshold.
        let a = ParsedContact {
            name: Some("John Doe".into()),
            email: Some("john@acme.com".into()),
            ..Default::default()
        };
        let mut b = named("Jon Doe");
        b.insert_number("+14155551234", PhoneKind::Mobile);

        let (out, absorbed) = dedup_contacts(vec![a, b], &config());
        assert_eq!(out.len(), 1);
        assert_eq!(absorbed, 1);
        assert_eq!(out[0].name.as_deref(), Some("John Doe"));
        assert_eq!(out[0].email.as_deref(), Some("john@acme.com"));
        assert!(out[0].phones.contains("+14155551234"));
    }

    #[test]
    fn weak_name_match_occupies_denominator() {
        // Names differ too much to count, emails match exactly:
        // score = (0 + 1) / 2 = 0.5, below threshold, no merge.
        let a = ParsedContact {
            name: Some("John Doe".into()),
            email: Some("shared@acme.com".into()),
            ..Default::default()
        };
        let b = ParsedContact {
            name: Some("Maria Gonzalez".into()),
            email: Some("shared@acme.com".into()),
            ..Default::default()
        };
        assert!(similarity(&a, &b, &config()) < 0.7);
        let (out, _) = dedup_contacts(vec![a, b], &config());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn phone_overlap_counts_across_both_sets() {
        let mut a = named("A B");
        a.insert_number("4155551234", PhoneKind::Landline);
        let mut b = named("X Y");
        b.insert_number("4155551234", PhoneKind::Mobile);
        // Names disagree entirely; phone overlap is the only signal.
        let s = similarity(&a, &b, &config());
        assert_eq!(s, 0.5); // (0 name + 1 phone) / 2
    }

    #[test]
    fn no_comparable_fields_scores_zero() {
        let a = ParsedContact {
            email: Some("a@x.com".into()),
            ..Default::default()
        };
        let b = named("Jane Roe");
        assert_eq!(similarity(&a, &b, &config()), 0.0);
    }

    #[test]
    fn merge_prefers_longer_scalar() {
        let mut a = named("Jo");
        a.company = Some("Acme".into());
        let mut working = a.clone();
        let mut other = named("Jonathan Smithers");
        other.company = Some("Acme Corporation".into());
        merge_into(&mut working, &other);
        assert_eq!(working.name.as_deref(), Some("Jonathan Smithers"));
        assert_eq!(working.company.as_deref(), Some("Acme Corporation"));
    }

    #[test]
    fn absorbed_fields_help_match_later_records() {
        // c shares a number with b but nothing with a. Once b is absorbed
        // into a's working record the number is there, so c merges too;
        // scoring against the original a would have left c separate.
        let a = ParsedContact {
            name: Some("John Doe".into()),
            email: Some("john@acme.com".into()),
            ..Default::default()
        };
        let mut b = named("Jon Doe");
        b.insert_number("+14155551234", PhoneKind::Mobile);
        let mut c = ParsedContact::default();
        c.insert_number("+14155551234", PhoneKind::Mobile);

        assert_eq!(similarity(&a, &c, &config()), 0.0);
        let (out, absorbed) = dedup_contacts(vec![a, b, c], &config());
        assert_eq!(out.len(), 1);
        assert_eq!(absorbed, 2);
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut a = named("John Doe");
        a.insert_number("+14155551234", PhoneKind::Mobile);
        let b = named("Jon Doe");
        let c = ParsedContact {
            name: Some("Maria Gonzalez".into()),
            email: Some("maria@other.org".into()),
            ..Default::default()
        };

        let (once, _) = dedup_contacts(vec![a, b, c], &config());
        let (twice, absorbed) = dedup_contacts(once.clone(), &config());
        assert_eq!(once, twice);
        assert_eq!(absorbed, 0);
    }

    #[test]
    fn set_invariant_survives_merge() {
        let mut a = named("John Doe");
        a.insert_number("4155551234", PhoneKind::Mobile);
        let mut b = named("John Doe");
        b.insert_number("4155551234", PhoneKind::Landline);

        let (out, _) = dedup_contacts(vec![a, b], &config());
        assert_eq!(out.len(), 1);
        let merged = &out[0];
        assert!(merged.phones.contains("4155551234"));
        assert!(!merged.landlines.contains("4155551234"));
    }
}
