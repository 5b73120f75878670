//! Eager (full-batch) processing entry points.
//!
//! The engine consumes what the external collaborators already produced:
//! per image, the vision model's recognized text or structured JSON, plus
//! any decoded machine-code payload strings. Nothing here performs I/O —
//! the vision network call and the QR image decoding happen upstream, and a
//! failed call is *forwarded* as [`VisionInput::Failed`] so the engine can
//! fold it into the batch error log instead of losing the whole batch.
//!
//! Per-image pipelines are pure and independent, so they run concurrently
//! with bounded parallelism. Cross-image deduplication is the single join
//! point: it starts only after every per-image result is collected, and
//! operates on that immutable snapshot.

use crate::config::{DedupScope, EngineConfig};
use crate::contact::{MachineCode, ParsedContact};
use crate::error::{CardError, CardexError};
use crate::output::{BatchResult, BatchStats, ImageOutcome};
use crate::pipeline::{build, dedup, extract, machine_code};
use crate::pipeline::extract::VisionFields;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Everything the collaborators produced for one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInput {
    /// Caller-chosen identifier (filename, upload id), echoed in errors.
    pub label: String,
    /// The vision model's output, or its forwarded failure.
    pub vision: VisionInput,
    /// Decoded machine-code payload strings found on the image.
    #[serde(default)]
    pub machine_codes: Vec<String>,
}

/// What the external vision call returned for one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum VisionInput {
    /// Structured JSON response, one entry per detected card.
    Structured { cards: Vec<VisionFields> },
    /// Raw recognized text (single-card fallback path).
    Text { text: String },
    /// The external call failed; `reason` lands in the batch error log and
    /// the image contributes zero records.
    Failed { reason: String },
}

/// Process a batch of images into deduplicated contact records.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(BatchResult)` on success, even if some images or cards failed
/// (check `result.errors`).
///
/// # Errors
/// Returns `Err(CardexError)` only for fatal conditions: an empty batch, or
/// every image failing with zero contacts extracted.
pub async fn process_batch(
    images: Vec<ImageInput>,
    config: &EngineConfig,
) -> Result<BatchResult, CardexError> {
    let start = Instant::now();
    if images.is_empty() {
        return Err(CardexError::EmptyBatch);
    }
    let total_images = images.len();
    info!("processing batch of {} images", total_images);

    // ── Per-image pipelines, bounded concurrency ─────────────────────────
    let mut outcomes: Vec<(usize, ImageOutcome)> =
        stream::iter(images.into_iter().enumerate().map(|(index, input)| {
            let config = config.clone();
            async move { (index, process_image(&input, &config)) }
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    // Restore submission order: buffer_unordered yields by completion.
    outcomes.sort_by_key(|(index, _)| *index);

    // ── Join and fold ────────────────────────────────────────────────────
    let mut errors: Vec<String> = Vec::new();
    let mut collected: Vec<Vec<ParsedContact>> = Vec::new();
    let mut machine_codes_found = 0usize;
    let mut images_failed = 0usize;
    let mut cards_detected = 0usize;

    for (_, outcome) in outcomes {
        machine_codes_found += outcome.machine_codes_found;
        cards_detected += outcome.cards_detected;
        if outcome.vision_failed {
            images_failed += 1;
        }
        errors.extend(outcome.errors);
        collected.push(outcome.contacts);
    }

    let cards_accepted: usize = collected.iter().map(Vec::len).sum();

    if images_failed == total_images && cards_accepted == 0 {
        return Err(CardexError::AllImagesFailed {
            total: total_images,
            first_error: errors.first().cloned().unwrap_or_default(),
        });
    }

    // ── Deduplicate ──────────────────────────────────────────────────────
    let (contacts, cards_merged) = match config.dedup_scope {
        DedupScope::CrossImage => {
            let all: Vec<ParsedContact> = collected.into_iter().flatten().collect();
            dedup::dedup_contacts(all, config)
        }
        DedupScope::PerImage => {
            let mut merged_total = 0usize;
            let mut out = Vec::new();
            for per_image in collected {
                let (deduped, merged) = dedup::dedup_contacts(per_image, config);
                merged_total += merged;
                out.extend(deduped);
            }
            (out, merged_total)
        }
    };

    let stats = BatchStats {
        images_total: total_images,
        images_failed,
        cards_detected,
        cards_accepted,
        cards_merged,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "batch complete: {} contacts from {} images ({} merged, {} errors) in {}ms",
        contacts.len(),
        total_images,
        cards_merged,
        errors.len(),
        stats.duration_ms
    );

    Ok(BatchResult {
        contacts,
        errors,
        machine_codes_found,
        stats,
    })
}

/// Synchronous wrapper around [`process_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_batch_sync(
    images: Vec<ImageInput>,
    config: &EngineConfig,
) -> Result<BatchResult, CardexError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CardexError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(process_batch(images, config))
}

/// Run the full per-image pipeline: decode payloads, extract candidates,
/// assemble records, apply the acceptance check.
///
/// Pure and synchronous; the async entry points only schedule it.
pub(crate) fn process_image(input: &ImageInput, config: &EngineConfig) -> ImageOutcome {
    let mut outcome = ImageOutcome {
        image: input.label.clone(),
        ..Default::default()
    };

    let mut codes: Vec<MachineCode> = Vec::with_capacity(input.machine_codes.len());
    for payload in &input.machine_codes {
        let code = machine_code::decode_payload(payload, config.min_phone_digits);
        // A payload that announced vCard/MeCard but parsed to nothing is
        // recoverable-local: note it and keep going.
        if matches!(code, MachineCode::Text { .. }) {
            if let Some(format) = machine_code::announced_format(payload) {
                outcome.errors.push(
                    CardError::EmptyPayload {
                        image: input.label.clone(),
                        format: format.to_string(),
                    }
                    .to_string(),
                );
            }
        }
        codes.push(code);
    }
    outcome.machine_codes_found = codes.len();

    let candidates: Vec<ParsedContact> = match &input.vision {
        VisionInput::Failed { reason } => {
            outcome.vision_failed = true;
            outcome.errors.push(
                CardError::VisionFailed {
                    image: input.label.clone(),
                    reason: reason.clone(),
                }
                .to_string(),
            );
            return outcome;
        }
        VisionInput::Structured { cards } => cards
            .iter()
            .map(|fields| extract::extract_structured(fields, config))
            .collect(),
        VisionInput::Text { text } => vec![extract::extract_free_text(text, config)],
    };
    outcome.cards_detected = candidates.len();
    debug!(
        image = input.label.as_str(),
        cards = candidates.len(),
        codes = codes.len(),
        "extracted card candidates"
    );

    // Without per-card geometry there is no way to pair a payload with one
    // detection, so every code is offered to every candidate; duplicate
    // detections reconcile their shared provenance during dedup.
    for (index, candidate) in candidates.into_iter().enumerate() {
        match build::build_card(candidate, codes.clone(), &input.label, index) {
            Ok(card) => outcome.contacts.push(card),
            Err(e) => outcome.errors.push(e.to_string()),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_input(label: &str, text: &str) -> ImageInput {
        ImageInput {
            label: label.into(),
            vision: VisionInput::Text { text: text.into() },
            machine_codes: Vec::new(),
        }
    }

    #[test]
    fn failed_vision_contributes_error_and_no_records() {
        let input = ImageInput {
            label: "img-1".into(),
            vision: VisionInput::Failed {
                reason: "rate limited".into(),
            },
            // Even decoded codes yield nothing when the vision side failed.
            machine_codes: vec!["https://acme.com".into()],
        };
        let outcome = process_image(&input, &EngineConfig::default());
        assert!(outcome.vision_failed);
        assert!(outcome.contacts.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("rate limited"));
    }

    #[test]
    fn machine_code_backfills_text_candidate() {
        let mut input = text_input("card.jpg", "Jane Roe\nSenior Manager");
        input.machine_codes =
            vec!["MECARD:N:Roe,Jane;ORG:Acme;EMAIL:jane@acme.com;TEL:+14155551234;;".into()];
        let outcome = process_image(&input, &EngineConfig::default());
        assert_eq!(outcome.machine_codes_found, 1);
        assert_eq!(outcome.contacts.len(), 1);
        let card = &outcome.contacts[0];
        assert_eq!(card.name.as_deref(), Some("Jane Roe"));
        assert_eq!(card.company.as_deref(), Some("Acme"));
        assert_eq!(card.email.as_deref(), Some("jane@acme.com"));
        assert!(card.phones.contains("+14155551234"));
        assert_eq!(card.machine_codes.len(), 1);
    }

    #[test]
    fn fieldless_vcard_payload_noted_in_errors() {
        let mut input = text_input("card.jpg", "Jane Roe\njane@acme.com");
        input.machine_codes = vec!["BEGIN:VCARD\nVERSION:3.0\nEND:VCARD".into()];
        let outcome = process_image(&input, &EngineConfig::default());
        // The payload still counts and the card still processes.
        assert_eq!(outcome.machine_codes_found, 1);
        assert_eq!(outcome.contacts.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("vCard payload yielded no contact fields"));
    }

    #[test]
    fn plain_text_payload_is_not_an_error() {
        let mut input = text_input("card.jpg", "Jane Roe\njane@acme.com");
        input.machine_codes = vec!["just words".into()];
        let outcome = process_image(&input, &EngineConfig::default());
        assert_eq!(outcome.machine_codes_found, 1);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn insubstantial_card_drops_into_errors() {
        let input = text_input("back.jpg", "123 Main Street\nSuite 400");
        let outcome = process_image(&input, &EngineConfig::default());
        assert!(outcome.contacts.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("insufficient information extracted"));
    }

    #[tokio::test]
    async fn empty_batch_is_fatal() {
        let err = process_batch(Vec::new(), &EngineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CardexError::EmptyBatch));
    }

    #[tokio::test]
    async fn single_failed_image_fails_the_batch() {
        let images = vec![ImageInput {
            label: "only.jpg".into(),
            vision: VisionInput::Failed {
                reason: "network".into(),
            },
            machine_codes: Vec::new(),
        }];
        let err = process_batch(images, &EngineConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CardexError::AllImagesFailed { total: 1, .. }));
    }

    #[tokio::test]
    async fn failed_image_does_not_cascade() {
        let images = vec![
            ImageInput {
                label: "bad.jpg".into(),
                vision: VisionInput::Failed {
                    reason: "timeout".into(),
                },
                machine_codes: Vec::new(),
            },
            text_input("good.jpg", "Jane Roe\njane@acme.com"),
        ];
        let result = process_batch(images, &EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(result.contacts.len(), 1);
        assert_eq!(result.stats.images_failed, 1);
        assert_eq!(result.errors.len(), 1);
    }

    #[tokio::test]
    async fn cross_image_dedup_merges_repeat_detections() {
        let images = vec![
            text_input("a.jpg", "John Doe\njohn@acme.com"),
            text_input("b.jpg", "Jon Doe\n+1 415 555 1234"),
        ];
        let result = process_batch(images, &EngineConfig::default())
            .await
            .unwrap();
        assert_eq!(result.contacts.len(), 1);
        assert_eq!(result.stats.cards_merged, 1);
        let card = &result.contacts[0];
        assert_eq!(card.email.as_deref(), Some("john@acme.com"));
        assert!(card.has_number("14155551234"));
    }

    #[tokio::test]
    async fn per_image_scope_keeps_cross_image_twins() {
        let images = vec![
            text_input("a.jpg", "John Doe\njohn@acme.com"),
            text_input("b.jpg", "John Doe\njohn@acme.com"),
        ];
        let config = EngineConfig::builder()
            .dedup_scope(DedupScope::PerImage)
            .build()
            .unwrap();
        let result = process_batch(images, &config).await.unwrap();
        assert_eq!(result.contacts.len(), 2);
    }

    #[tokio::test]
    async fn contacts_keep_image_submission_order() {
        let images: Vec<ImageInput> = (0..6)
            .map(|i| text_input(&format!("{i}.jpg"), &format!("Person Num{i}\np{i}@x{i}.com")))
            .collect();
        let config = EngineConfig::builder().concurrency(3).build().unwrap();
        let result = process_batch(images, &config).await.unwrap();
        let names: Vec<_> = result
            .contacts
            .iter()
            .map(|c| c.name.clone().unwrap())
            .collect();
        let expected: Vec<_> = (0..6).map(|i| format!("Person Num{i}")).collect();
        assert_eq!(names, expected);
    }
}
