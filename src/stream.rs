//! Streaming variant of the batch entry point.
//!
//! Yields one [`ImageOutcome`] per input image as soon as its pipeline
//! finishes, in submission order. Useful for progress reporting over large
//! batches without waiting for the full result. Cross-image deduplication
//! needs the whole batch at once, so each streamed outcome is deduplicated
//! within its own image only; callers that want the cross-image pass should
//! use [`process_batch`](crate::process::process_batch) instead.

use crate::config::EngineConfig;
use crate::output::ImageOutcome;
use crate::pipeline::dedup;
use crate::process::{process_image, ImageInput};
use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;

pub type OutcomeStream = Pin<Box<dyn Stream<Item = ImageOutcome> + Send>>;

/// Process images with bounded concurrency, yielding outcomes in order.
pub fn process_stream(images: Vec<ImageInput>, config: &EngineConfig) -> OutcomeStream {
    let config = config.clone();
    let concurrency = config.concurrency.max(1);
    Box::pin(
        stream::iter(images.into_iter().map(move |input| {
            let config = config.clone();
            async move {
                let mut outcome = process_image(&input, &config);
                let (contacts, _) =
                    dedup::dedup_contacts(std::mem::take(&mut outcome.contacts), &config);
                outcome.contacts = contacts;
                outcome
            }
        }))
        // buffered (not buffer_unordered) preserves submission order.
        .buffered(concurrency),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::VisionInput;
    use futures::StreamExt;

    #[tokio::test]
    async fn outcomes_arrive_in_submission_order() {
        let images: Vec<ImageInput> = (0..4)
            .map(|i| ImageInput {
                label: format!("{i}.jpg"),
                vision: VisionInput::Text {
                    text: format!("Holder Num{i}\nh{i}@mail.com"),
                },
                machine_codes: Vec::new(),
            })
            .collect();
        let config = EngineConfig::builder().concurrency(2).build().unwrap();
        let labels: Vec<String> = process_stream(images, &config)
            .map(|outcome| outcome.image)
            .collect()
            .await;
        assert_eq!(labels, vec!["0.jpg", "1.jpg", "2.jpg", "3.jpg"]);
    }

    #[tokio::test]
    async fn duplicate_cards_within_one_image_merge() {
        let images = vec![ImageInput {
            label: "sheet.jpg".into(),
            vision: VisionInput::Structured {
                cards: vec![
                    crate::pipeline::extract::VisionFields {
                        name: Some("John Doe".into()),
                        email: Some("john@acme.com".into()),
                        ..Default::default()
                    },
                    crate::pipeline::extract::VisionFields {
                        name: Some("Jon Doe".into()),
                        email: Some("john@acme.com".into()),
                        ..Default::default()
                    },
                ],
            },
            machine_codes: Vec::new(),
        }];
        let outcomes: Vec<ImageOutcome> =
            process_stream(images, &EngineConfig::default()).collect().await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].contacts.len(), 1);
        assert_eq!(outcomes[0].cards_detected, 2);
    }
}
