//! Error types for the cardex library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CardexError`] — **Fatal**: the batch cannot produce anything at all
//!   (invalid configuration, empty input, every image failed). Returned as
//!   `Err(CardexError)` from the top-level `process_*` functions.
//!
//! * [`CardError`] — **Non-fatal**: a single card or image failed (the
//!   vision call errored, a card candidate carried no usable information)
//!   but the rest of the batch is fine. Rendered to strings and stored in
//!   [`crate::output::BatchResult::errors`] so callers can inspect partial
//!   success rather than losing the whole batch to one bad card.
//!
//! Malformed *data* is never an error at all: an unparseable phone number or
//! a vCard field that fails to decode simply yields an absent value, and the
//! acceptance check in the record builder decides whether the card as a
//! whole was worth keeping.

use thiserror::Error;

/// All fatal errors returned by the cardex library.
///
/// Card-level failures use [`CardError`] and are folded into
/// [`crate::output::BatchResult::errors`] rather than propagated here.
#[derive(Debug, Error)]
pub enum CardexError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The batch contained no images at all.
    #[error("Empty batch: no images to process")]
    EmptyBatch,

    /// Every image in the batch failed and no contact was produced.
    #[error("All {total} images failed and no contacts were extracted.\nFirst error: {first_error}")]
    AllImagesFailed { total: usize, first_error: String },

    /// An exporter could not serialize the contact sequence.
    #[error("Export to {format} failed: {detail}")]
    ExportFailed { format: String, detail: String },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single card or image.
///
/// Rendered with `Display` into [`crate::output::BatchResult::errors`].
/// The overall batch continues unless ALL images fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum CardError {
    /// The external vision call for one image failed; the caller forwarded
    /// the failure via [`crate::process::VisionInput::Failed`].
    #[error("image '{image}': vision recognition failed: {reason}")]
    VisionFailed { image: String, reason: String },

    /// A card candidate had none of name/company/email/phones after merging.
    #[error("image '{image}', card {card}: insufficient information extracted")]
    InsufficientInformation { image: String, card: usize },

    /// A payload announced a structured format (vCard/MeCard) but parsed to
    /// no usable field; it was kept as opaque text. Informational — the
    /// image's cards still process normally.
    #[error("image '{image}': {format} payload yielded no contact fields")]
    EmptyPayload { image: String, format: String },
}
