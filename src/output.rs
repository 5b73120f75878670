//! Result types returned by the batch-processing entry points.
//!
//! A [`BatchResult`] is created once per processing call, handed to the
//! caller (UI, persistence layer), and discarded — the engine keeps no state
//! across calls. Per-image intermediates use [`ImageOutcome`], which is also
//! the item type of the streaming API.

use crate::contact::ParsedContact;
use serde::{Deserialize, Serialize};

/// Everything one processing call produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    /// Deduplicated contact records, in first-seen order.
    pub contacts: Vec<ParsedContact>,
    /// Non-fatal per-card / per-image error messages, in image order.
    pub errors: Vec<String>,
    /// Total decoded machine-code payloads across the batch (all variants).
    pub machine_codes_found: usize,
    /// Aggregate counters for logging and UI summaries.
    pub stats: BatchStats,
}

/// Aggregate statistics for one batch-processing call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    /// Images submitted in the batch.
    pub images_total: usize,
    /// Images whose vision output was a forwarded failure.
    pub images_failed: usize,
    /// Card candidates detected before the acceptance check.
    pub cards_detected: usize,
    /// Candidates that passed the acceptance check.
    pub cards_accepted: usize,
    /// Accepted records absorbed into another record by deduplication.
    pub cards_merged: usize,
    /// Wall-clock duration of the whole call.
    pub duration_ms: u64,
}

/// The outcome of processing a single image: what the streaming API yields
/// and what the eager API joins before cross-image deduplication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageOutcome {
    /// Caller-supplied image label, echoed back for correlation.
    pub image: String,
    /// Accepted (and, in per-image scope, deduplicated) records.
    pub contacts: Vec<ParsedContact>,
    /// Non-fatal errors for this image.
    pub errors: Vec<String>,
    /// Decoded machine-code payloads on this image.
    pub machine_codes_found: usize,
    /// Card candidates detected before acceptance.
    pub cards_detected: usize,
    /// True when the caller forwarded a vision-call failure for this image.
    pub vision_failed: bool,
}
