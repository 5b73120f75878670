//! Configuration for the extraction and reconciliation engine.
//!
//! All engine behaviour is controlled through [`EngineConfig`], built via
//! its [`EngineConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! The similarity constants deserve a note: 0.7 overall, 0.8 for names and
//! 0.7 for companies are empirical values tuned against real card batches.
//! They are exposed as configuration rather than buried as literals so a
//! caller with a stricter or looser notion of "same person" can adjust them
//! without forking the dedup code.

use crate::error::CardexError;
use serde::{Deserialize, Serialize};

/// Configuration for one batch-processing call.
///
/// Built via [`EngineConfig::builder()`] or [`EngineConfig::default()`].
///
/// # Example
/// ```rust
/// use cardex::{DedupScope, EngineConfig};
///
/// let config = EngineConfig::builder()
///     .similarity_threshold(0.8)
///     .dedup_scope(DedupScope::PerImage)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Overall similarity at or above which two records merge. Range: 0–1. Default: 0.7.
    ///
    /// The final score averages the comparable field components (name, email,
    /// phone overlap, company). 0.7 means "most comparable fields agree":
    /// an exact email match plus a near-identical name clears it easily,
    /// while a shared company alone does not.
    pub similarity_threshold: f64,

    /// Minimum name edit-distance ratio for the name component to count
    /// towards the similarity numerator. Default: 0.8.
    ///
    /// Below this floor two names are treated as "different people who may
    /// share a field" rather than an OCR variant of the same person, so the
    /// component contributes 0 instead of a weak partial score.
    pub name_similarity_floor: f64,

    /// Minimum company edit-distance ratio for the company component to
    /// count. Default: 0.7. Looser than the name floor because company
    /// strings vary more across cards ("Acme" vs "Acme Corp.").
    pub company_similarity_floor: f64,

    /// Minimum digit count for a phone candidate to survive normalization.
    /// Default: 7. Shorter digit runs are postcodes, extensions, or street
    /// numbers far more often than dialable numbers.
    pub min_phone_digits: usize,

    /// Number of images processed concurrently. Default: 8.
    ///
    /// Per-image work is pure CPU, so there is little point exceeding the
    /// core count; the bound also keeps memory flat on large batches.
    pub concurrency: usize,

    /// Whether deduplication runs across the whole batch or within each
    /// image only. Default: [`DedupScope::CrossImage`].
    pub dedup_scope: DedupScope,

    /// How many leading lines of a free-text blob are scanned for a person
    /// name. Default: 5. Card layouts put the name near the top; scanning
    /// further mostly promotes street names to people.
    pub name_scan_lines: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            name_similarity_floor: 0.8,
            company_similarity_floor: 0.7,
            min_phone_digits: 7,
            concurrency: 8,
            dedup_scope: DedupScope::CrossImage,
            name_scan_lines: 5,
        }
    }
}

impl EngineConfig {
    /// Create a new builder for `EngineConfig`.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn similarity_threshold(mut self, t: f64) -> Self {
        self.config.similarity_threshold = t;
        self
    }

    pub fn name_similarity_floor(mut self, t: f64) -> Self {
        self.config.name_similarity_floor = t;
        self
    }

    pub fn company_similarity_floor(mut self, t: f64) -> Self {
        self.config.company_similarity_floor = t;
        self
    }

    pub fn min_phone_digits(mut self, n: usize) -> Self {
        self.config.min_phone_digits = n.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn dedup_scope(mut self, scope: DedupScope) -> Self {
        self.config.dedup_scope = scope;
        self
    }

    pub fn name_scan_lines(mut self, n: usize) -> Self {
        self.config.name_scan_lines = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EngineConfig, CardexError> {
        let c = &self.config;
        for (label, v) in [
            ("similarity_threshold", c.similarity_threshold),
            ("name_similarity_floor", c.name_similarity_floor),
            ("company_similarity_floor", c.company_similarity_floor),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(CardexError::InvalidConfig(format!(
                    "{label} must be within 0.0–1.0, got {v}"
                )));
            }
        }
        if c.concurrency == 0 {
            return Err(CardexError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

/// Scope of the duplicate-merging pass.
///
/// Cross-image dedup requires a join barrier after all per-image pipelines
/// finish; per-image dedup keeps images fully independent (and is the only
/// mode the streaming API supports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DedupScope {
    /// Merge duplicates across every image in the batch. (default)
    #[default]
    CrossImage,
    /// Merge duplicates only among cards detected in the same image.
    PerImage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::builder().build().unwrap();
        assert_eq!(config.similarity_threshold, 0.7);
        assert_eq!(config.name_similarity_floor, 0.8);
        assert_eq!(config.company_similarity_floor, 0.7);
        assert_eq!(config.min_phone_digits, 7);
        assert_eq!(config.dedup_scope, DedupScope::CrossImage);
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let err = EngineConfig::builder()
            .similarity_threshold(1.5)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("similarity_threshold"));
    }

    #[test]
    fn concurrency_clamped_to_one() {
        let config = EngineConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(config.concurrency, 1);
    }
}
