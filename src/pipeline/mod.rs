//! The per-image extraction pipeline, stage by stage.
//!
//! Each stage is a pure function over in-memory data:
//!
//! ```text
//! machine-code payloads ──▶ machine_code::decode_payload ─┐
//!                                                          ├─▶ build::build_card ─▶ dedup
//! vision output ──▶ extract::{structured, free_text} ─────┘
//! ```
//!
//! `phone` normalization and classification is shared by every stage that
//! touches a number, so the same digit string can never end up in both the
//! mobile and landline sets of a record.

pub mod build;
pub mod dedup;
pub mod extract;
pub mod machine_code;
pub mod phone;
