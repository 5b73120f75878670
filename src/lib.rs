//! # cardex
//!
//! Business-card contact extraction and reconciliation.
//!
//! The engine sits downstream of two external collaborators the caller
//! already runs: a vision model that turns a card photo into recognized
//! text or structured fields, and a barcode decoder that turns QR codes
//! into payload strings. `cardex` takes those raw outputs and produces
//! clean, deduplicated contact records:
//!
//! ```text
//!              ┌────────────────────────────────────────────────┐
//!              │                per image (concurrent)           │
//!  payloads ──▶│ decode QR payload ─┐                            │
//!              │                    ├─▶ build record ─▶ accept?  │──┐
//!  vision   ──▶│ extract entities ──┘                            │  │
//!              └────────────────────────────────────────────────┘  │
//!                                                                   ▼
//!                                  fuzzy dedup ◀── all per-image records
//!                                       │
//!                                       ▼
//!                          vCard / CSV / JSON export + quality score
//! ```
//!
//! Two principles drive the design. First, text extracted from the printed
//! card wins over machine-code data: a QR payload only fills fields the
//! vision pass left empty, never overwrites them. Second, one bad image
//! never sinks a batch: per-card failures are folded into the result's
//! error log and the rest of the batch completes.
//!
//! ## Quick start
//!
//! ```no_run
//! use cardex::{process_batch, EngineConfig, ImageInput, VisionInput};
//!
//! # async fn run() -> Result<(), cardex::CardexError> {
//! let images = vec![ImageInput {
//!     label: "card-001.jpg".into(),
//!     vision: VisionInput::Text {
//!         text: "Jane Roe\nACME Corp\njane@acme.com".into(),
//!     },
//!     machine_codes: vec!["https://acme.com".into()],
//! }];
//!
//! let config = EngineConfig::builder()
//!     .similarity_threshold(0.7)
//!     .concurrency(4)
//!     .build()?;
//!
//! let result = process_batch(images, &config).await?;
//! for contact in &result.contacts {
//!     println!("{:?} (quality {})", contact.name, cardex::score_contact(contact));
//! }
//! let vcards = cardex::export_contacts(&result.contacts, cardex::ExportFormat::VCard)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod contact;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod quality;
pub mod stream;

pub use config::{DedupScope, EngineConfig, EngineConfigBuilder};
pub use contact::{MachineCode, ParsedContact, PartialContact, PhoneKind};
pub use error::{CardError, CardexError};
pub use export::{export_contacts, ExportFormat};
pub use output::{BatchResult, BatchStats, ImageOutcome};
pub use pipeline::extract::VisionFields;
pub use process::{process_batch, process_batch_sync, ImageInput, VisionInput};
pub use quality::{assess_contact_quality, score_contact, QualityReport};
pub use stream::{process_stream, OutcomeStream};
