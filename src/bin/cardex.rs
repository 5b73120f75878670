//! CLI binary for cardex.
//!
//! A thin shim over the library crate that reads a batch description from
//! JSON, maps CLI flags to `EngineConfig`, and prints exported contacts.

use anyhow::{Context, Result};
use cardex::{
    assess_contact_quality, export_contacts, process_batch, DedupScope, EngineConfig, ExportFormat,
    ImageInput,
};
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Export a batch as vCards (stdout)
  cardex batch.json

  # CSV export to a file
  cardex batch.json --format csv -o contacts.csv

  # Stricter duplicate merging, with per-contact quality report
  cardex batch.json --threshold 0.85 --quality

  # Read the batch description from stdin
  cat batch.json | cardex -

INPUT FORMAT (JSON array, one entry per image):
  [
    {
      "label": "card-001.jpg",
      "vision": { "mode": "text", "text": "Jane Roe\nACME Corp\n..." },
      "machine_codes": ["BEGIN:VCARD\n..."]
    },
    {
      "label": "card-002.jpg",
      "vision": { "mode": "structured", "cards": [ { "name": "...", ... } ] }
    },
    {
      "label": "card-003.jpg",
      "vision": { "mode": "failed", "reason": "vision call timed out" }
    }
  ]

The vision text / structured fields and the decoded machine-code payloads
come from whatever OCR and barcode tools the caller runs upstream; cardex
only reconciles their output into contact records.
"#;

/// Extract and reconcile contact records from business-card vision output.
#[derive(Parser, Debug)]
#[command(
    name = "cardex",
    version,
    about = "Extract and reconcile contact records from business-card vision output",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Batch description file (JSON array of image inputs), or `-` for stdin.
    input: String,

    /// Write exported contacts to this file instead of stdout.
    #[arg(short, long, env = "CARDEX_OUTPUT")]
    output: Option<PathBuf>,

    /// Export format: vcard, csv, json.
    #[arg(short, long, env = "CARDEX_FORMAT", value_enum, default_value = "vcard")]
    format: FormatArg,

    /// Similarity threshold for merging duplicate records (0.0–1.0).
    #[arg(short, long, env = "CARDEX_THRESHOLD", default_value_t = 0.7)]
    threshold: f64,

    /// Deduplicate within each image only, never across images.
    #[arg(long, env = "CARDEX_PER_IMAGE")]
    per_image: bool,

    /// Number of images processed concurrently.
    #[arg(short, long, env = "CARDEX_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Print a per-contact quality report to stderr.
    #[arg(short, long, env = "CARDEX_QUALITY")]
    quality: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CARDEX_VERBOSE")]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Vcard,
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Vcard => ExportFormat::VCard,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read batch description ───────────────────────────────────────────
    let raw = if cli.input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read batch description from stdin")?;
        buf
    } else {
        std::fs::read_to_string(&cli.input)
            .with_context(|| format!("Failed to read batch description from {}", cli.input))?
    };
    let images: Vec<ImageInput> =
        serde_json::from_str(&raw).context("Invalid batch description JSON")?;

    // ── Build config and run ─────────────────────────────────────────────
    let config = build_config(&cli)?;
    let result = process_batch(images, &config)
        .await
        .context("Batch processing failed")?;

    for error in &result.errors {
        eprintln!("  {} {}", red("✗"), error);
    }

    if cli.quality {
        for contact in &result.contacts {
            let report = assess_contact_quality(contact);
            let label = contact
                .name
                .as_deref()
                .or(contact.company.as_deref())
                .unwrap_or("(unnamed)");
            eprintln!("  {} {}", bold(&format!("{:>3}", report.score)), label);
            for issue in &report.issues {
                eprintln!("      {}", dim(issue));
            }
        }
    }

    // ── Export ───────────────────────────────────────────────────────────
    let exported = export_contacts(&result.contacts, cli.format.clone().into())
        .context("Export failed")?;

    if let Some(ref path) = cli.output {
        std::fs::write(path, &exported)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!(
            "{} {} contacts from {} images ({} merged) → {}",
            green("✔"),
            result.contacts.len(),
            result.stats.images_total,
            result.stats.cards_merged,
            bold(&path.display().to_string()),
        );
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(exported.as_bytes())
            .context("Failed to write to stdout")?;
        if !exported.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        eprintln!(
            "{} {} contacts from {} images  {}ms",
            green("✔"),
            result.contacts.len(),
            result.stats.images_total,
            result.stats.duration_ms,
        );
    }

    Ok(())
}

/// Map CLI args to `EngineConfig`.
fn build_config(cli: &Cli) -> Result<EngineConfig> {
    let scope = if cli.per_image {
        DedupScope::PerImage
    } else {
        DedupScope::CrossImage
    };
    EngineConfig::builder()
        .similarity_threshold(cli.threshold)
        .concurrency(cli.concurrency)
        .dedup_scope(scope)
        .build()
        .context("Invalid configuration")
}
