//! Batch processing command for multiple invoice files.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use invox_core::ocr::EngineKind;
use invox_core::pipeline::{ExtractionJob, InputKind, Orchestrator};

use crate::ledger::{default_export_name, Ledger};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching the input files
    #[arg(required = true)]
    input: String,

    /// OCR engine (tesseract, paddle); defaults to the configured engine
    #[arg(short, long, value_parser = EngineKind::from_str)]
    engine: Option<EngineKind>,

    /// Export the ledger as CSV (default name when no file is given)
    #[arg(long)]
    csv: Option<Option<PathBuf>>,

    /// Export the ledger as JSON (default name when no file is given)
    #[arg(long)]
    json: Option<Option<PathBuf>>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;
    let engine = args.engine.unwrap_or(config.ocr.default_engine);

    // Glob order, supported inputs only
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && InputKind::from_path(p).is_ok())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process with {}",
        style("ℹ").blue(),
        files.len(),
        engine
    );

    let orchestrator = Arc::new(Orchestrator::from_config(&config));

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut ledger = Ledger::new();
    let mut failed: Vec<(PathBuf, String)> = Vec::new();

    // One job at a time; the orchestrator is reused
    for path in files {
        let outcome = ExtractionJob::spawn(Arc::clone(&orchestrator), path.clone(), engine)
            .wait(|message| overall_pb.set_message(message.to_string()))
            .await;

        match outcome {
            Ok(result) => {
                overall_pb.suspend(|| {
                    println!(
                        "{} {} ({} of 10 fields)",
                        style("✓").green(),
                        path.display(),
                        result.fields.filled_count()
                    )
                });
                ledger.push(result);
            }
            Err(reason) => {
                overall_pb.suspend(|| println!("{} {}: {}", style("✗").red(), path.display(), reason));
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), reason);
                    failed.push((path, reason));
                } else {
                    error!("Failed to process {}: {}", path.display(), reason);
                    overall_pb.abandon();
                    anyhow::bail!("Processing failed: {}", reason);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    let now = Local::now();
    let exports = [("csv", args.csv), ("json", args.json)];

    if ledger.is_empty() {
        if exports.iter().any(|(_, path)| path.is_some()) {
            warn!("No data to export!");
            println!("{} No data to export, skipping exports", style("!").yellow());
        }
    } else {
        for (format, path) in exports {
            let Some(path) = path else { continue };
            let path = path.unwrap_or_else(|| PathBuf::from(default_export_name(format, now)));
            match format {
                "csv" => ledger.export_csv(&path)?,
                _ => ledger.export_json(&path)?,
            }
            println!(
                "{} {} written to {}",
                style("✓").green(),
                format.to_uppercase(),
                path.display()
            );
        }
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        ledger.len() + failed.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(ledger.len()).green(),
        style(failed.len()).red()
    );

    let totals = ledger.totals_by_currency();
    if !totals.is_empty() {
        println!();
        println!("{}", style("Totals by currency:").bold());
        for (currency, total) in &totals {
            println!("  {:<8} {}", currency, total);
        }
    }

    if let Some(preview) = ledger.preview()? {
        println!();
        println!("{}", style("Last processed:").bold());
        println!("{}", preview);
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (path, reason) in &failed {
            println!("  - {}: {}", path.display(), reason);
        }
    }

    Ok(())
}
