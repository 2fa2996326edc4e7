//! Process command - extract fields from a single invoice file.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use invox_core::ocr::EngineKind;
use invox_core::pipeline::{ExtractionJob, Orchestrator};

use crate::ledger::{Ledger, LedgerEntry};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// OCR engine (tesseract, paddle); defaults to the configured engine
    #[arg(short, long, value_parser = EngineKind::from_str)]
    engine: Option<EngineKind>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;
    let engine = args.engine.unwrap_or(config.ocr.default_engine);

    info!("Processing file: {} with {}", args.input.display(), engine);

    let orchestrator = Arc::new(Orchestrator::from_config(&config));
    let pb = super::spinner()?;

    let outcome = ExtractionJob::spawn(orchestrator, args.input.clone(), engine)
        .wait(|message| pb.set_message(message.to_string()))
        .await;

    let result = match outcome {
        Ok(result) => {
            pb.finish_and_clear();
            result
        }
        Err(reason) => {
            pb.abandon_with_message(format!("{}", style("Failed").red()));
            anyhow::bail!("Processing failed: {}", reason);
        }
    };

    let mut ledger = Ledger::new();
    ledger.push(result);

    let output = format_ledger(&ledger, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_ledger(ledger: &Ledger, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => match ledger.last() {
            Some(entry) => Ok(serde_json::to_string_pretty(&entry.record())?),
            None => Ok(String::new()),
        },
        OutputFormat::Csv => ledger.to_csv(),
        OutputFormat::Text => Ok(ledger.iter().map(format_text).collect::<Vec<_>>().join("\n")),
    }
}

fn format_text(entry: &LedgerEntry) -> String {
    let result = &entry.result;
    let mut output = String::new();

    output.push_str(&format!("File:   {}\n", result.file_name()));
    output.push_str(&format!(
        "Engine: {} ({} page(s))\n",
        result.engine, result.pages_processed
    ));
    output.push('\n');

    for (name, value) in result.fields.iter() {
        let shown = if value.is_empty() { "-" } else { value };
        // Multi-line values (addresses) are indented under their label
        let shown = shown.replace('\n', "\n                  ");
        output.push_str(&format!("{:<16}  {}\n", name.as_str(), shown));
    }

    output
}
