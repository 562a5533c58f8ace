//! Batch command - process every invoice scan matching a pattern.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use scanvoice_core::DocumentKind;

use super::load_config;
use super::report::{format_report, scan_file, write_summary_csv, OutputFormat, ScanReport};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also write a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = Arc::new(load_config(config_path)?);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| DocumentKind::is_supported_path(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    let mut results: Vec<(String, Result<ScanReport, String>)> = Vec::with_capacity(files.len());

    for path in files {
        let name = path.display().to_string();
        pb.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        let task_config = Arc::clone(&config);
        let task_path = path.clone();
        let outcome = tokio::task::spawn_blocking(move || scan_file(&task_path, &task_config, None, false))
            .await?
            .map_err(|e| e.to_string());

        match &outcome {
            Ok(report) => {
                if let Some(output_dir) = &args.output_dir {
                    let stem = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("invoice");
                    let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));
                    fs::write(&output_path, format_report(report, args.format)?)?;
                    debug!("Wrote output to {}", output_path.display());
                }
            }
            Err(message) if args.continue_on_error => {
                warn!("Failed to process {}: {}", name, message);
            }
            Err(message) => {
                pb.abandon();
                error!("Failed to process {}: {}", name, message);
                anyhow::bail!("Processing failed for {}: {}", name, message);
            }
        }

        results.push((name, outcome));
        pb.inc(1);
    }

    pb.finish_with_message("complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary_csv(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results
        .iter()
        .filter_map(|(name, outcome)| outcome.as_ref().err().map(|e| (name, e)))
        .collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (name, message) in &failed {
            println!("  - {}: {}", name, message);
        }
    }

    Ok(())
}
