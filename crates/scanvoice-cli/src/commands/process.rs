//! Process command - extract fields from a single invoice scan.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use scanvoice_core::{Currency, DocumentKind, ProcessingStrategy, RateCache};

use super::load_config;
use super::report::{format_report, scan_file, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Processing strategy: full_page or zoned
    #[arg(short, long)]
    strategy: Option<String>,

    /// Rasterization resolution for PDF pages
    #[arg(long)]
    dpi: Option<u32>,

    /// Include the recognized text in the output
    #[arg(long)]
    show_text: bool,

    /// Convert the extracted amount into this currency
    #[arg(long, requires = "currency")]
    convert_to: Option<String>,

    /// Currency the invoice amount is stated in
    #[arg(long, requires = "convert_to")]
    currency: Option<String>,
}

fn parse_currency(code: &str) -> anyhow::Result<Currency> {
    Currency::parse(code).ok_or_else(|| anyhow::anyhow!("Unsupported currency: {}", code))
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(strategy) = &args.strategy {
        config.ocr.strategy = strategy.parse::<ProcessingStrategy>()?;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let kind = DocumentKind::from_path(&args.input)?;

    let conversion = match (&args.currency, &args.convert_to) {
        (Some(from), Some(to)) => Some((parse_currency(from)?, parse_currency(to)?)),
        _ => None,
    };

    info!("Processing {} file: {}", kind, args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Running OCR ({} strategy)...", config.ocr.strategy));

    let input = args.input.clone();
    let (dpi, show_text) = (args.dpi, args.show_text);
    let result = tokio::task::spawn_blocking(move || scan_file(&input, &config, dpi, show_text)).await?;
    pb.finish_and_clear();
    let mut report = result?;

    if let Some((from, to)) = conversion {
        report.convert(&RateCache::new(), from, to);
    }

    let output = format_report(&report, args.format)?;

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

    for warning in &report.warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
