//! Running one file through the pipeline and rendering the result.

use std::path::Path;

use chrono::Utc;
use console::style;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use scanvoice_core::{
    convert_amount, Currency, DocumentInput, DocumentProcessor, ExtractedRecord, Field,
    InvoiceParser, RateCache, ScanConfig, TesseractEngine,
};

/// Output format for a processed file.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Amount expressed in another currency.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedAmount {
    pub amount: Decimal,
    pub from: Currency,
    pub to: Currency,
}

/// Everything reported for one processed file.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub file: String,
    pub record: ExtractedRecord,
    pub ocr_confidence: f32,
    pub page_count: usize,
    /// 1-based number of the page with the most confident text.
    pub best_page: Option<usize>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_amount: Option<ConvertedAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub processing_time_ms: u64,
}

impl ScanReport {
    /// Convert the extracted amount, returning the cache to keep using.
    pub fn convert(&mut self, cache: &RateCache, from: Currency, to: Currency) -> RateCache {
        let Some(amount) = self.record.amount else {
            self.warnings.push("No amount to convert".to_string());
            return cache.clone();
        };

        let (converted, cache) = convert_amount(cache, amount, from, to, Utc::now());
        match converted {
            Some(converted) => {
                self.converted_amount = Some(ConvertedAmount {
                    amount: converted,
                    from,
                    to,
                })
            }
            None => self
                .warnings
                .push(format!("No exchange rate from {} to {}", from, to)),
        }
        cache
    }
}

/// Decode, recognize and extract one file with the tesseract engine.
pub fn scan_file(
    path: &Path,
    config: &ScanConfig,
    dpi: Option<u32>,
    keep_text: bool,
) -> anyhow::Result<ScanReport> {
    let mut input = DocumentInput::from_path(path)?;
    if let Some(dpi) = dpi {
        input = input.with_dpi(dpi);
    }

    let engine = TesseractEngine::new(&config.ocr);
    if !engine.is_available() {
        anyhow::bail!(
            "tesseract not found at '{}'.\n\n\
             Install tesseract-ocr or set ocr.tesseract_path with 'scanvoice config set'.",
            config.ocr.tesseract_path
        );
    }

    let processor = DocumentProcessor::new(Box::new(engine), config);
    let document = processor.process(&input)?;
    debug!(
        "{}: {} page(s), {} words",
        path.display(),
        document.page_count,
        document.word_count
    );

    let extraction = InvoiceParser::new(config.extraction.clone()).parse(&document.text);

    Ok(ScanReport {
        file: path.display().to_string(),
        record: extraction.record,
        ocr_confidence: document.confidence,
        page_count: document.page_count,
        best_page: document.best_page.as_ref().map(|p| p.page_index + 1),
        warnings: extraction.warnings,
        converted_amount: None,
        text: keep_text.then_some(document.text),
        processing_time_ms: extraction.processing_time_ms,
    })
}

pub fn format_report(report: &ScanReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

const CSV_HEADER: [&str; 9] = [
    "file",
    "vendor_name",
    "invoice_number",
    "amount",
    "date",
    "due_date",
    "tax_amount",
    "ocr_confidence",
    "page_count",
];

fn csv_row(report: &ScanReport) -> [String; 9] {
    let record = &report.record;
    [
        report.file.clone(),
        record.vendor_name.clone().unwrap_or_default(),
        record.invoice_number.clone().unwrap_or_default(),
        record.amount.map(|a| a.to_string()).unwrap_or_default(),
        record.date.clone().unwrap_or_default(),
        record.due_date.clone().unwrap_or_default(),
        record.tax_amount.map(|a| a.to_string()).unwrap_or_default(),
        format!("{:.1}", report.ocr_confidence),
        report.page_count.to_string(),
    ]
}

fn format_csv(report: &ScanReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;
    wtr.write_record(csv_row(report))?;
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

/// Summary CSV over many files; failed files carry only their error.
pub fn write_summary_csv(
    path: &Path,
    rows: &[(String, Result<ScanReport, String>)],
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = CSV_HEADER.to_vec();
    header.insert(1, "status");
    header.push("error");
    wtr.write_record(&header)?;

    for (file, outcome) in rows {
        match outcome {
            Ok(report) => {
                let mut row = csv_row(report).to_vec();
                row.insert(1, "success".to_string());
                row.push(String::new());
                wtr.write_record(&row)?;
            }
            Err(error) => {
                let mut row = vec![String::new(); header.len()];
                row[0] = file.clone();
                row[1] = "error".to_string();
                row[header.len() - 1] = error.clone();
                wtr.write_record(&row)?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

fn format_text(report: &ScanReport) -> String {
    let record = &report.record;
    let value = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let mut output = String::new();

    output.push_str(&format!("{}\n", style(&report.file).bold()));
    output.push_str(&format!(
        "  Pages: {} (best: {}), OCR confidence: {:.1}\n\n",
        report.page_count,
        value(report.best_page.map(|p| p.to_string())),
        report.ocr_confidence
    ));

    let rows = [
        ("Vendor", record.vendor_name.clone(), Field::Vendor),
        ("Invoice", record.invoice_number.clone(), Field::InvoiceNumber),
        ("Amount", record.amount.map(|a| a.to_string()), Field::Amount),
        ("Date", record.date.clone(), Field::Date),
        ("Due", record.due_date.clone(), Field::DueDate),
        ("Tax", record.tax_amount.map(|a| a.to_string()), Field::Tax),
    ];
    for (label, field_value, field) in rows {
        output.push_str(&format!(
            "  {:<8} {} [{}]\n",
            label,
            value(field_value),
            record.tier(field)
        ));
    }

    if let Some(converted) = &report.converted_amount {
        output.push_str(&format!(
            "\n  Converted: {} {} (from {})\n",
            converted.amount, converted.to, converted.from
        ));
    }

    if !report.warnings.is_empty() {
        output.push('\n');
        for warning in &report.warnings {
            output.push_str(&format!("  {} {}\n", style("!").yellow(), warning));
        }
    }

    if let Some(text) = &report.text {
        output.push_str(&format!("\n{}\n{}\n", style("Recognized text:").dim(), text));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ScanReport {
        let mut record = ExtractedRecord::default();
        record.vendor_name = Some("Acme, Inc".to_string());
        record.amount = Some(Decimal::new(1000, 0));

        ScanReport {
            file: "scan.png".to_string(),
            record,
            ocr_confidence: 87.24,
            page_count: 1,
            best_page: Some(1),
            warnings: Vec::new(),
            converted_amount: None,
            text: None,
            processing_time_ms: 3,
        }
    }

    #[test]
    fn test_csv_quotes_and_blanks() {
        let csv = format_report(&report(), OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("file,vendor_name,invoice_number,amount,date,due_date,tax_amount,ocr_confidence,page_count")
        );
        assert_eq!(lines.next(), Some("scan.png,\"Acme, Inc\",,1000,,,,87.2,1"));
    }

    #[test]
    fn test_conversion_adds_amount_or_warning() {
        let mut converted = report();
        let cache = converted.convert(&RateCache::new(), Currency::SAR, Currency::BHD);
        assert_eq!(
            converted.converted_amount.as_ref().map(|c| c.amount),
            Some(Decimal::new(99000, 3))
        );
        assert!(cache.get(Currency::SAR, Currency::BHD).is_some());

        let mut missing = report();
        missing.convert(&cache, Currency::USD, Currency::GBP);
        assert!(missing.converted_amount.is_none());
        assert_eq!(missing.warnings, vec!["No exchange rate from USD to GBP".to_string()]);
    }

    #[test]
    fn test_json_omits_absent_extras() {
        let json = format_report(&report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["record"]["vendor_name"], "Acme, Inc");
        assert!(value.get("text").is_none());
        assert!(value.get("converted_amount").is_none());
    }
}
