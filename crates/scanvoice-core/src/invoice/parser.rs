//! Invoice parser: rule extractors with an entity fallback for the vendor.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::models::{ConfidenceTier, ExtractedRecord, ExtractionConfig, Field, FieldCandidate};
use crate::ocr::DocumentText;
use crate::text::clean_text;

use super::assembler::RecordAssembler;
use super::entities::{EntityFallbackExtractor, EntityRecognizer, PatternEntityRecognizer};
use super::rules::{
    most_frequent, AmountExtractor, DateExtractor, FieldExtractor, InvoiceNumberExtractor,
    TaxExtractor, VendorExtractor,
};

/// Result of invoice extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Extracted record.
    pub record: ExtractedRecord,
    /// Every value proposed for a field, in the order it was offered.
    pub candidates: Vec<FieldCandidate>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Extracts invoice fields from recognized text.
///
/// Extraction never fails: fields that cannot be found are left empty
/// with a `low` tier and reported in the warnings.
pub struct InvoiceParser {
    config: ExtractionConfig,
    recognizer: Box<dyn EntityRecognizer>,
}

impl InvoiceParser {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            recognizer: Box::new(PatternEntityRecognizer::new()),
        }
    }

    /// Use a different entity recognizer for the vendor fallback.
    pub fn with_entity_recognizer(mut self, recognizer: Box<dyn EntityRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    /// Extract the record from a processed document.
    pub fn extract(&self, document: &DocumentText) -> ExtractedRecord {
        self.parse(&document.text).record
    }

    /// Parse invoice fields from text.
    pub fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let text = clean_text(text);

        info!("Parsing invoice from {} characters of text", text.len());

        let mut assembler = RecordAssembler::new();

        let invoice_number = InvoiceNumberExtractor::new(self.config.min_invoice_number_len);
        if let Some(m) = invoice_number.extract(&text) {
            assembler.offer(FieldCandidate::from_pattern(
                Field::InvoiceNumber,
                m.value,
                m.pattern,
                ConfidenceTier::found(true),
            ));
        }

        let amounts = AmountExtractor::from_bounds(self.config.min_amount, self.config.max_amount);
        if let Some(m) = amounts.extract(&text) {
            assembler.offer(FieldCandidate::from_pattern(
                Field::Amount,
                m.value.to_string(),
                m.pattern,
                ConfidenceTier::found(true),
            ));
        }

        let mut dates = DateExtractor::new().extract_all(&text).into_iter();
        for field in [Field::Date, Field::DueDate] {
            if let Some(m) = dates.next() {
                assembler.offer(FieldCandidate::from_pattern(
                    field,
                    m.value,
                    m.pattern,
                    ConfidenceTier::found(true),
                ));
            }
        }

        if let Some(m) = TaxExtractor::new().extract(&text) {
            assembler.offer(FieldCandidate::from_pattern(
                Field::Tax,
                m.value.to_string(),
                m.pattern,
                ConfidenceTier::found(true),
            ));
        }

        self.offer_vendor(&text, &mut assembler);

        let (record, candidates) = assembler.finish();

        let warnings: Vec<String> = record
            .missing_fields()
            .into_iter()
            .map(|field| format!("Could not extract {}", field))
            .collect();

        let processing_time_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Extracted {} of {} fields in {}ms",
            Field::ALL.len() - warnings.len(),
            Field::ALL.len(),
            processing_time_ms
        );

        ExtractionResult {
            record,
            candidates,
            warnings,
            processing_time_ms,
        }
    }

    fn offer_vendor(&self, text: &str, assembler: &mut RecordAssembler) {
        let valid = VendorExtractor::new().extract_all(text);

        if let Some((name, count)) = most_frequent(valid.iter().map(|m| m.value.as_str())) {
            let tier = if count > 1 {
                ConfidenceTier::High
            } else {
                ConfidenceTier::Medium
            };
            let (winners, others): (Vec<_>, Vec<_>) = valid.into_iter().partition(|m| m.value == name);
            for m in winners.into_iter().chain(others) {
                assembler.offer(FieldCandidate::from_pattern(Field::Vendor, m.value, m.pattern, tier));
            }
            return;
        }

        if !self.config.entity_fallback {
            return;
        }

        debug!("No vendor pattern candidate survived, trying entity recognition");
        let fallback = EntityFallbackExtractor::new(self.recognizer.as_ref());
        let vendor = fallback.extract(text);
        if let Some(name) = vendor.name {
            assembler.offer(FieldCandidate::from_entity(
                Field::Vendor,
                name,
                fallback.recognizer_name(),
                vendor.tier,
            ));
        }
    }
}

impl Default for InvoiceParser {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateSource;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    const SAMPLE: &str = "\
        Northwind Traders
        INVOICE
        Invoice No: NW-2024-118
        Invoice Date: March 1, 2024
        Due Date: March 31, 2024

        Widgets            $50.00
        Sales Tax: $4.00
        Total Due: $1,200.00
        From: Northwind Traders
    ";

    #[test]
    fn test_parse_full_invoice() {
        let result = InvoiceParser::default().parse(SAMPLE);
        let record = &result.record;

        assert_eq!(record.vendor_name.as_deref(), Some("Northwind Traders"));
        assert_eq!(record.invoice_number.as_deref(), Some("NW-2024-118"));
        assert_eq!(record.amount, Some(Decimal::new(120000, 2)));
        assert_eq!(record.date.as_deref(), Some("March 1, 2024"));
        assert_eq!(record.due_date.as_deref(), Some("March 31, 2024"));
        assert_eq!(record.due_date_normalized, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(record.tax_amount, Some(Decimal::new(400, 2)));

        assert_eq!(record.tier(Field::Vendor), ConfidenceTier::High);
        assert_eq!(record.tier(Field::Amount), ConfidenceTier::High);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_missing_fields_are_low_with_warnings() {
        let result = InvoiceParser::default().parse("Acme Corp\nThanks for your business");
        let record = &result.record;

        assert_eq!(record.vendor_name.as_deref(), Some("Acme Corp"));
        assert_eq!(record.tier(Field::Vendor), ConfidenceTier::Medium);
        assert_eq!(record.amount, None);
        assert_eq!(record.tier(Field::InvoiceNumber), ConfidenceTier::Low);
        assert_eq!(result.warnings.len(), 5);
        assert!(result.warnings.contains(&"Could not extract amount".to_string()));
    }

    #[test]
    fn test_entity_fallback_when_patterns_fail() {
        let text = "INVOICE\nShipped by Acme Widgets Inc. on request\nTotal: $10.00";
        let result = InvoiceParser::default().parse(text);

        assert_eq!(result.record.vendor_name.as_deref(), Some("Acme Widgets Inc."));
        assert_eq!(result.record.tier(Field::Vendor), ConfidenceTier::Medium);

        let vendor = result
            .candidates
            .iter()
            .find(|c| c.field == Field::Vendor)
            .unwrap();
        assert_eq!(vendor.source, CandidateSource::Entity("pattern".to_string()));
    }

    #[test]
    fn test_entity_fallback_can_be_disabled() {
        let config = ExtractionConfig {
            entity_fallback: false,
            ..Default::default()
        };
        let text = "INVOICE\nShipped by Acme Widgets Inc. on request";
        let result = InvoiceParser::new(config).parse(text);

        assert_eq!(result.record.vendor_name, None);
        assert_eq!(result.record.tier(Field::Vendor), ConfidenceTier::Low);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let parser = InvoiceParser::default();
        let first = serde_json::to_string(&parser.parse(SAMPLE).record).unwrap();
        let second = serde_json::to_string(&parser.parse(SAMPLE).record).unwrap();
        assert_eq!(first, second);
    }
}
