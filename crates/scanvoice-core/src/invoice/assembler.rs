//! Combines field candidates into an [`ExtractedRecord`].

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::trace;

use crate::models::{ExtractedRecord, Field, FieldCandidate};

use super::rules::parse_date;

/// Accumulates candidates; the first accepted value of a field is final.
///
/// Never fails. Fields nobody offered stay `None` with a `low` tier.
#[derive(Debug, Default)]
pub struct RecordAssembler {
    record: ExtractedRecord,
    candidates: Vec<FieldCandidate>,
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate. Returns whether it was taken.
    ///
    /// Every offer is kept in the candidate list, taken or not. A value that
    /// does not parse for its field (a non-numeric amount) is not taken.
    pub fn offer(&mut self, candidate: FieldCandidate) -> bool {
        let accepted = !self.record.has(candidate.field) && self.apply(&candidate);
        if accepted {
            self.record
                .confidence_scores
                .insert(candidate.field, candidate.tier);
        } else {
            trace!("Candidate for {} not taken: {:?}", candidate.field, candidate.value);
        }
        self.candidates.push(candidate);
        accepted
    }

    fn apply(&mut self, candidate: &FieldCandidate) -> bool {
        let value = candidate.value.trim();
        match candidate.field {
            Field::Vendor => self.record.vendor_name = Some(value.to_string()),
            Field::InvoiceNumber => self.record.invoice_number = Some(value.to_string()),
            Field::Amount => match Decimal::from_str(value) {
                Ok(amount) => self.record.amount = Some(amount),
                Err(_) => return false,
            },
            Field::Tax => match Decimal::from_str(value) {
                Ok(tax) => self.record.tax_amount = Some(tax),
                Err(_) => return false,
            },
            Field::Date => {
                self.record.date = Some(value.to_string());
                self.record.issue_date_normalized = parse_date(value);
            }
            Field::DueDate => {
                self.record.due_date = Some(value.to_string());
                self.record.due_date_normalized = parse_date(value);
            }
        }
        true
    }

    /// Current state of the record.
    pub fn record(&self) -> &ExtractedRecord {
        &self.record
    }

    pub fn finish(self) -> (ExtractedRecord, Vec<FieldCandidate>) {
        (self.record, self.candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfidenceTier;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_value_is_final() {
        let mut assembler = RecordAssembler::new();
        assert!(assembler.offer(FieldCandidate::from_pattern(
            Field::Vendor,
            "Acme Corp",
            "from_label",
            ConfidenceTier::Medium,
        )));
        assert!(!assembler.offer(FieldCandidate::from_entity(
            Field::Vendor,
            "Globex Ltd",
            "pattern",
            ConfidenceTier::High,
        )));

        let (record, candidates) = assembler.finish();
        assert_eq!(record.vendor_name.as_deref(), Some("Acme Corp"));
        assert_eq!(record.tier(Field::Vendor), ConfidenceTier::Medium);
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_dates_are_normalized() {
        let mut assembler = RecordAssembler::new();
        assembler.offer(FieldCandidate::from_pattern(
            Field::Date,
            "March 1, 2024",
            "month_name",
            ConfidenceTier::High,
        ));
        assembler.offer(FieldCandidate::from_pattern(
            Field::DueDate,
            "someday",
            "numeric",
            ConfidenceTier::High,
        ));

        let record = assembler.record();
        assert_eq!(record.issue_date_normalized, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(record.due_date.as_deref(), Some("someday"));
        assert_eq!(record.due_date_normalized, None);
    }

    #[test]
    fn test_unparseable_amount_is_rejected() {
        let mut assembler = RecordAssembler::new();
        assert!(!assembler.offer(FieldCandidate::from_pattern(
            Field::Amount,
            "twelve",
            "dollar",
            ConfidenceTier::High,
        )));
        assert!(assembler.offer(FieldCandidate::from_pattern(
            Field::Amount,
            "12.50",
            "dollar",
            ConfidenceTier::High,
        )));

        let (record, _) = assembler.finish();
        assert_eq!(record.amount, Some(Decimal::new(1250, 2)));
        assert_eq!(record.tier(Field::Amount), ConfidenceTier::High);
        assert_eq!(record.tier(Field::Tax), ConfidenceTier::Low);
    }
}
