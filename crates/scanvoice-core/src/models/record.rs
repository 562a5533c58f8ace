//! Extracted invoice record and per-field confidence.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Coarse reliability of a single extracted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// `High` when a value was found, `Low` otherwise.
    pub fn found(found: bool) -> Self {
        if found { Self::High } else { Self::Low }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

/// Fields of an extracted invoice record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Vendor,
    InvoiceNumber,
    Amount,
    Date,
    DueDate,
    Tax,
}

impl Field {
    /// All fields, in record order.
    pub const ALL: [Field; 6] = [
        Field::Vendor,
        Field::InvoiceNumber,
        Field::Amount,
        Field::Date,
        Field::DueDate,
        Field::Tax,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Vendor => "vendor",
            Field::InvoiceNumber => "invoice_number",
            Field::Amount => "amount",
            Field::Date => "date",
            Field::DueDate => "due_date",
            Field::Tax => "tax",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a field candidate came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum CandidateSource {
    /// A named textual pattern.
    Pattern(String),
    /// A named-entity recognizer.
    Entity(String),
}

/// A value proposed for one field by one extraction stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCandidate {
    pub field: Field,
    pub value: String,
    pub source: CandidateSource,
    pub tier: ConfidenceTier,
}

impl FieldCandidate {
    pub fn from_pattern(
        field: Field,
        value: impl Into<String>,
        pattern: impl Into<String>,
        tier: ConfidenceTier,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            source: CandidateSource::Pattern(pattern.into()),
            tier,
        }
    }

    pub fn from_entity(
        field: Field,
        value: impl Into<String>,
        recognizer: impl Into<String>,
        tier: ConfidenceTier,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            source: CandidateSource::Entity(recognizer.into()),
            tier,
        }
    }
}

/// Structured invoice fields handed to downstream accounting clients.
///
/// Absent fields are `None` with a `low` tier in `confidence_scores`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub vendor_name: Option<String>,
    pub invoice_number: Option<String>,
    pub amount: Option<Decimal>,
    /// Issue date as it appeared in the document.
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub tax_amount: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date_normalized: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date_normalized: Option<NaiveDate>,

    pub confidence_scores: BTreeMap<Field, ConfidenceTier>,
}

impl Default for ExtractedRecord {
    fn default() -> Self {
        Self {
            vendor_name: None,
            invoice_number: None,
            amount: None,
            date: None,
            due_date: None,
            tax_amount: None,
            issue_date_normalized: None,
            due_date_normalized: None,
            confidence_scores: Field::ALL
                .iter()
                .map(|f| (*f, ConfidenceTier::Low))
                .collect(),
        }
    }
}

impl ExtractedRecord {
    /// Confidence tier for a field (`low` if never scored).
    pub fn tier(&self, field: Field) -> ConfidenceTier {
        self.confidence_scores
            .get(&field)
            .copied()
            .unwrap_or(ConfidenceTier::Low)
    }

    /// Names of fields that were not found.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| !self.has(*f))
            .collect()
    }

    /// Whether a value is present for the field.
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Vendor => self.vendor_name.is_some(),
            Field::InvoiceNumber => self.invoice_number.is_some(),
            Field::Amount => self.amount.is_some(),
            Field::Date => self.date.is_some(),
            Field::DueDate => self.due_date.is_some(),
            Field::Tax => self.tax_amount.is_some(),
        }
    }
}
