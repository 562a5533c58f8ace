//! Rule-based field extractors for invoice text.

pub mod amounts;
pub mod dates;
pub mod invoice_number;
pub mod patterns;
pub mod tax;
pub mod vendor;

pub use amounts::{parse_amount, AmountExtractor};
pub use dates::{extract_dates, parse_date, DateExtractor};
pub use invoice_number::InvoiceNumberExtractor;
pub use tax::TaxExtractor;
pub use vendor::{is_valid_vendor_name, most_frequent, VendorExtractor};

/// A rule-based extractor for one invoice field.
pub trait FieldExtractor {
    /// Matched value type.
    type Output;

    /// The match this field resolves to, if any.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Every acceptable match, in the extractor's order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A matched value with the pattern that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Name of the pattern that matched.
    pub pattern: &'static str,
    /// Byte span in the source text.
    pub position: Option<(usize, usize)>,
    /// Full text of the match, label included.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, pattern: &'static str, source: impl Into<String>) -> Self {
        Self {
            value,
            pattern,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
