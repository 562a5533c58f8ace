//! Tax amount extraction.

use rust_decimal::Decimal;

use super::amounts::parse_amount;
use super::patterns::TAX_PATTERN;
use super::{ExtractionMatch, FieldExtractor};

/// Tax, GST or VAT amount. The first match is taken as is, without range
/// filtering.
pub struct TaxExtractor;

impl TaxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TaxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TaxExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        TAX_PATTERN
            .captures_iter(text)
            .filter_map(|caps| {
                let value = caps.get(1)?;
                let amount = parse_amount(value.as_str())?;
                Some(ExtractionMatch::new(amount, "tax", &caps[0]).with_position(value.start(), value.end()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_labels() {
        let extractor = TaxExtractor::new();
        assert_eq!(
            extractor.extract("Subtotal $100.00\nSales Tax: $8.25\nTotal $108.25").map(|m| m.value),
            Some(Decimal::new(825, 2))
        );
        assert_eq!(
            extractor.extract("GST 1,050.00").map(|m| m.value),
            Some(Decimal::new(105000, 2))
        );
        assert_eq!(
            extractor.extract("VAT amount: 0.00").map(|m| m.value),
            Some(Decimal::ZERO)
        );
        assert!(extractor.extract("Total $108.25").is_none());
    }
}
