//! Invoice number extraction.

use super::patterns::INVOICE_NUMBER_PATTERNS;
use super::{ExtractionMatch, FieldExtractor};

/// Tries labeled patterns before bare fallbacks; the first acceptable
/// match wins.
pub struct InvoiceNumberExtractor {
    min_len: usize,
}

impl InvoiceNumberExtractor {
    pub fn new(min_len: usize) -> Self {
        Self { min_len }
    }
}

impl Default for InvoiceNumberExtractor {
    fn default() -> Self {
        Self::new(3)
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = ExtractionMatch<String>;

    /// First match of each pattern, in priority order. A match shorter than
    /// the minimum length moves on to the next pattern.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        for (name, pattern) in INVOICE_NUMBER_PATTERNS.iter() {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            let Some(value) = caps.get(1) else {
                continue;
            };

            let number = value.as_str().trim();
            if number.chars().count() >= self.min_len {
                return Some(
                    ExtractionMatch::new(number.to_string(), *name, &caps[0])
                        .with_position(value.start(), value.end()),
                );
            }
        }
        None
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        INVOICE_NUMBER_PATTERNS
            .iter()
            .flat_map(|(name, pattern)| {
                pattern.captures_iter(text).filter_map(move |caps| {
                    let value = caps.get(1)?;
                    Some(
                        ExtractionMatch::new(value.as_str().trim().to_string(), *name, &caps[0])
                            .with_position(value.start(), value.end()),
                    )
                })
            })
            .filter(|m| m.value.chars().count() >= self.min_len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Option<String> {
        InvoiceNumberExtractor::default().extract(text).map(|m| m.value)
    }

    #[test]
    fn test_labeled_number_wins_over_hash() {
        let text = "PO #99887\nInvoice No. A-1001\n";
        let found = InvoiceNumberExtractor::default().extract(text).unwrap();
        assert_eq!(found.value, "A-1001");
        assert_eq!(found.pattern, "invoice_label");
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(extract("Ref: 20240117"), Some("20240117".to_string()));
        assert_eq!(extract("INV00421 due soon"), Some("00421".to_string()));
        assert_eq!(extract("Order #12345 shipped"), Some("12345".to_string()));
    }

    #[test]
    fn test_short_values_are_rejected() {
        assert_eq!(extract("Invoice #7"), None);
        assert_eq!(extract("nothing to see"), None);
    }

    #[test]
    fn test_extract_all_keeps_pattern_order() {
        let all = InvoiceNumberExtractor::default().extract_all("Invoice 5001 ref #7002");
        let values: Vec<_> = all.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values.first(), Some(&"5001"));
        assert!(values.contains(&"7002"));
    }
}
