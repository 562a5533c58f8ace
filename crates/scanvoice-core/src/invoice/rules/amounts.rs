//! Amount extraction.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::patterns::AMOUNT_PATTERNS;
use super::{ExtractionMatch, FieldExtractor};

/// Collects every plausible amount and picks the largest.
///
/// A grand total is numerically larger than the line items around it, and
/// the patterns alone cannot tell them apart.
pub struct AmountExtractor {
    min: Decimal,
    max: Decimal,
}

impl AmountExtractor {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Build from the float bounds used in configuration.
    pub fn from_bounds(min: f64, max: f64) -> Self {
        let min = Decimal::try_from(min).unwrap_or(Decimal::new(1, 2));
        let max = Decimal::try_from(max).unwrap_or(Decimal::new(1_000_000, 0));
        Self::new(min, max)
    }

    fn plausible(&self, amount: &Decimal) -> bool {
        *amount >= self.min && *amount <= self.max
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new(Decimal::new(1, 2), Decimal::new(1_000_000, 0))
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    /// The largest plausible amount. Equal amounts keep the earliest match.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text)
            .into_iter()
            .fold(None, |best: Option<Self::Output>, m| match best {
                Some(current) if m.value <= current.value => Some(current),
                _ => Some(m),
            })
    }

    /// Every in-range match of every pattern, pattern by pattern.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for (name, pattern) in AMOUNT_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                let Some(value) = caps.get(1) else {
                    continue;
                };
                let Some(amount) = parse_amount(value.as_str()) else {
                    continue;
                };
                if !self.plausible(&amount) {
                    continue;
                }
                results.push(
                    ExtractionMatch::new(amount, *name, &caps[0]).with_position(value.start(), value.end()),
                );
            }
        }

        results
    }
}

/// Parse `1,234.56`, `$ 99` and similar into a decimal.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' ' | '\u{00a0}'))
        .collect();
    Decimal::from_str(&cleaned).ok()
}
