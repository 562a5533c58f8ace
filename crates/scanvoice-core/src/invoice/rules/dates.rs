//! Date extraction and normalization.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;

use super::patterns::DATE_PATTERNS;
use super::{ExtractionMatch, FieldExtractor};

lazy_static! {
    static ref ORDINAL_SUFFIX: Regex = Regex::new(r"(?i)(\d)(?:st|nd|rd|th)\b").unwrap();
}

/// Earliest year accepted as a four-digit `%Y` field.
const MIN_YEAR: i32 = 1000;

/// Formats tried by [`parse_date`], in order.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%Y/%m/%d",
];

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// Matches of all patterns in document order. A match overlapping an
    /// earlier one is dropped.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut matches: Vec<Self::Output> = DATE_PATTERNS
            .iter()
            .flat_map(|(name, pattern)| {
                pattern.captures_iter(text).filter_map(move |caps| {
                    let value = caps.get(1)?;
                    Some(
                        ExtractionMatch::new(value.as_str().trim().to_string(), *name, value.as_str())
                            .with_position(value.start(), value.end()),
                    )
                })
            })
            .collect();

        matches.sort_by_key(|m| m.position.map(|(start, _)| start).unwrap_or(usize::MAX));

        let mut kept: Vec<Self::Output> = Vec::with_capacity(matches.len());
        for m in matches {
            let overlaps = match (kept.last().and_then(|k| k.position), m.position) {
                (Some((_, last_end)), Some((start, _))) => start < last_end,
                _ => false,
            };
            if !overlaps {
                kept.push(m);
            }
        }
        kept
    }
}

/// First two dates in the text: issue date and due date.
pub fn extract_dates(text: &str) -> (Option<String>, Option<String>) {
    let mut dates = DateExtractor::new().extract_all(text).into_iter().map(|m| m.value);
    let issue = dates.next();
    let due = dates.next();
    (issue, due)
}

/// Parse a date as printed on an invoice.
///
/// Two-digit years such as `03/01/24` are not normalized.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL_SUFFIX.replace_all(s.trim(), "$1");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = cleaned.replacen('.', "", 1);

    DATE_FORMATS
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(&cleaned, format).ok())
        .find(|date| date.year() >= MIN_YEAR)
}
