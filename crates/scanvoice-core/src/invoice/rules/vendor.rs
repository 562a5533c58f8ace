//! Vendor name candidates and the validity predicate.

use super::patterns::{FORBIDDEN_VENDOR_WORDS, NON_WORD_CHAR, VENDOR_LABEL_PATTERNS};
use super::{ExtractionMatch, FieldExtractor};

/// Pattern name used for the first-line heuristic.
pub const FIRST_LINE: &str = "first_line";

/// Vendor name candidates from labels and the first line of the document.
pub struct VendorExtractor;

impl VendorExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Unfiltered candidates: one per label pattern, then the first
    /// non-empty line.
    pub fn candidates(&self, text: &str) -> Vec<ExtractionMatch<String>> {
        let mut candidates: Vec<ExtractionMatch<String>> = VENDOR_LABEL_PATTERNS
            .iter()
            .filter_map(|(name, pattern)| {
                let caps = pattern.captures(text)?;
                let value = caps.get(1)?;
                Some(
                    ExtractionMatch::new(clean_candidate(value.as_str()), *name, &caps[0])
                        .with_position(value.start(), value.end()),
                )
            })
            .collect();

        if let Some(line) = text.lines().map(str::trim).find(|l| !l.is_empty()) {
            candidates.push(ExtractionMatch::new(clean_candidate(line), FIRST_LINE, line));
        }

        candidates
    }
}

impl Default for VendorExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for VendorExtractor {
    type Output = ExtractionMatch<String>;

    /// The most frequent valid candidate.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let valid = self.extract_all(text);
        let (name, _) = most_frequent(valid.iter().map(|m| m.value.as_str()))?;
        valid.into_iter().find(|m| m.value == name)
    }

    /// Candidates that pass [`is_valid_vendor_name`].
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.candidates(text)
            .into_iter()
            .filter(|m| is_valid_vendor_name(&m.value))
            .collect()
    }
}

fn clean_candidate(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

/// Whether a string is plausible as a vendor name.
///
/// Rejects strings that are shorter than 3 characters, contain a
/// forbidden word such as "invoice" or "total", have no letters, carry more
/// than two punctuation characters, or consist only of digits and symbols.
pub fn is_valid_vendor_name(name: &str) -> bool {
    let name = name.trim();

    if name.chars().count() < 3 {
        return false;
    }

    let lower = name.to_lowercase();
    let has_forbidden = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| FORBIDDEN_VENDOR_WORDS.contains(&token));
    if has_forbidden {
        return false;
    }

    if !name.chars().any(char::is_alphabetic) {
        return false;
    }

    if NON_WORD_CHAR.find_iter(name).count() > 2 {
        return false;
    }

    let only_digits_and_symbols = name
        .chars()
        .all(|c| c.is_ascii_digit() || !(c.is_alphanumeric() || c == '_'));
    !only_digits_and_symbols
}

/// Most frequent value and its count. Ties go to the value seen first.
pub fn most_frequent<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<(String, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (value, count)| match best {
            Some((_, best_count)) if count <= best_count => best,
            _ => Some((value, count)),
        })
        .map(|(value, count)| (value.to_string(), count))
}
