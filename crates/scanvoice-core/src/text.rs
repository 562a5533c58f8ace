//! Text normalization ahead of field extraction.

use crate::invoice::rules::patterns::HORIZONTAL_SPACE;

/// Collapse runs of horizontal whitespace and trim every line.
///
/// Line breaks are kept: blank lines inside the text survive, leading and
/// trailing blank lines do not.
pub fn clean_text(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| HORIZONTAL_SPACE.replace_all(line, " ").trim().to_string())
        .collect();

    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());

    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}
