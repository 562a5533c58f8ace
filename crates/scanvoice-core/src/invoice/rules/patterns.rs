//! Regex patterns for invoice field extraction, in priority order.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice numbers. Values must contain a digit, optionally after a
    // letter prefix such as `INV-`.
    pub static ref INVOICE_NUMBER_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("invoice_label", Regex::new(
            r"(?i)\binvoice[ \t]*(?:no\.?|number|num\.?)?[ \t]*#?[ \t]*[:.]?[ \t]*([A-Za-z]*[-/]?\d\w*(?:[-/]\w+)*)"
        ).unwrap()),
        ("inv_label", Regex::new(
            r"(?i)\binv[ \t]*(?:no\.?)?[ \t]*#?[ \t]*[:.]?[ \t]*([A-Za-z]*[-/]?\d\w*(?:[-/]\w+)*)"
        ).unwrap()),
        ("bill_label", Regex::new(
            r"(?i)\bbill[ \t]*(?:no\.?|number)?[ \t]*#?[ \t]*[:.]?[ \t]*([A-Za-z]*[-/]?\d\w*(?:[-/]\w+)*)"
        ).unwrap()),
        ("reference_label", Regex::new(
            r"(?i)\b(?:reference|ref)[ \t]*(?:no\.?|number)?[ \t]*#?[ \t]*[:.]?[ \t]*([A-Za-z]*[-/]?\d\w*(?:[-/]\w+)*)"
        ).unwrap()),
        ("document_label", Regex::new(
            r"(?i)\bdocument[ \t]*(?:no\.?|number)?[ \t]*#?[ \t]*[:.]?[ \t]*([A-Za-z]*[-/]?\d\w*(?:[-/]\w+)*)"
        ).unwrap()),
        ("inv_prefix", Regex::new(r"(?i)\binv[^a-z0-9\n]*(\d{3,})").unwrap()),
        ("ref_prefix", Regex::new(r"(?i)\bref[^a-z0-9\n]*(\d{3,})").unwrap()),
        ("hash_number", Regex::new(r"#[ \t]*(\d{3,})").unwrap()),
    ];

    // Amounts. Every match of every pattern is a candidate.
    pub static ref AMOUNT_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("dollar", Regex::new(
            r"\$[ \t]*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?)"
        ).unwrap()),
        ("total_dollar", Regex::new(
            r"(?i)\btotal[ \t:]*\$[ \t]*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?)"
        ).unwrap()),
        ("amount_due", Regex::new(
            r"(?i)\bamount[ \t]+due[ \t:]*\$[ \t]*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?)"
        ).unwrap()),
        ("balance", Regex::new(
            r"(?i)\bbalance(?:[ \t]+due)?[ \t:]*\$[ \t]*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?)"
        ).unwrap()),
        ("total_plain", Regex::new(
            r"(?i)\btotal:?[ \t]*((?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2})\b"
        ).unwrap()),
        ("due_plain", Regex::new(
            r"(?i)\bdue:?[ \t]*((?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2})\b"
        ).unwrap()),
    ];

    // Dates. Matches from all patterns are merged in document order.
    pub static ref DATE_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("month_name", Regex::new(
            r"(?i)\b((?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[ \t]+\d{1,2}(?:st|nd|rd|th)?,?[ \t]+\d{4})\b"
        ).unwrap()),
        ("numeric", Regex::new(r"\b(\d{1,2}[-/]\d{1,2}[-/](?:\d{4}|\d{2}))\b").unwrap()),
        ("iso", Regex::new(r"\b(\d{4}[-/]\d{1,2}[-/]\d{1,2})\b").unwrap()),
    ];

    pub static ref TAX_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:tax|gst|vat)(?:[ \t]+amount)?[ \t:]*\$?[ \t]*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?)"
    ).unwrap();

    // Vendor labels. Values stop at the end of the line.
    pub static ref VENDOR_LABEL_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("from_label", Regex::new(r"(?i)\bfrom:[ \t]*([A-Za-z0-9 \t&.,'-]+)").unwrap()),
        ("vendor_label", Regex::new(r"(?i)\bvendor:[ \t]*([A-Za-z0-9 \t&.,'-]+)").unwrap()),
        ("bill_from_label", Regex::new(r"(?i)\bbill[ \t]+from:[ \t]*([A-Za-z0-9 \t&.,'-]+)").unwrap()),
        ("payable_to_label", Regex::new(r"(?i)\bpayable[ \t]+to:[ \t]*([A-Za-z0-9 \t&.,'-]+)").unwrap()),
    ];

    // Capitalized word runs ending in a corporate suffix.
    pub static ref ORGANIZATION_PATTERN: Regex = Regex::new(
        r"\b((?:[A-Z][\w&'-]*\.?[ \t]+(?:&[ \t]+)?){1,5}(?:Inc|LLC|Ltd|Limited|Corp|Corporation|Co|Company|GmbH|PLC|LLP|Group|Holdings|Industries|Enterprises)\b\.?)"
    ).unwrap();

    pub static ref NON_WORD_CHAR: Regex = Regex::new(r"[^\w\s]").unwrap();

    pub static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t\u{00a0}]+").unwrap();
}

/// Words that never appear in a vendor name.
pub const FORBIDDEN_VENDOR_WORDS: [&str; 12] = [
    "invoice", "statement", "bill", "date", "page", "total", "amount", "balance", "payment",
    "due", "ref", "number",
];
