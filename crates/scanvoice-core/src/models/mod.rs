//! Data models: configuration and extracted records.

pub mod config;
pub mod record;

pub use config::{ExtractionConfig, OcrConfig, PdfConfig, ScanConfig};
pub use record::{CandidateSource, ConfidenceTier, ExtractedRecord, Field, FieldCandidate};
