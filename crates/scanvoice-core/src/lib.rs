//! Core library for scanned invoice processing.
//!
//! This crate provides:
//! - Page decoding for raster images and PDFs (poppler or embedded images)
//! - A multi-variant OCR pipeline with confidence-based candidate selection
//! - Rule-based invoice field extraction with an entity-recognition fallback
//! - Currency conversion over a caller-owned rate cache

pub mod currency;
pub mod error;
pub mod input;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod text;

pub use currency::{convert_amount, lookup_rate, Currency, RateCache};
pub use error::{DecodeError, OcrError, Result, ScanError};
pub use input::{DocumentInput, DocumentKind};
pub use invoice::{
    Entity, EntityLabel, EntityRecognizer, ExtractionResult, InvoiceParser,
    PatternEntityRecognizer,
};
pub use models::{
    ConfidenceTier, ExtractedRecord, ExtractionConfig, Field, FieldCandidate, OcrConfig,
    PdfConfig, ScanConfig,
};
pub use ocr::{
    CancelFlag, DocumentProcessor, DocumentText, PageResult, ProcessingStrategy,
    RecognitionConfig, RecognitionEngine, TesseractEngine,
};
pub use pdf::{PdfBackend, PdfRasterizer};
pub use text::clean_text;
