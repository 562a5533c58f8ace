//! Error types for the scanvoice-core library.

use thiserror::Error;

/// Main error type for the scanvoice library.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Input bytes could not be read as the declared kind.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// The declared content type is not one we handle.
    #[error("unsupported document kind: {0}")]
    UnsupportedKind(String),

    /// Unknown processing strategy name.
    #[error("unknown processing strategy: {0}")]
    UnknownStrategy(String),

    /// Processing was cancelled between pages.
    #[error("processing cancelled")]
    Cancelled,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning raw bytes into page images.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Bytes are not a readable image.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// Bytes are not a readable PDF.
    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Page rasterization failed.
    #[error("failed to rasterize page: {0}")]
    Rasterizer(String),

    /// No bytes were supplied.
    #[error("empty input")]
    Empty,
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The recognition engine failed on an attempt.
    #[error("recognition failed: {0}")]
    Engine(String),

    /// The recognition engine did not finish within the attempt timeout.
    #[error("recognition timed out after {0}s")]
    Timeout(u64),

    /// The recognition engine binary or library is missing.
    #[error("recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Every (variant, config) attempt for a unit failed or came back empty.
    #[error("all {attempts} OCR attempts failed for {unit}")]
    Exhausted { unit: String, attempts: usize },

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),
}

impl OcrError {
    /// Whether this error means every attempt was used up.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, OcrError::Exhausted { .. })
    }
}

/// Result type for the scanvoice library.
pub type Result<T> = std::result::Result<T, ScanError>;
