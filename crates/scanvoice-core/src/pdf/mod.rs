//! PDF rasterization: turning each page of a PDF into an image.

mod extractor;
mod poppler;

pub use extractor::EmbeddedImageRasterizer;
pub use poppler::PopplerRasterizer;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::models::config::PdfConfig;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Available page rasterizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfBackend {
    /// Render pages with poppler's `pdftoppm`.
    Poppler,
    /// Pull the scanned page image out of each page with lopdf.
    Embedded,
}

/// Trait for PDF page rasterizers.
pub trait PdfRasterizer: Send + Sync {
    /// Render every page, in page order, at the given resolution.
    fn rasterize(&self, data: &[u8], dpi: u32) -> Result<Vec<DynamicImage>>;
}

/// Build the rasterizer selected by the configuration.
pub fn rasterizer_for(config: &PdfConfig) -> Box<dyn PdfRasterizer> {
    match config.backend {
        PdfBackend::Poppler => Box::new(PopplerRasterizer::new(&config.pdftoppm_path)),
        PdfBackend::Embedded => Box::new(EmbeddedImageRasterizer::new()),
    }
}

/// Check for a `%PDF-` header near the start of the data.
pub(crate) fn looks_like_pdf(data: &[u8]) -> bool {
    let window = &data[..data.len().min(1024)];
    window.windows(5).any(|w| w == b"%PDF-")
}
