//! Decoding raw input into pages and building enhancement variants.

use std::fmt;

use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::deskew::deskew;
use super::enhance::{
    adaptive_threshold, clahe, denoise, otsu_threshold, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET,
    CLAHE_CLIP_LIMIT, CLAHE_TILES,
};
use crate::error::DecodeError;
use crate::input::{DocumentInput, DocumentKind};
use crate::models::config::ScanConfig;
use crate::pdf::{rasterizer_for, PdfRasterizer};

/// A decoded page of a document.
#[derive(Debug, Clone)]
pub struct Page {
    /// 0-based position in the document.
    pub index: usize,
    pub image: DynamicImage,
}

impl Page {
    pub fn new(index: usize, image: DynamicImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Grayscale copy of the page.
    pub fn gray(&self) -> GrayImage {
        self.image.to_luma8()
    }
}

/// The transforms applied to a page before recognition, in the order they
/// are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementKind {
    Grayscale,
    Denoised,
    GlobalThreshold,
    AdaptiveThreshold,
    Equalized,
}

impl EnhancementKind {
    pub const ALL: [EnhancementKind; 5] = [
        EnhancementKind::Grayscale,
        EnhancementKind::Denoised,
        EnhancementKind::GlobalThreshold,
        EnhancementKind::AdaptiveThreshold,
        EnhancementKind::Equalized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnhancementKind::Grayscale => "grayscale",
            EnhancementKind::Denoised => "denoised",
            EnhancementKind::GlobalThreshold => "global_threshold",
            EnhancementKind::AdaptiveThreshold => "adaptive_threshold",
            EnhancementKind::Equalized => "equalized",
        }
    }

    /// Apply this transform to a grayscale image.
    pub fn apply(&self, gray: &GrayImage) -> GrayImage {
        match self {
            EnhancementKind::Grayscale => gray.clone(),
            EnhancementKind::Denoised => denoise(gray),
            EnhancementKind::GlobalThreshold => otsu_threshold(gray),
            EnhancementKind::AdaptiveThreshold => {
                adaptive_threshold(gray, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET)
            }
            EnhancementKind::Equalized => clahe(gray, CLAHE_TILES, CLAHE_CLIP_LIMIT),
        }
    }
}

impl fmt::Display for EnhancementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An enhanced image ready for recognition.
#[derive(Debug, Clone)]
pub struct EnhancementVariant {
    pub kind: EnhancementKind,
    pub image: GrayImage,
}

/// Turns raw document bytes into pages and pages into variants.
pub struct ImagePreprocessor {
    rasterizer: Box<dyn PdfRasterizer>,
    default_dpi: u32,
    max_pages: usize,
    deskew: bool,
    deskew_tolerance_deg: f32,
}

impl ImagePreprocessor {
    /// Create a preprocessor from configuration.
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            rasterizer: rasterizer_for(&config.pdf),
            default_dpi: config.pdf.render_dpi,
            max_pages: config.pdf.max_pages,
            deskew: config.ocr.enable_deskew,
            deskew_tolerance_deg: config.ocr.deskew_tolerance_deg,
        }
    }

    /// Replace the PDF rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn PdfRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Decode the input into pages, in source order.
    pub fn decode(&self, input: &DocumentInput) -> Result<Vec<Page>, DecodeError> {
        if input.bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let mut images = match input.kind {
            DocumentKind::Image => vec![image::load_from_memory(&input.bytes)?],
            DocumentKind::Pdf => {
                let dpi = input.dpi.unwrap_or(self.default_dpi);
                self.rasterizer.rasterize(&input.bytes, dpi)?
            }
        };

        if images.is_empty() {
            return Err(DecodeError::NoPages);
        }
        if self.max_pages > 0 && images.len() > self.max_pages {
            info!("Limiting document from {} to {} pages", images.len(), self.max_pages);
            images.truncate(self.max_pages);
        }

        Ok(images
            .into_iter()
            .enumerate()
            .map(|(index, image)| Page::new(index, image))
            .collect())
    }

    /// Every enhancement variant of a grayscale image, in fixed order.
    pub fn variants(&self, gray: &GrayImage) -> Vec<EnhancementVariant> {
        EnhancementKind::ALL
            .iter()
            .map(|kind| self.variant(gray, *kind))
            .collect()
    }

    /// One enhancement variant, deskewed when enabled.
    pub fn variant(&self, gray: &GrayImage, kind: EnhancementKind) -> EnhancementVariant {
        let enhanced = kind.apply(gray);
        let image = if self.deskew {
            deskew(&enhanced, self.deskew_tolerance_deg)
        } else {
            enhanced
        };
        debug!("Built {} variant {}x{}", kind, image.width(), image.height());
        EnhancementVariant { kind, image }
    }
}
