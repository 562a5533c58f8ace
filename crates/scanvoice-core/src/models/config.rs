//! Configuration structures for the scan pipeline.

use serde::{Deserialize, Serialize};

use crate::ocr::{ProcessingStrategy, RecognitionConfig};
use crate::pdf::PdfBackend;

/// Main configuration for the scanvoice pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF rasterization configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// OCR configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognition language passed to the engine.
    pub language: String,

    /// Path or name of the tesseract binary.
    pub tesseract_path: String,

    /// Recognition configurations tried for every enhancement variant, in order.
    pub recognition_configs: Vec<RecognitionConfig>,

    /// Score added to candidates whose text contains an invoice cue word.
    pub keyword_bonus: f32,

    /// Estimate and correct page skew on each variant.
    pub enable_deskew: bool,

    /// Minimum skew angle (degrees) that triggers a rotation.
    pub deskew_tolerance_deg: f32,

    /// Per-attempt timeout in seconds. `None` waits forever.
    pub attempt_timeout_secs: Option<u64>,

    /// Whole-page or header/body/footer processing.
    pub strategy: ProcessingStrategy,

    /// Process pages of a multi-page document in parallel.
    pub parallel_pages: bool,

    /// Worker count for parallel pages (0 = one per CPU).
    pub max_workers: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            tesseract_path: "tesseract".to_string(),
            recognition_configs: RecognitionConfig::default_sequence(),
            keyword_bonus: 10.0,
            enable_deskew: true,
            deskew_tolerance_deg: 0.5,
            attempt_timeout_secs: Some(60),
            strategy: ProcessingStrategy::FullPage,
            parallel_pages: true,
            max_workers: 0,
        }
    }
}

/// PDF rasterization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// How pages are turned into images.
    pub backend: PdfBackend,

    /// Path or name of the pdftoppm binary.
    pub pdftoppm_path: String,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 400,
            backend: PdfBackend::Poppler,
            pdftoppm_path: "pdftoppm".to_string(),
            max_pages: 0,
        }
    }
}

/// Invoice field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Smallest amount accepted as plausible.
    pub min_amount: f64,

    /// Largest amount accepted as plausible.
    pub max_amount: f64,

    /// Minimum length of an accepted invoice number.
    pub min_invoice_number_len: usize,

    /// Fall back to entity recognition when no vendor pattern matches.
    pub entity_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_amount: 0.01,
            max_amount: 1_000_000.0,
            min_invoice_number_len: 3,
            entity_fallback: true,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{"ocr": {"keyword_bonus": 5.0, "strategy": "zoned"}}"#).unwrap();

        assert_eq!(config.ocr.keyword_bonus, 5.0);
        assert_eq!(config.ocr.strategy, ProcessingStrategy::Zoned);
        assert_eq!(config.ocr.recognition_configs.len(), 4);
        assert_eq!(config.pdf.render_dpi, 400);
        assert_eq!(config.extraction.min_invoice_number_len, 3);
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ScanConfig::default();
        config.pdf.backend = PdfBackend::Embedded;
        config.save(&path).unwrap();

        let loaded = ScanConfig::from_file(&path).unwrap();
        assert_eq!(loaded.pdf.backend, PdfBackend::Embedded);
        assert_eq!(loaded.ocr.language, "eng");
    }
}
