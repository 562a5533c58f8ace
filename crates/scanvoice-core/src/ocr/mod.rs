//! OCR pipeline: enhancement variants, recognition attempts, and
//! confidence-based candidate selection over pages and zones.

mod aggregator;
mod deskew;
mod engine;
mod enhance;
mod pipeline;
mod preprocessing;
mod selector;
mod tesseract;
mod zoned;

pub use aggregator::PageAggregator;
pub use deskew::{deskew, estimate_skew, rotate};
pub use engine::{AttemptOutcome, RecognitionAttemptRunner, RecognitionEngine};
pub use enhance::{adaptive_threshold, clahe, denoise, otsu_threshold};
pub use pipeline::{CancelFlag, DocumentProcessor};
pub use preprocessing::{EnhancementKind, EnhancementVariant, ImagePreprocessor, Page};
pub use selector::{CandidateSelector, CUE_WORDS};
pub use tesseract::TesseractEngine;
pub use zoned::ZonedStrategy;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// A recognition mode: engine mode plus page segmentation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// OCR engine mode.
    pub oem: u8,
    /// Page segmentation mode.
    pub psm: u8,
}

impl RecognitionConfig {
    pub const fn new(oem: u8, psm: u8) -> Self {
        Self { oem, psm }
    }

    /// Configurations tried per variant on a whole page, in order:
    /// uniform block, fully automatic, single column, automatic with OSD.
    pub fn default_sequence() -> Vec<Self> {
        vec![Self::new(3, 6), Self::new(3, 3), Self::new(3, 4), Self::new(3, 1)]
    }
}

impl fmt::Display for RecognitionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--oem {} --psm {}", self.oem, self.psm)
    }
}

/// One recognized token. `confidence` is `None` when the engine reports
/// it as undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub confidence: Option<f32>,
}

impl Token {
    pub fn new(text: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Raw output of one recognition engine call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub text: String,
    pub tokens: Vec<Token>,
}

impl Recognition {
    /// Mean of the defined token confidences, or `None` if there are none.
    pub fn mean_confidence(&self) -> Option<f32> {
        let defined: Vec<f32> = self.tokens.iter().filter_map(|t| t.confidence).collect();
        if defined.is_empty() {
            return None;
        }
        Some(defined.iter().sum::<f32>() / defined.len() as f32)
    }
}

/// A scored recognition attempt on one (page, zone) unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrCandidate {
    pub text: String,
    /// Mean token confidence in [0, 100].
    pub confidence: f32,
    pub word_count: usize,
    pub variant: EnhancementKind,
    pub config: RecognitionConfig,
    /// Confidence plus any cue-word bonus. Used only for comparison.
    pub adjusted_score: f32,
}

/// Fixed vertical band of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Header,
    Body,
    Footer,
}

impl Zone {
    /// Zones in concatenation order.
    pub const ALL: [Zone; 3] = [Zone::Header, Zone::Body, Zone::Footer];

    /// Vertical extent as fractions of page height. Bands overlap.
    pub fn bounds(&self) -> (f32, f32) {
        match self {
            Zone::Header => (0.0, 0.3),
            Zone::Body => (0.2, 0.8),
            Zone::Footer => (0.7, 1.0),
        }
    }

    /// Recognition configuration used for this band.
    pub fn default_config(&self) -> RecognitionConfig {
        match self {
            Zone::Header => RecognitionConfig::new(3, 1),
            Zone::Body | Zone::Footer => RecognitionConfig::new(3, 6),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Header => "header",
            Zone::Body => "body",
            Zone::Footer => "footer",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best text for one zone of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneResult {
    pub zone: Zone,
    pub text: String,
    pub confidence: f32,
}

impl ZoneResult {
    pub fn empty(zone: Zone) -> Self {
        Self {
            zone,
            text: String::new(),
            confidence: 0.0,
        }
    }
}

/// Best text for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// 0-based page index.
    pub page_index: usize,
    pub text: String,
    pub confidence: f32,
    pub word_count: usize,
    /// Per-zone results when the zoned strategy was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<ZoneResult>>,
    /// Every attempt on this page failed.
    #[serde(default)]
    pub failed: bool,
}

impl PageResult {
    /// Empty, zero-confidence result for a page that produced no candidate.
    pub fn failed(page_index: usize) -> Self {
        Self {
            page_index,
            text: String::new(),
            confidence: 0.0,
            word_count: 0,
            zones: None,
            failed: true,
        }
    }

    pub fn from_candidate(page_index: usize, candidate: OcrCandidate) -> Self {
        Self {
            page_index,
            text: candidate.text,
            confidence: candidate.confidence,
            word_count: candidate.word_count,
            zones: None,
            failed: false,
        }
    }
}

/// Assembled text of a whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentText {
    /// Best page text first, then every page in index order.
    pub text: String,
    /// Mean of the page confidences.
    pub confidence: f32,
    /// Sum of the page word counts.
    pub word_count: usize,
    pub page_count: usize,
    pub best_page: Option<PageResult>,
    pub pages: Vec<PageResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<ZoneResult>>,
}

/// How each page is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStrategy {
    /// All variants and configurations over the whole page.
    #[default]
    FullPage,
    /// Header, body, and footer bands processed independently.
    Zoned,
}

const STRATEGIES: &[(&str, ProcessingStrategy)] = &[
    ("full_page", ProcessingStrategy::FullPage),
    ("full", ProcessingStrategy::FullPage),
    ("zoned", ProcessingStrategy::Zoned),
];

impl FromStr for ProcessingStrategy {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        STRATEGIES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, strategy)| *strategy)
            .ok_or_else(|| ScanError::UnknownStrategy(s.to_string()))
    }
}

impl fmt::Display for ProcessingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStrategy::FullPage => f.write_str("full_page"),
            ProcessingStrategy::Zoned => f.write_str("zoned"),
        }
    }
}
