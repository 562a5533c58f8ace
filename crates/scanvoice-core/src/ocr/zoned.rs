//! Header, body, and footer band processing.

use image::{imageops, GrayImage};
use tracing::{debug, warn};

use super::engine::RecognitionAttemptRunner;
use super::preprocessing::{ImagePreprocessor, Page};
use super::selector::CandidateSelector;
use super::{PageResult, Zone, ZoneResult};
use crate::error::OcrError;

/// Processes the fixed vertical bands of a page independently.
#[derive(Debug, Clone, Copy)]
pub struct ZonedStrategy {
    selector: CandidateSelector,
}

impl ZonedStrategy {
    pub fn new(selector: CandidateSelector) -> Self {
        Self { selector }
    }

    /// Crop the band of `gray` covered by `zone`.
    pub fn crop(gray: &GrayImage, zone: Zone) -> GrayImage {
        let (width, height) = gray.dimensions();
        let (start, end) = zone.bounds();

        let top = ((height as f32 * start).round() as u32).min(height.saturating_sub(1));
        let bottom = ((height as f32 * end).round() as u32).clamp(top + 1, height.max(top + 1));

        imageops::crop_imm(gray, 0, top, width, bottom - top).to_image()
    }

    /// Process one page zone by zone.
    ///
    /// A failing zone contributes empty text and zero confidence. The page is
    /// exhausted only when every zone fails.
    pub fn process_page(
        &self,
        page: &Page,
        preprocessor: &ImagePreprocessor,
        runner: &RecognitionAttemptRunner<'_>,
    ) -> Result<PageResult, OcrError> {
        let gray = page.gray();
        let mut zones = Vec::with_capacity(Zone::ALL.len());
        let mut failed_attempts = 0;
        let mut recognized = 0;

        for zone in Zone::ALL {
            let band = Self::crop(&gray, zone);
            let variants = preprocessor.variants(&band);
            let unit = format!("page {} {}", page.index + 1, zone);

            match self.selector.best_of(runner, &variants, &[zone.default_config()], &unit) {
                Ok(candidate) => {
                    recognized += 1;
                    zones.push(ZoneResult {
                        zone,
                        text: candidate.text,
                        confidence: candidate.confidence,
                    });
                }
                Err(e) => {
                    warn!("{}: {}", unit, e);
                    if let OcrError::Exhausted { attempts, .. } = e {
                        failed_attempts += attempts;
                    }
                    zones.push(ZoneResult::empty(zone));
                }
            }
        }

        if recognized == 0 {
            return Err(OcrError::Exhausted {
                unit: format!("page {}", page.index + 1),
                attempts: failed_attempts,
            });
        }

        let text = zones
            .iter()
            .map(|z| z.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let confidence = zones.iter().map(|z| z.confidence).sum::<f32>() / zones.len() as f32;
        let word_count = text.split_whitespace().count();

        debug!(
            "Page {}: {} of {} zones recognized, confidence {:.1}",
            page.index + 1,
            recognized,
            zones.len(),
            confidence
        );

        Ok(PageResult {
            page_index: page.index,
            text,
            confidence,
            word_count,
            zones: Some(zones),
            failed: false,
        })
    }
}
