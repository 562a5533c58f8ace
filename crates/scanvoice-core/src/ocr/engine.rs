//! Recognition engine seam and the per-attempt runner.

use image::GrayImage;
use tracing::{debug, warn};

use super::{EnhancementVariant, OcrCandidate, Recognition, RecognitionConfig};
use crate::error::OcrError;

/// Something that turns a grayscale image into text with token confidences.
pub trait RecognitionEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognize text in `image` using `config`.
    fn recognize(&self, image: &GrayImage, config: &RecognitionConfig) -> Result<Recognition, OcrError>;
}

/// Result of one (variant, config) attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The engine produced text with at least one defined confidence.
    Recognized(OcrCandidate),
    /// The engine returned no usable confidences.
    Empty,
    /// The engine failed or timed out.
    Failed(OcrError),
}

impl AttemptOutcome {
    pub fn candidate(self) -> Option<OcrCandidate> {
        match self {
            AttemptOutcome::Recognized(candidate) => Some(candidate),
            _ => None,
        }
    }
}

/// Runs single recognition attempts and turns them into candidates.
pub struct RecognitionAttemptRunner<'a> {
    engine: &'a dyn RecognitionEngine,
}

impl<'a> RecognitionAttemptRunner<'a> {
    pub fn new(engine: &'a dyn RecognitionEngine) -> Self {
        Self { engine }
    }

    /// Run one attempt. Engine errors are returned as values, never raised.
    pub fn attempt(&self, variant: &EnhancementVariant, config: &RecognitionConfig) -> AttemptOutcome {
        let recognition = match self.engine.recognize(&variant.image, config) {
            Ok(recognition) => recognition,
            Err(e) => {
                warn!(
                    "{} failed on {} variant ({}): {}",
                    self.engine.name(),
                    variant.kind,
                    config,
                    e
                );
                return AttemptOutcome::Failed(e);
            }
        };

        let Some(mean) = recognition.mean_confidence() else {
            debug!("{} variant ({}) produced no confidences", variant.kind, config);
            return AttemptOutcome::Empty;
        };

        let confidence = mean.clamp(0.0, 100.0);
        let text = recognition.text.trim().to_string();
        let word_count = text.split_whitespace().count();

        debug!(
            "{} variant ({}): confidence {:.1}, {} words",
            variant.kind, config, confidence, word_count
        );

        AttemptOutcome::Recognized(OcrCandidate {
            text,
            confidence,
            word_count,
            variant: variant.kind,
            config: *config,
            adjusted_score: confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{EnhancementKind, Token};

    struct FixedEngine(Result<Recognition, String>);

    impl RecognitionEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(&self, _: &GrayImage, _: &RecognitionConfig) -> Result<Recognition, OcrError> {
            self.0.clone().map_err(OcrError::Engine)
        }
    }

    fn variant() -> EnhancementVariant {
        EnhancementVariant {
            kind: EnhancementKind::Denoised,
            image: GrayImage::new(4, 4),
        }
    }

    #[test]
    fn test_attempt_builds_candidate() {
        let engine = FixedEngine(Ok(Recognition {
            text: "  Invoice 42\n".to_string(),
            tokens: vec![
                Token::new("Invoice", Some(88.0)),
                Token::new("42", Some(92.0)),
                Token::new("", None),
            ],
        }));
        let config = RecognitionConfig::new(3, 4);

        let candidate = RecognitionAttemptRunner::new(&engine)
            .attempt(&variant(), &config)
            .candidate()
            .unwrap();

        assert_eq!(candidate.text, "Invoice 42");
        assert_eq!(candidate.confidence, 90.0);
        assert_eq!(candidate.word_count, 2);
        assert_eq!(candidate.variant, EnhancementKind::Denoised);
        assert_eq!(candidate.config, config);
    }

    #[test]
    fn test_attempt_without_confidences_is_empty() {
        let engine = FixedEngine(Ok(Recognition {
            text: String::new(),
            tokens: vec![Token::new("", None)],
        }));
        let outcome = RecognitionAttemptRunner::new(&engine).attempt(&variant(), &RecognitionConfig::new(3, 6));
        assert!(matches!(outcome, AttemptOutcome::Empty));
    }

    #[test]
    fn test_engine_error_becomes_failed_outcome() {
        let engine = FixedEngine(Err("boom".to_string()));
        let outcome = RecognitionAttemptRunner::new(&engine).attempt(&variant(), &RecognitionConfig::new(3, 6));
        assert!(matches!(outcome, AttemptOutcome::Failed(OcrError::Engine(ref m)) if m == "boom"));
    }
}
