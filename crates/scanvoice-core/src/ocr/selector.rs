//! Scoring and selection of recognition candidates.

use tracing::{debug, warn};

use super::engine::{AttemptOutcome, RecognitionAttemptRunner};
use super::{EnhancementVariant, OcrCandidate, RecognitionConfig};
use crate::error::OcrError;

/// Words whose presence suggests the text came from an invoice.
pub const CUE_WORDS: [&str; 5] = ["invoice", "total", "amount", "date", "payment"];

/// Picks the best candidate for one page or zone.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSelector {
    keyword_bonus: f32,
}

impl CandidateSelector {
    pub fn new(keyword_bonus: f32) -> Self {
        Self { keyword_bonus }
    }

    /// Whether the text contains any cue word, ignoring case.
    pub fn has_cue_word(text: &str) -> bool {
        let lower = text.to_lowercase();
        CUE_WORDS.iter().any(|word| lower.contains(word))
    }

    /// Comparison score: confidence plus the bonus for cue words.
    ///
    /// May exceed 100. It is never reported as a confidence.
    pub fn score(&self, candidate: &OcrCandidate) -> f32 {
        if Self::has_cue_word(&candidate.text) {
            candidate.confidence + self.keyword_bonus
        } else {
            candidate.confidence
        }
    }

    /// Pick the highest-scoring candidate among `outcomes`.
    ///
    /// Ties keep the earliest candidate. Fails with `Exhausted` when no
    /// attempt produced a candidate.
    pub fn select<I>(&self, outcomes: I, unit: &str) -> Result<OcrCandidate, OcrError>
    where
        I: IntoIterator<Item = AttemptOutcome>,
    {
        let mut attempts = 0;
        let mut failures = 0;
        let mut best: Option<OcrCandidate> = None;

        for outcome in outcomes {
            attempts += 1;
            let mut candidate = match outcome {
                AttemptOutcome::Recognized(candidate) => candidate,
                AttemptOutcome::Empty => continue,
                AttemptOutcome::Failed(_) => {
                    failures += 1;
                    continue;
                }
            };

            candidate.adjusted_score = self.score(&candidate);
            let better = best
                .as_ref()
                .is_none_or(|current| candidate.adjusted_score > current.adjusted_score);
            if better {
                best = Some(candidate);
            }
        }

        match best {
            Some(candidate) => {
                debug!(
                    "{}: selected {} ({}) with score {:.1} of {} attempts",
                    unit, candidate.variant, candidate.config, candidate.adjusted_score, attempts
                );
                Ok(candidate)
            }
            None => {
                warn!("{}: no usable candidate ({} attempts, {} failed)", unit, attempts, failures);
                Err(OcrError::Exhausted {
                    unit: unit.to_string(),
                    attempts,
                })
            }
        }
    }

    /// Try every config on every variant, in order, and pick the best.
    pub fn best_of(
        &self,
        runner: &RecognitionAttemptRunner<'_>,
        variants: &[EnhancementVariant],
        configs: &[RecognitionConfig],
        unit: &str,
    ) -> Result<OcrCandidate, OcrError> {
        let outcomes = variants
            .iter()
            .flat_map(|variant| configs.iter().map(move |config| runner.attempt(variant, config)));
        self.select(outcomes, unit)
    }
}
