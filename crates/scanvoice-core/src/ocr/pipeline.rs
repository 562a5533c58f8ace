//! Document processing: decode, enhance, recognize, select, aggregate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use super::aggregator::PageAggregator;
use super::engine::{RecognitionAttemptRunner, RecognitionEngine};
use super::preprocessing::{ImagePreprocessor, Page};
use super::selector::CandidateSelector;
use super::zoned::ZonedStrategy;
use super::{DocumentText, PageResult, ProcessingStrategy, RecognitionConfig};
use crate::error::{OcrError, Result, ScanError};
use crate::input::{DocumentInput, DocumentKind};
use crate::models::config::ScanConfig;
use crate::pdf::PdfRasterizer;

/// Shared cancellation flag, checked before each page starts.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Turns a document into text using a recognition engine.
pub struct DocumentProcessor {
    engine: Box<dyn RecognitionEngine>,
    preprocessor: ImagePreprocessor,
    selector: CandidateSelector,
    configs: Vec<RecognitionConfig>,
    strategy: ProcessingStrategy,
    parallel: bool,
    max_workers: usize,
}

impl DocumentProcessor {
    /// Create a processor from an engine and configuration.
    pub fn new(engine: Box<dyn RecognitionEngine>, config: &ScanConfig) -> Self {
        let configs = if config.ocr.recognition_configs.is_empty() {
            RecognitionConfig::default_sequence()
        } else {
            config.ocr.recognition_configs.clone()
        };

        Self {
            engine,
            preprocessor: ImagePreprocessor::new(config),
            selector: CandidateSelector::new(config.ocr.keyword_bonus),
            configs,
            strategy: config.ocr.strategy,
            parallel: config.ocr.parallel_pages,
            max_workers: config.ocr.max_workers,
        }
    }

    /// Replace the PDF rasterizer.
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn PdfRasterizer>) -> Self {
        self.preprocessor = self.preprocessor.with_rasterizer(rasterizer);
        self
    }

    /// Override the processing strategy.
    pub fn with_strategy(mut self, strategy: ProcessingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> ProcessingStrategy {
        self.strategy
    }

    /// Process a document to completion.
    pub fn process(&self, input: &DocumentInput) -> Result<DocumentText> {
        self.process_with_cancel(input, &CancelFlag::new())
    }

    /// Process a document, stopping at the next page boundary once `cancel`
    /// is set.
    pub fn process_with_cancel(&self, input: &DocumentInput, cancel: &CancelFlag) -> Result<DocumentText> {
        let start = Instant::now();
        let pages = self.preprocessor.decode(input)?;
        let page_count = pages.len();
        info!(
            "Processing {} {} page(s) with {} strategy",
            page_count, input.kind, self.strategy
        );

        let outcomes = self.run_pages(pages, cancel)?;

        let aggregator = match input.kind {
            DocumentKind::Image => PageAggregator::single(),
            DocumentKind::Pdf => PageAggregator::paged(),
        };
        let document = aggregator.assemble(outcomes)?;

        info!(
            "Processed {} page(s) in {}ms, confidence {:.1}",
            page_count,
            start.elapsed().as_millis(),
            document.confidence
        );
        Ok(document)
    }

    /// Process one decoded page with the configured strategy.
    pub fn process_page(&self, page: &Page) -> std::result::Result<PageResult, OcrError> {
        let runner = RecognitionAttemptRunner::new(self.engine.as_ref());
        debug!("Page {}: {}x{}", page.index + 1, page.width(), page.height());

        match self.strategy {
            ProcessingStrategy::FullPage => {
                let variants = self.preprocessor.variants(&page.gray());
                let unit = format!("page {}", page.index + 1);
                let candidate = self.selector.best_of(&runner, &variants, &self.configs, &unit)?;
                Ok(PageResult::from_candidate(page.index, candidate))
            }
            ProcessingStrategy::Zoned => {
                ZonedStrategy::new(self.selector).process_page(page, &self.preprocessor, &runner)
            }
        }
    }

    /// Run every page, returning outcomes in page order.
    fn run_pages(
        &self,
        pages: Vec<Page>,
        cancel: &CancelFlag,
    ) -> Result<Vec<std::result::Result<PageResult, OcrError>>> {
        let run = |page: Page| {
            if cancel.is_cancelled() {
                return None;
            }
            Some(self.process_page(&page))
        };

        let outcomes: Vec<Option<_>> = if self.parallel && pages.len() > 1 {
            if self.max_workers > 0 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.max_workers)
                    .build()
                    .map_err(|e| ScanError::Config(format!("failed to build worker pool: {}", e)))?;
                pool.install(|| pages.into_par_iter().map(run).collect())
            } else {
                pages.into_par_iter().map(run).collect()
            }
        } else {
            pages.into_iter().map(run).collect()
        };

        if outcomes.iter().any(Option::is_none) {
            info!("Processing cancelled");
            return Err(ScanError::Cancelled);
        }
        Ok(outcomes.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{Recognition, Token};
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    struct EchoEngine;

    impl RecognitionEngine for EchoEngine {
        fn name(&self) -> &str {
            "echo"
        }

        fn recognize(
            &self,
            _: &GrayImage,
            config: &RecognitionConfig,
        ) -> std::result::Result<Recognition, OcrError> {
            Ok(Recognition {
                text: format!("psm {}", config.psm),
                tokens: vec![Token::new("psm", Some(50.0 + config.psm as f32))],
            })
        }
    }

    fn image_input() -> DocumentInput {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(24, 24, Luma([240])));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        DocumentInput::new(bytes, DocumentKind::Image)
    }

    fn config() -> ScanConfig {
        let mut config = ScanConfig::default();
        config.ocr.enable_deskew = false;
        config
    }

    #[test]
    fn test_full_page_picks_highest_confidence_config() {
        let processor = DocumentProcessor::new(Box::new(EchoEngine), &config());
        let doc = processor.process(&image_input()).unwrap();

        assert_eq!(doc.text, "psm 6");
        assert_eq!(doc.confidence, 56.0);
        assert_eq!(doc.page_count, 1);
    }

    #[test]
    fn test_zoned_strategy_uses_zone_configs() {
        let processor =
            DocumentProcessor::new(Box::new(EchoEngine), &config()).with_strategy(ProcessingStrategy::Zoned);
        let doc = processor.process(&image_input()).unwrap();

        assert_eq!(doc.text, "psm 1\npsm 6\npsm 6");
        let zones = doc.zones.unwrap();
        assert_eq!(zones.len(), 3);
        assert_eq!(zones[0].confidence, 51.0);
        assert!((doc.confidence - (51.0 + 56.0 + 56.0) / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_cancelled_before_first_page() {
        let processor = DocumentProcessor::new(Box::new(EchoEngine), &config());
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = processor.process_with_cancel(&image_input(), &cancel);
        assert!(matches!(result, Err(ScanError::Cancelled)));
    }
}
