//! Assembling page results into document text.

use tracing::{info, warn};

use super::{DocumentText, PageResult, ZoneResult};
use crate::error::OcrError;

/// Combines per-page outcomes into a [`DocumentText`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PageAggregator {
    paged: bool,
}

impl PageAggregator {
    /// Aggregator for a single image: the text is the page text as is.
    pub fn single() -> Self {
        Self { paged: false }
    }

    /// Aggregator for a paged document: the best page's text comes first,
    /// then every page under a `=== Page N ===` header, in page order.
    pub fn paged() -> Self {
        Self { paged: true }
    }

    /// Assemble outcomes given in page-index order.
    ///
    /// A failed page becomes an empty, zero-confidence result. Fails only
    /// when every page failed.
    pub fn assemble(&self, outcomes: Vec<Result<PageResult, OcrError>>) -> Result<DocumentText, OcrError> {
        let page_count = outcomes.len();
        let mut pages = Vec::with_capacity(page_count);
        let mut attempts = 0;

        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(page) => pages.push(page),
                Err(e) => {
                    warn!("Page {} produced no text: {}", index + 1, e);
                    if let OcrError::Exhausted { attempts: n, .. } = e {
                        attempts += n;
                    }
                    pages.push(PageResult::failed(index));
                }
            }
        }

        if pages.iter().all(|p| p.failed) {
            return Err(OcrError::Exhausted {
                unit: "document".to_string(),
                attempts,
            });
        }

        let best_page = best_page(&pages).cloned();
        let text = if self.paged {
            paged_text(&pages, best_page.as_ref())
        } else {
            pages.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("\n\n")
        };

        let confidence = if pages.is_empty() {
            0.0
        } else {
            pages.iter().map(|p| p.confidence).sum::<f32>() / pages.len() as f32
        };
        let word_count = pages.iter().map(|p| p.word_count).sum::<usize>();
        let zones = document_zones(&pages);

        info!(
            "Assembled {} pages, confidence {:.1}, {} words",
            page_count, confidence, word_count
        );

        Ok(DocumentText {
            text,
            confidence: confidence.clamp(0.0, 100.0),
            word_count,
            page_count,
            best_page,
            pages,
            zones,
        })
    }
}

/// Highest-confidence page that produced text; the earliest wins ties.
fn best_page(pages: &[PageResult]) -> Option<&PageResult> {
    pages
        .iter()
        .filter(|p| !p.failed)
        .fold(None, |best: Option<&PageResult>, page| match best {
            Some(current) if page.confidence <= current.confidence => Some(current),
            _ => Some(page),
        })
}

fn paged_text(pages: &[PageResult], best: Option<&PageResult>) -> String {
    let mut parts = Vec::with_capacity(pages.len() + 1);
    if let Some(best) = best {
        parts.push(best.text.clone());
    }
    for page in pages {
        parts.push(format!("=== Page {} ===\n{}", page.page_index + 1, page.text));
    }
    parts.join("\n\n")
}

/// Zone results of every page in page order, when zones were used.
fn document_zones(pages: &[PageResult]) -> Option<Vec<ZoneResult>> {
    let zones: Vec<ZoneResult> = pages
        .iter()
        .filter_map(|p| p.zones.as_ref())
        .flatten()
        .cloned()
        .collect();
    (!zones.is_empty()).then_some(zones)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(index: usize, text: &str, confidence: f32) -> Result<PageResult, OcrError> {
        Ok(PageResult {
            page_index: index,
            text: text.to_string(),
            confidence,
            word_count: text.split_whitespace().count(),
            zones: None,
            failed: false,
        })
    }

    fn exhausted(index: usize) -> Result<PageResult, OcrError> {
        Err(OcrError::Exhausted {
            unit: format!("page {}", index + 1),
            attempts: 20,
        })
    }

    #[test]
    fn test_best_page_first_then_all_pages() {
        let doc = PageAggregator::paged()
            .assemble(vec![page(0, "one", 60.0), page(1, "two two", 90.0), page(2, "three", 30.0)])
            .unwrap();

        assert_eq!(doc.best_page.as_ref().map(|p| p.page_index), Some(1));
        assert_eq!(
            doc.text,
            "two two\n\n=== Page 1 ===\none\n\n=== Page 2 ===\ntwo two\n\n=== Page 3 ===\nthree"
        );
        assert_eq!(doc.confidence, 60.0);
        assert_eq!(doc.word_count, 4);
        assert_eq!(doc.page_count, 3);
    }

    #[test]
    fn test_failed_page_is_empty_sibling() {
        let doc = PageAggregator::paged()
            .assemble(vec![exhausted(0), page(1, "total 5.00", 80.0)])
            .unwrap();

        assert!(doc.pages[0].failed);
        assert_eq!(doc.pages[0].confidence, 0.0);
        assert_eq!(doc.pages[0].text, "");
        assert_eq!(doc.confidence, 40.0);
        assert_eq!(doc.best_page.unwrap().page_index, 1);
    }

    #[test]
    fn test_all_pages_failed_is_exhausted() {
        let err = PageAggregator::paged()
            .assemble(vec![exhausted(0), exhausted(1)])
            .unwrap_err();
        assert!(matches!(err, OcrError::Exhausted { attempts: 40, .. }));
    }

    #[test]
    fn test_single_image_text_is_not_duplicated() {
        let doc = PageAggregator::single().assemble(vec![page(0, "Invoice 7", 70.0)]).unwrap();
        assert_eq!(doc.text, "Invoice 7");
        assert_eq!(doc.best_page.unwrap().text, "Invoice 7");
    }

    #[test]
    fn test_ties_pick_earliest_page() {
        let doc = PageAggregator::paged()
            .assemble(vec![page(0, "a", 50.0), page(1, "b", 50.0)])
            .unwrap();
        assert_eq!(doc.best_page.unwrap().page_index, 0);
    }
}
