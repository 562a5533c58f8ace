//! End-to-end runs of the document pipeline and field extraction with
//! in-memory engines and rasterizers.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use scanvoice_core::ocr::{Recognition, Token};
use scanvoice_core::{
    ConfidenceTier, DecodeError, DocumentInput, DocumentKind, DocumentProcessor, Field,
    InvoiceParser, OcrError, PdfRasterizer, RecognitionConfig, RecognitionEngine, ScanConfig,
    ScanError,
};

/// Renders page `i` as a blank image `20 + 10 * i` pixels wide, so the
/// engine can tell pages apart whatever enhancement was applied.
struct WidthRasterizer {
    pages: u32,
}

impl PdfRasterizer for WidthRasterizer {
    fn rasterize(&self, _data: &[u8], _dpi: u32) -> Result<Vec<DynamicImage>, DecodeError> {
        Ok((0..self.pages)
            .map(|i| DynamicImage::ImageLuma8(GrayImage::from_pixel(20 + 10 * i, 20, Luma([235]))))
            .collect())
    }
}

/// Returns canned text per page width; widths listed in `failing` error out.
struct PageEngine {
    failing: Vec<u32>,
}

impl PageEngine {
    fn new() -> Self {
        Self { failing: Vec::new() }
    }

    fn failing(widths: &[u32]) -> Self {
        Self {
            failing: widths.to_vec(),
        }
    }
}

impl RecognitionEngine for PageEngine {
    fn name(&self) -> &str {
        "pages"
    }

    fn recognize(&self, image: &GrayImage, _config: &RecognitionConfig) -> Result<Recognition, OcrError> {
        if self.failing.contains(&image.width()) {
            return Err(OcrError::Engine("engine crashed".to_string()));
        }

        let (text, confidence) = match image.width() {
            20 => ("Acme Corp\nWidgets $50.00", 40.0),
            30 => ("INVOICE\nInvoice No: A-1001\nTotal: $1,200.00", 90.0),
            _ => ("Issued March 1, 2024\nPay by March 31, 2024", 60.0),
        };

        Ok(Recognition {
            text: text.to_string(),
            tokens: text
                .split_whitespace()
                .map(|word| Token::new(word, Some(confidence)))
                .collect(),
        })
    }
}

fn config() -> ScanConfig {
    let mut config = ScanConfig::default();
    config.ocr.enable_deskew = false;
    config.ocr.recognition_configs = vec![RecognitionConfig::new(3, 6)];
    config
}

fn pdf_input() -> DocumentInput {
    DocumentInput::new(b"%PDF-1.7 stub".to_vec(), DocumentKind::Pdf)
}

fn processor(engine: PageEngine, pages: u32) -> DocumentProcessor {
    DocumentProcessor::new(Box::new(engine), &config())
        .with_rasterizer(Box::new(WidthRasterizer { pages }))
}

#[test]
fn best_page_text_leads_then_pages_in_order() {
    let doc = processor(PageEngine::new(), 3).process(&pdf_input()).unwrap();

    assert_eq!(doc.page_count, 3);
    assert_eq!(doc.best_page.as_ref().map(|p| p.page_index), Some(1));

    let page2 = "INVOICE\nInvoice No: A-1001\nTotal: $1,200.00";
    assert!(doc.text.starts_with(page2));

    let first = doc.text.find("=== Page 1 ===").unwrap();
    let second = doc.text.find("=== Page 2 ===").unwrap();
    let third = doc.text.find("=== Page 3 ===").unwrap();
    assert!(page2.len() < first && first < second && second < third);

    assert!((doc.confidence - (40.0 + 90.0 + 60.0) / 3.0).abs() < 1e-4);
    assert!((0.0..=100.0).contains(&doc.confidence));
}

#[test]
fn failed_page_does_not_sink_the_document() {
    let doc = processor(PageEngine::failing(&[30]), 3).process(&pdf_input()).unwrap();

    let failed = &doc.pages[1];
    assert!(failed.failed);
    assert_eq!(failed.text, "");
    assert_eq!(failed.confidence, 0.0);

    assert_eq!(doc.best_page.as_ref().map(|p| p.page_index), Some(2));
    assert!((doc.confidence - (40.0 + 0.0 + 60.0) / 3.0).abs() < 1e-4);
}

#[test]
fn every_page_failing_is_exhausted() {
    let result = processor(PageEngine::failing(&[20, 30, 40]), 3).process(&pdf_input());

    match result {
        Err(ScanError::Ocr(OcrError::Exhausted { unit, .. })) => assert_eq!(unit, "document"),
        other => panic!("expected exhaustion, got {:?}", other.map(|d| d.text)),
    }
}

#[test]
fn unreadable_image_is_a_decode_error() {
    let input = DocumentInput::new(b"not an image".to_vec(), DocumentKind::Image);
    let result = DocumentProcessor::new(Box::new(PageEngine::new()), &config()).process(&input);

    assert!(matches!(result, Err(ScanError::Decode(DecodeError::Image(_)))));
}

#[test]
fn single_image_text_is_not_duplicated() {
    let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([235])));
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

    let doc = DocumentProcessor::new(Box::new(PageEngine::new()), &config())
        .process(&DocumentInput::new(bytes, DocumentKind::Image))
        .unwrap();

    assert_eq!(doc.text, "Acme Corp\nWidgets $50.00");
    assert_eq!(doc.confidence, 40.0);
}

#[test]
fn document_to_record() {
    let doc = processor(PageEngine::new(), 3).process(&pdf_input()).unwrap();
    let record = InvoiceParser::default().extract(&doc);

    assert_eq!(record.invoice_number.as_deref(), Some("A-1001"));
    assert_eq!(record.amount, Some(Decimal::new(120000, 2)));
    assert_eq!(record.date.as_deref(), Some("March 1, 2024"));
    assert_eq!(record.due_date.as_deref(), Some("March 31, 2024"));
    assert_eq!(record.vendor_name.as_deref(), Some("Acme Corp"));
    assert_eq!(record.tier(Field::Vendor), ConfidenceTier::Medium);
    assert_eq!(record.tax_amount, None);
    assert_eq!(record.tier(Field::Tax), ConfidenceTier::Low);
}

#[test]
fn pipeline_and_extraction_are_deterministic() {
    let run = || {
        let doc = processor(PageEngine::new(), 3).process(&pdf_input()).unwrap();
        let record = InvoiceParser::default().extract(&doc);
        (doc.text, serde_json::to_string(&record).unwrap())
    };

    assert_eq!(run(), run());
}
