//! Page rendering through poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tracing::{debug, info};

use super::{looks_like_pdf, PdfRasterizer, Result};
use crate::error::DecodeError;

/// Renders PDF pages to PNG with `pdftoppm` and loads them back.
pub struct PopplerRasterizer {
    binary: String,
}

impl PopplerRasterizer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn render(&self, pdf_path: &Path, dpi: u32, output_dir: &Path) -> Result<()> {
        let output_prefix = output_dir.join("page");

        let output = Command::new(&self.binary)
            .args(["-png", "-r", &dpi.to_string()])
            .arg(pdf_path)
            .arg(&output_prefix)
            .output();

        match output {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                Err(DecodeError::Pdf(format!("pdftoppm failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DecodeError::Rasterizer(
                format!("{} not found (install poppler-utils)", self.binary),
            )),
            Err(e) => Err(DecodeError::Rasterizer(e.to_string())),
        }
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PdfRasterizer for PopplerRasterizer {
    fn rasterize(&self, data: &[u8], dpi: u32) -> Result<Vec<DynamicImage>> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }
        if !looks_like_pdf(data) {
            return Err(DecodeError::Pdf("missing %PDF header".to_string()));
        }

        let temp_dir = tempfile::tempdir()
            .map_err(|e| DecodeError::Rasterizer(format!("failed to create temp dir: {}", e)))?;
        let pdf_path = temp_dir.path().join("input.pdf");
        std::fs::write(&pdf_path, data)
            .map_err(|e| DecodeError::Rasterizer(format!("failed to write PDF: {}", e)))?;

        self.render(&pdf_path, dpi, temp_dir.path())?;

        let pages = page_images(temp_dir.path())?;
        if pages.is_empty() {
            return Err(DecodeError::NoPages);
        }

        debug!("pdftoppm produced {} page images at {} dpi", pages.len(), dpi);

        let images = pages
            .iter()
            .map(|path| image::open(path).map_err(DecodeError::from))
            .collect::<Result<Vec<_>>>()?;

        info!("Rasterized PDF into {} pages", images.len());
        Ok(images)
    }
}

/// List `page-N.png` files in page order.
///
/// pdftoppm zero-pads the page number to the width of the page count,
/// so sorting is done on the parsed number rather than the file name.
fn page_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| DecodeError::Rasterizer(format!("failed to list pages: {}", e)))?;

    let mut pages: Vec<(u32, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter_map(|path| {
            let number = page_number(&path)?;
            Some((number, path))
        })
        .collect();

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("page-")?.parse().ok()
}
