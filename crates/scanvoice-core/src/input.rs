//! Document input contract: raw bytes plus a declared kind.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Declared kind of a raw document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A single raster image (PNG, JPEG, TIFF, ...).
    Image,
    /// A PDF, rasterized page by page.
    Pdf,
}

/// Content types and short names accepted for each kind.
const CONTENT_TYPES: &[(&str, DocumentKind)] = &[
    ("image", DocumentKind::Image),
    ("image/png", DocumentKind::Image),
    ("image/jpeg", DocumentKind::Image),
    ("image/jpg", DocumentKind::Image),
    ("image/pjpeg", DocumentKind::Image),
    ("image/tiff", DocumentKind::Image),
    ("image/bmp", DocumentKind::Image),
    ("image/gif", DocumentKind::Image),
    ("image/webp", DocumentKind::Image),
    ("pdf", DocumentKind::Pdf),
    ("application/pdf", DocumentKind::Pdf),
    ("application/x-pdf", DocumentKind::Pdf),
];

/// File extensions accepted for each kind.
const EXTENSIONS: &[(&str, DocumentKind)] = &[
    ("png", DocumentKind::Image),
    ("jpg", DocumentKind::Image),
    ("jpeg", DocumentKind::Image),
    ("tif", DocumentKind::Image),
    ("tiff", DocumentKind::Image),
    ("bmp", DocumentKind::Image),
    ("gif", DocumentKind::Image),
    ("webp", DocumentKind::Image),
    ("pdf", DocumentKind::Pdf),
];

impl DocumentKind {
    /// Look up a kind from a MIME content type or short name.
    ///
    /// Parameters after `;` are ignored; matching is case-insensitive.
    pub fn from_content_type(content_type: &str) -> Result<Self, ScanError> {
        let key = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        CONTENT_TYPES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ScanError::UnsupportedKind(content_type.to_string()))
    }

    /// Look up a kind from a file path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        EXTENSIONS
            .iter()
            .find(|(name, _)| *name == ext)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ScanError::UnsupportedKind(path.display().to_string()))
    }

    /// Whether a path has an extension we can process.
    pub fn is_supported_path(path: &Path) -> bool {
        Self::from_path(path).is_ok()
    }
}

impl FromStr for DocumentKind {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_content_type(s)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Image => f.write_str("image"),
            DocumentKind::Pdf => f.write_str("pdf"),
        }
    }
}

/// A document to process.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    /// Raw document bytes.
    pub bytes: Vec<u8>,
    /// Declared kind.
    pub kind: DocumentKind,
    /// Rasterization resolution for PDFs; the configured default when `None`.
    pub dpi: Option<u32>,
}

impl DocumentInput {
    pub fn new(bytes: Vec<u8>, kind: DocumentKind) -> Self {
        Self {
            bytes,
            kind,
            dpi: None,
        }
    }

    /// Build an input from bytes and a declared content type.
    pub fn from_content_type(bytes: Vec<u8>, content_type: &str) -> Result<Self, ScanError> {
        Ok(Self::new(bytes, DocumentKind::from_content_type(content_type)?))
    }

    /// Read a file, inferring its kind from the extension.
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let kind = DocumentKind::from_path(path)?;
        let bytes = std::fs::read(path)?;
        Ok(Self::new(bytes, kind))
    }

    /// Override the rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_lookup() {
        assert_eq!(DocumentKind::from_content_type("application/pdf").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_content_type("IMAGE/PNG").unwrap(), DocumentKind::Image);
        assert_eq!(
            DocumentKind::from_content_type("image/jpeg; charset=binary").unwrap(),
            DocumentKind::Image
        );
        assert_eq!("pdf".parse::<DocumentKind>().unwrap(), DocumentKind::Pdf);
    }

    #[test]
    fn test_unknown_content_type_is_typed_error() {
        let err = DocumentKind::from_content_type("text/html").unwrap_err();
        assert!(matches!(err, ScanError::UnsupportedKind(ref s) if s == "text/html"));
    }

    #[test]
    fn test_path_lookup() {
        assert_eq!(DocumentKind::from_path(Path::new("scan.TIFF")).unwrap(), DocumentKind::Image);
        assert_eq!(DocumentKind::from_path(Path::new("a/b/inv.pdf")).unwrap(), DocumentKind::Pdf);
        assert!(!DocumentKind::is_supported_path(Path::new("notes.txt")));
    }
}
