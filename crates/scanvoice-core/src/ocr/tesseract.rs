//! Tesseract recognition via the command line, reading TSV output.

use std::fs::File;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use image::GrayImage;
use tempfile::TempDir;
use tracing::{debug, trace, warn};

use super::engine::RecognitionEngine;
use super::{Recognition, RecognitionConfig, Token};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Tesseract CLI engine.
pub struct TesseractEngine {
    binary: String,
    language: String,
    timeout: Option<Duration>,
}

impl TesseractEngine {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            binary: config.tesseract_path.clone(),
            language: config.language.clone(),
            timeout: config.attempt_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Whether the binary can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn spawn(&self, image_path: &Path, output_base: &Path, config: &RecognitionConfig, stderr: File) -> Result<Child, OcrError> {
        Command::new(&self.binary)
            .arg(image_path)
            .arg(output_base)
            .args(["-l", &self.language])
            .args(["--oem", &config.oem.to_string()])
            .args(["--psm", &config.psm.to_string()])
            .arg("tsv")
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OcrError::EngineUnavailable(format!("{} not found (install tesseract-ocr)", self.binary))
                } else {
                    OcrError::Engine(e.to_string())
                }
            })
    }

    /// Wait for the child, killing it once the timeout passes.
    fn wait(&self, child: &mut Child) -> Result<bool, OcrError> {
        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status.success()),
                Ok(None) => {
                    if let Some(timeout) = self.timeout {
                        if start.elapsed() > timeout {
                            let _ = child.kill();
                            let _ = child.wait();
                            warn!("tesseract killed after {:?}", timeout);
                            return Err(OcrError::Timeout(timeout.as_secs()));
                        }
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(OcrError::Engine(e.to_string())),
            }
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage, config: &RecognitionConfig) -> Result<Recognition, OcrError> {
        let temp_dir = TempDir::new().map_err(|e| OcrError::Engine(format!("failed to create temp dir: {}", e)))?;
        let image_path = temp_dir.path().join("variant.png");
        let output_base = temp_dir.path().join("out");
        let stderr_path = temp_dir.path().join("stderr.txt");

        image
            .save(&image_path)
            .map_err(|e| OcrError::Preprocessing(format!("failed to write variant: {}", e)))?;
        let stderr = File::create(&stderr_path).map_err(|e| OcrError::Engine(e.to_string()))?;

        trace!("Running {} on {} ({})", self.binary, image_path.display(), config);
        let mut child = self.spawn(&image_path, &output_base, config, stderr)?;

        if !self.wait(&mut child)? {
            let message = std::fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(OcrError::Engine(format!("tesseract failed: {}", message.trim())));
        }

        let tsv = std::fs::read_to_string(output_base.with_extension("tsv"))
            .map_err(|e| OcrError::Engine(format!("missing TSV output: {}", e)))?;
        let recognition = parse_tsv(&tsv);
        debug!("tesseract ({}) returned {} tokens", config, recognition.tokens.len());
        Ok(recognition)
    }
}

/// Parse Tesseract TSV output into tokens and line-structured text.
///
/// Word rows (level 5) become tokens; a confidence of -1 becomes `None`.
/// Words on the same line are joined with spaces, lines with newlines, and
/// paragraphs are separated by a blank line.
pub(crate) fn parse_tsv(tsv: &str) -> Recognition {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut current_line: Option<(u32, u32, u32)> = None;
    let mut current_par: Option<(u32, u32)> = None;

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0].trim() != "5" {
            continue;
        }

        let num = |i: usize| cols[i].trim().parse::<u32>().unwrap_or(0);
        let (block, par, line) = (num(2), num(3), num(4));
        let word = cols[11].trim();
        let confidence = cols[10]
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|c| *c >= 0.0);

        tokens.push(Token::new(word, confidence));
        if word.is_empty() {
            continue;
        }

        if current_line != Some((block, par, line)) {
            if current_line.is_some() {
                text.push('\n');
                if current_par != Some((block, par)) {
                    text.push('\n');
                }
            }
            current_line = Some((block, par, line));
            current_par = Some((block, par));
        } else {
            text.push(' ');
        }
        text.push_str(word);
    }

    Recognition { text, tokens }
}
