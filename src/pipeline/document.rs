//! Input documents: pasted text or files on disk.

use std::path::Path;

use super::PipelineError;
use crate::models::ExtractionMode;
use crate::utils::{extract_from_bytes, is_pdf};

/// Largest file accepted by [`Document::from_path`]
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Text ready for analysis, with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    /// Page count for PDFs
    pub pages: Option<usize>,
    pub mode: ExtractionMode,
}

impl Document {
    /// Document from pasted text
    pub fn from_text(text: impl Into<String>) -> Result<Self, PipelineError> {
        Self::new(text.into(), None, ExtractionMode::Text)
    }

    /// Document from PDF bytes
    pub fn from_pdf_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        let pdf = extract_from_bytes(bytes)?;
        tracing::debug!("Extracted {} chars from {} PDF pages", pdf.text.len(), pdf.pages);
        Self::new(pdf.text, Some(pdf.pages), ExtractionMode::Pdf)
    }

    /// Document from a file.
    ///
    /// PDFs are recognized by their `%PDF` header or a `.pdf` extension; any
    /// other file must be UTF-8 text.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let size = std::fs::metadata(path)?.len();
        if size > MAX_FILE_BYTES {
            return Err(PipelineError::FileTooLarge {
                size,
                limit: MAX_FILE_BYTES,
            });
        }

        let bytes = std::fs::read(path)?;
        let pdf_extension = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf(&bytes) || pdf_extension {
            return Self::from_pdf_bytes(&bytes);
        }

        let text = String::from_utf8(bytes).map_err(|_| {
            PipelineError::UnsupportedInput(format!("{} is neither a PDF nor UTF-8 text", path.display()))
        })?;
        Self::from_text(text)
    }

    fn new(text: String, pages: Option<usize>, mode: ExtractionMode) -> Result<Self, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        Ok(Self { text, pages, mode })
    }

    /// Length of the text in characters
    pub fn text_length(&self) -> usize {
        self.text.chars().count()
    }
}
