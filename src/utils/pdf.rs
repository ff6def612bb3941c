//! PDF text extraction utilities.
//!
//! Text comes from the pdf-extract crate and page counts from lopdf. Both
//! work on in-memory bytes, so callers read the file once.

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during PDF extraction
#[derive(Debug, Error)]
pub enum PdfExtractError {
    #[error("Failed to extract text from PDF: {0}")]
    ExtractionFailed(String),

    #[error("Not a valid PDF: {0}")]
    InvalidFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text and page count of one PDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    pub text: String,
    pub pages: usize,
}

/// Whether `bytes` start with the PDF magic number
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

/// Extract text and page count from PDF bytes.
pub fn extract_from_bytes(bytes: &[u8]) -> Result<PdfText, PdfExtractError> {
    if !is_pdf(bytes) {
        return Err(PdfExtractError::InvalidFile(
            "missing %PDF header".to_string(),
        ));
    }

    let pages = page_count(bytes)?;

    // pdf-extract panics on some malformed inputs
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| PdfExtractError::ExtractionFailed("PDF parser panicked".to_string()))?
        .map_err(|e| PdfExtractError::ExtractionFailed(e.to_string()))?;

    if text.trim().is_empty() {
        // Scanned or image-only PDF
        tracing::debug!("Extracted empty text from {}-page PDF", pages);
    }

    Ok(PdfText { text, pages })
}

/// Number of pages in PDF bytes
pub fn page_count(bytes: &[u8]) -> Result<usize, PdfExtractError> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| PdfExtractError::InvalidFile(e.to_string()))?;
    Ok(document.get_pages().len())
}

/// Extract text and page count from a PDF file.
pub fn extract_text(path: &Path) -> Result<PdfText, PdfExtractError> {
    if !path.is_file() {
        return Err(PdfExtractError::InvalidFile(format!(
            "Not a file: {}",
            path.display()
        )));
    }
    let bytes = std::fs::read(path)?;
    extract_from_bytes(&bytes)
}
