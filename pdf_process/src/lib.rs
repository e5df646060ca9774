//! Reading-order text extraction for PDF documents.
//!
//! This crate opens PDF bytes through a pluggable [`PdfBackend`], rebuilds each page's
//! positioned glyph runs into lines (large horizontal gaps become tabs so table columns
//! survive), and flags documents whose text layer is too thin to trust as scanned.
//! It also offers a cheap [`pre_check`] probe and page rasterization for OCR.
//!
//! Two backends ship with the crate: [`PdfiumBackend`] (positioned runs and rendering,
//! needs the Pdfium dynamic library) and [`LopdfBackend`] (pure Rust, plain text only).

mod backend;
mod error;
mod layout;
mod lopdf_backend;
mod model;
mod parser;
mod pdfium;
mod precheck;
mod render;

pub use backend::{Backend, BackendDocument, LoadedPdf, PdfBackend};
pub use error::{PdfProcessError, Result};
pub use layout::assemble_page;
pub use lopdf_backend::{LopdfBackend, LopdfDocument};
pub use model::{
    LayoutOptions, OcrAdvisory, PageLimits, PageText, PdfExtraction, PdfProcessOptions,
    PreCheckResult, ScanThresholds, TextRun,
};
pub use parser::{ExtractionBuilder, extract_text, pages_to_read, read_page};
pub use pdfium::{PdfiumBackend, PdfiumDocument};
pub use precheck::pre_check;

use std::path::Path;

/// Convenience wrapper pairing PDF bytes with processing options.
#[derive(Debug, Clone)]
pub struct PdfProcessor {
    bytes: Vec<u8>,
    options: PdfProcessOptions,
}

impl PdfProcessor {
    /// Build a processor from PDF bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, options: PdfProcessOptions) -> Self {
        Self {
            bytes: bytes.into(),
            options,
        }
    }

    /// Build a processor by reading a PDF file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>, options: PdfProcessOptions) -> Result<Self> {
        Ok(Self::from_bytes(std::fs::read(path)?, options))
    }

    /// Processing options in effect.
    #[must_use]
    pub const fn options(&self) -> &PdfProcessOptions {
        &self.options
    }

    /// Probe page count, scanned-ness and password protection.
    ///
    /// # Errors
    ///
    /// Fails only for unreadable input; encryption is reported in the result.
    pub fn pre_check<B: PdfBackend>(
        &self,
        backend: &B,
        password: Option<&str>,
    ) -> Result<PreCheckResult> {
        pre_check(backend, &self.bytes, password, &self.options.scan)
    }

    /// Extract reading-order text.
    ///
    /// # Errors
    ///
    /// Fails with a password error when the document is encrypted, or a parse error.
    pub fn extract_text<B: PdfBackend>(
        &self,
        backend: &B,
        password: Option<&str>,
    ) -> Result<PdfExtraction> {
        extract_text(backend, &self.bytes, password, &self.options)
    }
}
