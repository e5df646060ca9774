//! Seam between the pipeline and the library that actually parses PDF bytes.

use image::RgbImage;

use crate::error::Result;
use crate::lopdf_backend::{LopdfBackend, LopdfDocument};
use crate::model::PageText;
use crate::pdfium::{PdfiumBackend, PdfiumDocument};

/// Something that can open PDF bytes.
///
/// Opening fails with [`PdfProcessError::PasswordRequired`] when the document is encrypted
/// and no password was given, and with [`PdfProcessError::IncorrectPassword`] when the given
/// password is rejected.
///
/// [`PdfProcessError::PasswordRequired`]: crate::PdfProcessError::PasswordRequired
/// [`PdfProcessError::IncorrectPassword`]: crate::PdfProcessError::IncorrectPassword
pub trait PdfBackend {
    /// Handle to an opened document, borrowing the backend and the input bytes.
    type Document<'a>: LoadedPdf
    where
        Self: 'a;

    /// Open `bytes`, decrypting with `password` when given.
    fn open<'a>(&'a self, bytes: &'a [u8], password: Option<&'a str>)
    -> Result<Self::Document<'a>>;
}

/// An opened PDF document.
pub trait LoadedPdf {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Text content of the page at zero-based `index`.
    fn page_text(&self, index: usize) -> Result<PageText>;

    /// Rasterize the page at zero-based `index`.
    fn render_page(&self, index: usize, dpi: u16) -> Result<RgbImage>;
}

/// Runtime choice between the available backends.
#[derive(Debug)]
pub enum Backend {
    /// Pdfium: positioned runs and rasterization.
    Pdfium(PdfiumBackend),
    /// lopdf: pure Rust, plain text only, no rasterization.
    Lopdf(LopdfBackend),
}

/// Document opened through [`Backend`].
#[derive(Debug)]
pub enum BackendDocument<'a> {
    /// Opened by Pdfium.
    Pdfium(PdfiumDocument<'a>),
    /// Opened by lopdf.
    Lopdf(LopdfDocument),
}

impl Backend {
    /// Short backend name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pdfium(_) => "pdfium",
            Self::Lopdf(_) => "lopdf",
        }
    }

    /// Returns `true` if this backend can rasterize pages for OCR.
    #[must_use]
    pub const fn can_render(&self) -> bool {
        matches!(self, Self::Pdfium(_))
    }
}

impl PdfBackend for Backend {
    type Document<'a> = BackendDocument<'a>;

    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<Self::Document<'a>> {
        match self {
            Self::Pdfium(backend) => backend.open(bytes, password).map(BackendDocument::Pdfium),
            Self::Lopdf(backend) => backend.open(bytes, password).map(BackendDocument::Lopdf),
        }
    }
}

impl LoadedPdf for BackendDocument<'_> {
    fn page_count(&self) -> usize {
        match self {
            Self::Pdfium(doc) => doc.page_count(),
            Self::Lopdf(doc) => doc.page_count(),
        }
    }

    fn page_text(&self, index: usize) -> Result<PageText> {
        match self {
            Self::Pdfium(doc) => doc.page_text(index),
            Self::Lopdf(doc) => doc.page_text(index),
        }
    }

    fn render_page(&self, index: usize, dpi: u16) -> Result<RgbImage> {
        match self {
            Self::Pdfium(doc) => doc.render_page(index, dpi),
            Self::Lopdf(doc) => doc.render_page(index, dpi),
        }
    }
}
