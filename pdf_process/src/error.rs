use thiserror::Error;

/// Errors emitted by the PDF pipeline.
#[derive(Debug, Error)]
pub enum PdfProcessError {
    /// The input bytes do not decode as a valid PDF structure.
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    /// The source PDF could not be read from the filesystem.
    #[error("failed to read PDF: {0}")]
    Io(#[from] std::io::Error),
    /// Pdfium dynamic library path must be configured to use the pdfium backend.
    #[error("pdfium library path is required; set PdfProcessOptions.pdfium_library_path")]
    MissingPdfiumLibraryPath,
    /// Pdfium dynamic library could not be loaded.
    #[error("failed to load pdfium library: {0}")]
    PdfiumLoad(String),
    /// The document is encrypted and no password was supplied.
    #[error("PDF is password protected")]
    PasswordRequired,
    /// The supplied password was rejected.
    #[error("incorrect PDF password")]
    IncorrectPassword,
    /// A page index past the end of the document was requested.
    #[error("page {index} is out of range (document has {page_count} pages)")]
    PageOutOfRange {
        /// Zero-based page index that was requested.
        index: usize,
        /// Number of pages in the document.
        page_count: usize,
    },
    /// A page could not be rasterized.
    #[error("failed to render page: {0}")]
    Render(String),
    /// The active backend cannot rasterize pages.
    #[error("the selected PDF backend cannot render pages")]
    RenderUnsupported,
}

impl PdfProcessError {
    /// Returns `true` for the two password conditions a caller can recover from by
    /// prompting for a password.
    #[must_use]
    pub const fn is_password_error(&self) -> bool {
        matches!(self, Self::PasswordRequired | Self::IncorrectPassword)
    }

    /// The password failure matching whether a password was supplied.
    #[must_use]
    pub const fn password(supplied: bool) -> Self {
        if supplied {
            Self::IncorrectPassword
        } else {
            Self::PasswordRequired
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, PdfProcessError>;
