use doccompare_ocr::OcrError;
use doccompare_pdf_process::PdfProcessError;
use thiserror::Error;

/// Why extracting a document (or a whole comparison run) failed.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file is neither a PDF, a Word document nor an image.
    #[error("unsupported file type: {name}")]
    UnsupportedFileType {
        /// Declared file name.
        name: String,
    },
    /// The PDF is encrypted and no password was supplied.
    #[error("{name} is password protected")]
    PasswordRequired {
        /// Declared file name.
        name: String,
    },
    /// The supplied password was rejected.
    #[error("incorrect password for {name}")]
    IncorrectPassword {
        /// Declared file name.
        name: String,
    },
    /// The file is corrupt or could not be decoded.
    #[error("failed to extract text from {name}: {reason}")]
    ExtractionFailure {
        /// Declared file name.
        name: String,
        /// Underlying failure.
        reason: String,
    },
    /// The user cancelled a password prompt; the whole run was aborted.
    #[error("cancelled by user")]
    Cancelled,
    /// The request itself is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ExtractError {
    /// Returns `true` for the password kinds the password flow can resume from.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PasswordRequired { .. } | Self::IncorrectPassword { .. }
        )
    }

    /// Returns `true` if the user aborted the run.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Attach a file name to a PDF failure.
    #[must_use]
    pub fn from_pdf(name: &str, error: PdfProcessError) -> Self {
        let name = name.to_string();
        match error {
            PdfProcessError::PasswordRequired => Self::PasswordRequired { name },
            PdfProcessError::IncorrectPassword => Self::IncorrectPassword { name },
            other => Self::ExtractionFailure {
                name,
                reason: other.to_string(),
            },
        }
    }

    /// Attach a file name to an OCR failure.
    #[must_use]
    pub fn from_ocr(name: &str, error: &OcrError) -> Self {
        Self::ExtractionFailure {
            name: name.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_kinds_survive_conversion() {
        let err = ExtractError::from_pdf("a.pdf", PdfProcessError::PasswordRequired);
        assert!(matches!(err, ExtractError::PasswordRequired { ref name } if name == "a.pdf"));
        assert!(err.is_recoverable());

        let err = ExtractError::from_pdf("a.pdf", PdfProcessError::IncorrectPassword);
        assert!(err.is_recoverable());

        let err = ExtractError::from_pdf("a.pdf", PdfProcessError::Parse("bad xref".into()));
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "failed to extract text from a.pdf: failed to parse PDF: bad xref"
        );
    }

    #[test]
    fn cancellation_is_not_recoverable() {
        assert!(ExtractError::Cancelled.is_cancelled());
        assert!(!ExtractError::Cancelled.is_recoverable());
    }
}
