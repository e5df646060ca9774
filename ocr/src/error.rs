use thiserror::Error;

/// Errors emitted by the OCR pipeline.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The input bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    /// Recognition models could not be loaded.
    #[error("failed to load OCR models: {0}")]
    ModelLoad(String),
    /// The recognizer failed on a page.
    #[error("text recognition failed: {0}")]
    Recognition(String),
    /// No recognizer is configured in this build.
    #[error("OCR is not available: {0}")]
    Unavailable(String),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, OcrError>;
