//! OCR for scanned pages and standalone images.
//!
//! An [`OcrPipeline`] feeds rasterized pages to a [`Recognizer`], drops lines that look
//! like logos, signatures or decorative rules through a [`NoiseFilter`], and reports
//! progress per page and within a page, with a time-remaining estimate once the first
//! page is done. Each page is recognized on the `blocking` thread pool while the calling
//! task relays progress, and the pipeline yields to the executor every few pages so the
//! host stays responsive. An [`OcrSession`] takes pages one at a time for callers that
//! rasterize on demand.
//!
//! Enable the `paddle` feature for `PaddleRecognizer`, which runs PaddleOCR ONNX models.

mod error;
mod filter;
mod pipeline;
mod recognizer;

pub use error::{OcrError, Result};
pub use filter::{NoiseFilter, OcrLine};
pub use pipeline::{OcrOptions, OcrPipeline, OcrProgress, OcrResult, OcrSession, decode_image};
#[cfg(feature = "paddle")]
pub use recognizer::PaddleRecognizer;
pub use recognizer::{PaddleModels, Recognizer, UnavailableRecognizer};
