//! # doccompare
//!
//! Façade crate for comparing documents word by word. It re-exports the text comparison
//! primitives from [`doccompare_compare`] and, behind features, the PDF, OCR and extraction
//! crates.
//!
//! ## What's inside?
//!
//! - [`compare`] and [`normalize`]: canonicalize two texts and diff them word by word.
//! - `pdf` feature: [`pdf`] structural text extraction and the scanned-document pre-check.
//! - `ocr` feature: [`ocr`] recognition pipeline with the noise filter.
//! - `extract` feature (default): [`extract`] dispatcher, password flow and comparison runs.
//!
//! ## Example
//!
//! ```rust
//! let result = doccompare::compare("The total is 40 EUR.", "the total is 45 EUR");
//! assert!(!result.is_exact_match);
//! assert_eq!(result.added_count, 1);
//! assert_eq!(result.removed_count, 1);
//! ```

pub use doccompare_compare::*;

/// PDF pre-check, structural extraction and rasterization.
#[cfg(feature = "pdf")]
pub use doccompare_pdf_process as pdf;

/// OCR pipeline and recognizers.
#[cfg(feature = "ocr")]
pub use doccompare_ocr as ocr;

/// Document extraction, password flow and comparison runs.
#[cfg(feature = "extract")]
pub use doccompare_extract as extract;
