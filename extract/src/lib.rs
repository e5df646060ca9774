//! Document ingestion for doccompare.
//!
//! [`DocumentExtractor`] turns a [`SourceFile`] into plain text: PDFs through structural
//! extraction with an OCR fallback for scanned pages, Word documents through `docx-rs`, and
//! images straight through OCR. [`PasswordFlow`] turns encrypted-PDF failures into prompts
//! for the host and retries with the answer. [`ComparisonRun`] ties both together for two or
//! three documents and diffs every later one against the first.
//!
//! ```no_run
//! use doccompare_extract::{
//!     ComparisonInput, ComparisonRun, DocumentExtractor, ExtractOptions, SourceFile,
//!     password_channel,
//! };
//! use doccompare_ocr::UnavailableRecognizer;
//! use doccompare_pdf_process::LopdfBackend;
//!
//! # async fn demo() -> doccompare_extract::Result<()> {
//! let extractor = DocumentExtractor::new(
//!     LopdfBackend,
//!     UnavailableRecognizer::new("no OCR models"),
//!     ExtractOptions::new(),
//! );
//! let (passwords, _queue) = password_channel();
//! let inputs = [
//!     ComparisonInput::File(SourceFile::from_path("a.docx")?),
//!     ComparisonInput::File(SourceFile::from_path("b.pdf")?),
//! ];
//! let report = ComparisonRun::new(&extractor, &passwords)
//!     .run(&inputs, |index, progress| println!("[{index}] {}", progress.message))
//!     .await?;
//! println!("similarity: {}%", report.comparisons[0].result.similarity);
//! # Ok(())
//! # }
//! ```

mod dispatcher;
mod error;
pub mod password;
mod progress;
mod run;
mod source;
mod word;

pub use dispatcher::{DocumentExtractionResult, DocumentExtractor, ExtractOptions, FileType};
pub use error::{ExtractError, Result};
pub use password::{
    PasswordAttempt, PasswordFlow, PasswordIssue, PasswordQueue, PasswordRequest,
    PasswordResponse, PasswordState, channel as password_channel,
};
pub use progress::ExtractionProgress;
pub use run::{
    ComparisonInput, ComparisonReport, ComparisonRun, MAX_DOCUMENTS, MIN_DOCUMENTS,
    PairComparison,
};
pub use source::{DocumentKey, FileKind, SourceFile};
pub use word::extract_word_text;
