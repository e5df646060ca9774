use doccompare_compare::{ComparisonResult, compare};
use doccompare_ocr::Recognizer;
use doccompare_pdf_process::PdfBackend;
use serde::Serialize;

use crate::dispatcher::{DocumentExtractionResult, DocumentExtractor};
use crate::error::{ExtractError, Result};
use crate::password::PasswordFlow;
use crate::progress::ExtractionProgress;
use crate::source::SourceFile;

/// Fewest documents a run compares.
pub const MIN_DOCUMENTS: usize = 2;
/// Most documents a run compares.
pub const MAX_DOCUMENTS: usize = 3;

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonInput {
    /// A document to extract.
    File(SourceFile),
    /// Text supplied directly, compared as-is.
    ReferenceText {
        /// Label shown in reports.
        label: String,
        /// The text.
        text: String,
    },
}

impl ComparisonInput {
    /// Name shown to the user.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::File(source) => &source.name,
            Self::ReferenceText { label, .. } => label,
        }
    }
}

/// Diff of one document against the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairComparison {
    /// Index of the baseline document (always the first input).
    pub baseline: usize,
    /// Index of the compared document.
    pub other: usize,
    /// Diff and statistics.
    pub result: ComparisonResult,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Extracted documents, in input order.
    pub documents: Vec<DocumentExtractionResult>,
    /// Every later document against the first.
    pub comparisons: Vec<PairComparison>,
}

/// Extracts two or three documents one after another and compares them.
///
/// Documents are processed sequentially so progress is reported per document in a fixed
/// order and password prompts queue through the shared [`PasswordFlow`]. A cancelled prompt
/// aborts the whole run.
#[derive(Debug)]
pub struct ComparisonRun<'a, B, R> {
    extractor: &'a DocumentExtractor<B, R>,
    passwords: &'a PasswordFlow,
    force_ocr: bool,
}

impl<'a, B, R> ComparisonRun<'a, B, R>
where
    B: PdfBackend,
    R: Recognizer + Send + Sync + 'static,
{
    /// Create a run over a shared extractor and password flow.
    #[must_use]
    pub const fn new(extractor: &'a DocumentExtractor<B, R>, passwords: &'a PasswordFlow) -> Self {
        Self {
            extractor,
            passwords,
            force_ocr: false,
        }
    }

    /// OCR every PDF regardless of its text layer.
    #[must_use]
    pub const fn with_force_ocr(mut self, force_ocr: bool) -> Self {
        self.force_ocr = force_ocr;
        self
    }

    /// Extract every input and compare each later one against the first.
    ///
    /// `on_progress` receives the input index with each progress signal.
    ///
    /// # Errors
    ///
    /// Fails with [`ExtractError::InvalidRequest`] for the wrong number of inputs, with
    /// [`ExtractError::Cancelled`] if a password prompt is cancelled, or with the first
    /// document's terminal extraction error.
    pub async fn run(
        &self,
        inputs: &[ComparisonInput],
        mut on_progress: impl FnMut(usize, ExtractionProgress),
    ) -> Result<ComparisonReport> {
        if !(MIN_DOCUMENTS..=MAX_DOCUMENTS).contains(&inputs.len()) {
            return Err(ExtractError::InvalidRequest(format!(
                "expected {MIN_DOCUMENTS} to {MAX_DOCUMENTS} documents, got {}",
                inputs.len()
            )));
        }

        let mut documents = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            tracing::info!(index, document = input.label(), "processing document");
            let document = match input {
                ComparisonInput::ReferenceText { label, text } => {
                    on_progress(index, ExtractionProgress::new(100.0, "Reference text ready"));
                    DocumentExtractionResult::reference_text(label, text)
                }
                ComparisonInput::File(source) => {
                    on_progress(index, ExtractionProgress::new(0.0, "Starting..."));
                    let mut report = |progress: ExtractionProgress| on_progress(index, progress);
                    self.passwords
                        .run(&source.key(), &source.name, async |password: Option<String>| {
                            self.extractor
                                .extract(source, self.force_ocr, password.as_deref(), &mut report)
                                .await
                        })
                        .await?
                }
            };
            documents.push(document);
        }

        let comparisons = match documents.split_first() {
            Some((baseline, others)) => others
                .iter()
                .enumerate()
                .map(|(offset, other)| PairComparison {
                    baseline: 0,
                    other: offset + 1,
                    result: compare(&baseline.text, &other.text),
                })
                .collect(),
            None => Vec::new(),
        };
        for pair in &comparisons {
            tracing::info!(
                other = pair.other,
                similarity = pair.result.similarity,
                exact = pair.result.is_exact_match,
                "compared against baseline"
            );
        }

        Ok(ComparisonReport {
            documents,
            comparisons,
        })
    }
}
