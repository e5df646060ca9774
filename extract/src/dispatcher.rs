use doccompare_ocr::{OcrOptions, OcrPipeline, OcrProgress, Recognizer};
use doccompare_pdf_process::{
    ExtractionBuilder, LoadedPdf, PdfBackend, PdfExtraction, PdfProcessError, PdfProcessOptions,
    PreCheckResult, pages_to_read, pre_check, read_page,
};
use futures_lite::future::yield_now;
use serde::Serialize;

use crate::error::{ExtractError, Result};
use crate::password::PasswordFlow;
use crate::progress::{ExtractionProgress, band, remaining_suffix};
use crate::source::{FileKind, SourceFile};
use crate::word::extract_word_text;

/// Options for [`DocumentExtractor`].
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// PDF layout, scan heuristics, page caps and rendering.
    pub pdf: PdfProcessOptions,
    /// OCR filtering and scheduling.
    pub ocr: OcrOptions,
}

impl ExtractOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the PDF options.
    #[must_use]
    pub fn with_pdf(mut self, pdf: PdfProcessOptions) -> Self {
        self.pdf = pdf;
        self
    }

    /// Sets the OCR options.
    #[must_use]
    pub fn with_ocr(mut self, ocr: OcrOptions) -> Self {
        self.ocr = ocr;
        self
    }
}

/// Source family of an extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document.
    Pdf,
    /// Word document.
    Word,
    /// Raster image.
    Image,
    /// Reference text typed or pasted by the user.
    Text,
}

/// Text extracted from one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentExtractionResult {
    /// Extracted text, not yet normalized.
    pub text: String,
    /// Declared file name.
    pub file_name: String,
    /// Source family.
    pub file_type: FileType,
    /// The text came from OCR rather than the document's own text layer.
    pub used_ocr: bool,
    /// Mean OCR confidence (0 to 100) when OCR was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,
}

impl DocumentExtractionResult {
    fn direct(file_name: &str, file_type: FileType, text: String) -> Self {
        Self {
            text,
            file_name: file_name.to_string(),
            file_type,
            used_ocr: false,
            ocr_confidence: None,
        }
    }

    fn recognized(file_name: &str, file_type: FileType, text: String, confidence: f32) -> Self {
        Self {
            text,
            file_name: file_name.to_string(),
            file_type,
            used_ocr: true,
            ocr_confidence: Some(confidence),
        }
    }

    /// Wrap user-supplied reference text so it can sit in a comparison run.
    #[must_use]
    pub fn reference_text(label: &str, text: &str) -> Self {
        Self::direct(label, FileType::Text, text.trim().to_string())
    }
}

/// Where PDF extraction stands.
#[derive(Debug)]
enum Stage {
    NotStarted,
    StructuralDone(PdfExtraction),
    OcrFallback { forced: bool },
    Complete(DocumentExtractionResult),
}

/// Routes documents to the right extractor and runs the scanned-PDF OCR fallback.
#[derive(Debug)]
pub struct DocumentExtractor<B, R> {
    backend: B,
    ocr: OcrPipeline<R>,
    pdf: PdfProcessOptions,
}

impl<B, R> DocumentExtractor<B, R>
where
    B: PdfBackend,
    R: Recognizer + Send + Sync + 'static,
{
    /// Build an extractor from a PDF backend and an OCR recognizer.
    pub fn new(backend: B, recognizer: R, options: ExtractOptions) -> Self {
        Self {
            backend,
            ocr: OcrPipeline::new(recognizer, options.ocr),
            pdf: options.pdf,
        }
    }

    /// PDF options in effect.
    #[must_use]
    pub const fn pdf_options(&self) -> &PdfProcessOptions {
        &self.pdf
    }

    /// Cheap probe of a PDF; encryption is reported in the result, never as an error.
    ///
    /// # Errors
    ///
    /// Fails for files that are not PDFs or not readable at all.
    pub fn pre_check(&self, source: &SourceFile, password: Option<&str>) -> Result<PreCheckResult> {
        if source.kind() != Some(FileKind::Pdf) {
            return Err(ExtractError::InvalidRequest(format!(
                "{} is not a PDF",
                source.name
            )));
        }
        pre_check(&self.backend, &source.bytes, password, &self.pdf.scan)
            .map_err(|e| ExtractError::from_pdf(&source.name, e))
    }

    /// Pre-check a PDF, prompting through `passwords` when it is locked.
    ///
    /// Unlike [`pre_check`](Self::pre_check), a locked document is unlocked first so the
    /// result carries its real page count and scan status. The password that worked is
    /// cached in `passwords`, so extracting the same document later does not prompt again.
    ///
    /// # Errors
    ///
    /// Fails like [`pre_check`](Self::pre_check), or with [`ExtractError::Cancelled`] when
    /// the user cancels the prompt.
    pub async fn pre_check_unlocked(
        &self,
        source: &SourceFile,
        passwords: &PasswordFlow,
    ) -> Result<PreCheckResult> {
        passwords
            .run(&source.key(), &source.name, async |password: Option<String>| {
                let check = self.pre_check(source, password.as_deref())?;
                if !check.is_password_protected {
                    return Ok(check);
                }
                let name = source.name.clone();
                Err(if password.is_some() {
                    ExtractError::IncorrectPassword { name }
                } else {
                    ExtractError::PasswordRequired { name }
                })
            })
            .await
    }

    /// Extract the text of `source`.
    ///
    /// Images go straight to OCR and Word files to the Word reader. PDFs are read
    /// structurally first; when `force_ocr` is set or the text layer looks scanned, up to
    /// [`PageLimits::ocr_hard_limit`] pages are rasterized and OCR output replaces the
    /// structural text. Each page is rasterized just before it is recognized.
    ///
    /// [`PageLimits::ocr_hard_limit`]: doccompare_pdf_process::PageLimits::ocr_hard_limit
    ///
    /// # Errors
    ///
    /// Fails with [`ExtractError::UnsupportedFileType`] for unknown files, with the password
    /// kinds for encrypted PDFs, and with [`ExtractError::ExtractionFailure`] otherwise.
    pub async fn extract(
        &self,
        source: &SourceFile,
        force_ocr: bool,
        password: Option<&str>,
        progress: &mut dyn FnMut(ExtractionProgress),
    ) -> Result<DocumentExtractionResult> {
        let kind = source
            .kind()
            .ok_or_else(|| ExtractError::UnsupportedFileType {
                name: source.name.clone(),
            })?;
        tracing::info!(file = %source.name, ?kind, force_ocr, "extracting document");

        match kind {
            FileKind::Image => self.extract_image(source, progress).await,
            FileKind::Word => Self::extract_word(source, progress),
            FileKind::Pdf => self.extract_pdf(source, force_ocr, password, progress).await,
        }
    }

    fn extract_word(
        source: &SourceFile,
        progress: &mut dyn FnMut(ExtractionProgress),
    ) -> Result<DocumentExtractionResult> {
        progress(ExtractionProgress::new(0.0, "Processing Word document..."));
        progress(ExtractionProgress::new(10.0, "Reading Word document..."));
        progress(ExtractionProgress::new(30.0, "Extracting text..."));
        let text = extract_word_text(&source.bytes).map_err(|e| ExtractError::ExtractionFailure {
            name: source.name.clone(),
            reason: e.to_string(),
        })?;
        progress(ExtractionProgress::new(100.0, "Complete"));
        Ok(DocumentExtractionResult::direct(
            &source.name,
            FileType::Word,
            text,
        ))
    }

    async fn extract_image(
        &self,
        source: &SourceFile,
        progress: &mut dyn FnMut(ExtractionProgress),
    ) -> Result<DocumentExtractionResult> {
        progress(ExtractionProgress::new(0.0, "Processing image..."));
        progress(ExtractionProgress::new(70.0, "Initializing OCR..."));
        let result = self
            .ocr
            .run_encoded(&source.bytes, |p: &OcrProgress| {
                progress(ExtractionProgress::new(
                    70.0 + p.overall() * 25.0,
                    format!("OCR progress: {}%", whole_percent(p.page_fraction)),
                ));
            })
            .await
            .map_err(|e| ExtractError::from_ocr(&source.name, &e))?;
        progress(ExtractionProgress::new(100.0, "OCR complete"));
        Ok(DocumentExtractionResult::recognized(
            &source.name,
            FileType::Image,
            result.text,
            result.confidence,
        ))
    }

    async fn extract_pdf(
        &self,
        source: &SourceFile,
        force_ocr: bool,
        password: Option<&str>,
        progress: &mut dyn FnMut(ExtractionProgress),
    ) -> Result<DocumentExtractionResult> {
        let name = source.name.as_str();
        progress(ExtractionProgress::new(0.0, "Processing PDF..."));
        let doc = self
            .backend
            .open(&source.bytes, password)
            .map_err(|e| ExtractError::from_pdf(name, e))?;
        progress(ExtractionProgress::new(10.0, "Loading PDF..."));

        let mut stage = Stage::NotStarted;
        loop {
            tracing::trace!(file = name, ?stage, "pdf stage");
            stage = match stage {
                Stage::NotStarted => {
                    Stage::StructuralDone(self.read_structure(&doc, name, progress).await?)
                }
                Stage::StructuralDone(extraction) if force_ocr || extraction.is_scanned => {
                    tracing::info!(
                        file = name,
                        forced = force_ocr,
                        chars = extraction.text.len(),
                        "falling back to OCR"
                    );
                    Stage::OcrFallback { forced: force_ocr }
                }
                Stage::StructuralDone(extraction) => {
                    progress(ExtractionProgress::new(100.0, "Extraction complete"));
                    Stage::Complete(DocumentExtractionResult::direct(
                        name,
                        FileType::Pdf,
                        extraction.text,
                    ))
                }
                Stage::OcrFallback { forced } => {
                    Stage::Complete(self.recognize_pages(&doc, name, forced, progress).await?)
                }
                Stage::Complete(result) => return Ok(result),
            };
        }
    }

    async fn read_structure<D: LoadedPdf>(
        &self,
        doc: &D,
        name: &str,
        progress: &mut dyn FnMut(ExtractionProgress),
    ) -> Result<PdfExtraction> {
        let page_count = doc.page_count();
        let to_read = pages_to_read(page_count, &self.pdf.limits);
        let mut builder = ExtractionBuilder::new(page_count);

        for index in 0..to_read {
            let page = read_page(doc, index, &self.pdf.layout).map_err(pdf_error(name))?;
            builder.push_page(&page);
            tracing::debug!(file = name, page = index + 1, chars = page.len(), "read page");
            progress(ExtractionProgress::new(
                band(10.0, 40.0, index + 1, to_read),
                format!("Extracting page {}/{to_read}...", index + 1),
            ));
            yield_now().await;
        }
        Ok(builder.finish(&self.pdf.scan))
    }

    async fn recognize_pages<D: LoadedPdf>(
        &self,
        doc: &D,
        name: &str,
        forced: bool,
        progress: &mut dyn FnMut(ExtractionProgress),
    ) -> Result<DocumentExtractionResult> {
        let page_count = doc.page_count();
        let limit = self.pdf.limits.ocr_hard_limit;
        if page_count > limit {
            tracing::warn!(file = name, page_count, limit, "OCR limited to the leading pages");
        }
        let pages = page_count.min(limit);
        progress(ExtractionProgress::new(
            50.0,
            if forced {
                "OCR requested. Starting OCR..."
            } else {
                "PDF appears to be scanned. Starting OCR..."
            },
        ));

        let dpi = self.pdf.effective_render_dpi();
        let mut session = self.ocr.session(pages);
        for index in 0..pages {
            progress(ExtractionProgress::new(
                band(50.0, 45.0, index, pages),
                format!("Converting page {}/{pages} to image...", index + 1),
            ));
            let image = doc.render_page(index, dpi).map_err(pdf_error(name))?;
            session
                .recognize(image, |p: &OcrProgress| {
                    progress(ExtractionProgress::new(
                        50.0 + p.overall() * 45.0,
                        format!(
                            "OCR: Page {}/{} ({}%){}",
                            p.page + 1,
                            p.total_pages,
                            whole_percent(p.page_fraction),
                            remaining_suffix(p.remaining)
                        ),
                    ));
                })
                .await
                .map_err(|e| ExtractError::from_ocr(name, &e))?;
        }
        let result = session.finish();
        progress(ExtractionProgress::new(100.0, "OCR complete"));

        Ok(DocumentExtractionResult::recognized(
            name,
            FileType::Pdf,
            result.text,
            result.confidence,
        ))
    }
}

fn pdf_error(name: &str) -> impl Fn(PdfProcessError) -> ExtractError + '_ {
    move |e| ExtractError::from_pdf(name, e)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_percent(fraction: f32) -> u32 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u32
}
