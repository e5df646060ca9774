use crate::backend::{LoadedPdf, PdfBackend};
use crate::error::Result;
use crate::layout::assemble_page;
use crate::model::{
    LayoutOptions, PageLimits, PageText, PdfExtraction, PdfProcessOptions, ScanThresholds,
};

/// Reading-order text of the page at zero-based `index`.
///
/// # Errors
///
/// Propagates backend failures for the page.
pub fn read_page<D: LoadedPdf + ?Sized>(
    doc: &D,
    index: usize,
    layout: &LayoutOptions,
) -> Result<String> {
    Ok(match doc.page_text(index)? {
        PageText::Positioned(runs) => assemble_page(&runs, layout),
        PageText::Plain(text) => text,
    })
}

/// How many pages structural extraction reads from a `page_count`-page document.
#[must_use]
pub fn pages_to_read(page_count: usize, limits: &PageLimits) -> usize {
    if page_count > limits.text_page_limit {
        tracing::warn!(
            page_count,
            limit = limits.text_page_limit,
            "document exceeds the text page limit, reading the leading pages only"
        );
    }
    page_count.min(limits.text_page_limit)
}

/// Accumulates per-page text into a [`PdfExtraction`].
#[derive(Debug)]
pub struct ExtractionBuilder {
    text: String,
    page_count: usize,
    pages_read: usize,
}

impl ExtractionBuilder {
    /// Start collecting pages of a `page_count`-page document.
    #[must_use]
    pub const fn new(page_count: usize) -> Self {
        Self {
            text: String::new(),
            page_count,
            pages_read: 0,
        }
    }

    /// Append the next page; every page gets a trailing newline.
    pub fn push_page(&mut self, page: &str) {
        self.text.push_str(page);
        self.text.push('\n');
        self.pages_read += 1;
    }

    /// Trim the collected text and classify it.
    #[must_use]
    pub fn finish(self, scan: &ScanThresholds) -> PdfExtraction {
        let text = self.text.trim().to_string();
        let is_scanned = self.page_count > 0 && text.chars().count() < scan.document_min_chars;
        PdfExtraction {
            text,
            page_count: self.page_count,
            pages_read: self.pages_read,
            is_scanned,
        }
    }
}

/// Extract reading-order text from a whole PDF.
///
/// # Errors
///
/// Returns the backend's password errors unchanged so the caller can prompt and retry,
/// or a parse error for unreadable input.
pub fn extract_text<B: PdfBackend>(
    backend: &B,
    bytes: &[u8],
    password: Option<&str>,
    options: &PdfProcessOptions,
) -> Result<PdfExtraction> {
    let doc = backend.open(bytes, password)?;
    let page_count = doc.page_count();
    let mut builder = ExtractionBuilder::new(page_count);

    for index in 0..pages_to_read(page_count, &options.limits) {
        builder.push_page(&read_page(&doc, index, &options.layout)?);
    }

    let extraction = builder.finish(&options.scan);
    tracing::debug!(
        page_count,
        pages_read = extraction.pages_read,
        chars = extraction.text.len(),
        is_scanned = extraction.is_scanned,
        "structural extraction finished"
    );
    Ok(extraction)
}
