/// A positioned run of glyphs on a page, in PDF user space.
///
/// `y` is the baseline; larger values are higher on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Text carried by the run.
    pub text: String,
    /// Left edge of the run.
    pub x: f32,
    /// Baseline of the run.
    pub y: f32,
    /// Horizontal extent of the run.
    pub width: f32,
}

impl TextRun {
    /// Create a run at the given baseline position.
    #[must_use]
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
        }
    }

    /// Right edge of the run.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Text content of one page as delivered by a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum PageText {
    /// Positioned runs that still need reading-order reconstruction.
    Positioned(Vec<TextRun>),
    /// Text already in reading order.
    Plain(String),
}

impl PageText {
    /// Raw glyph text without any layout: run texts concatenated as-is.
    #[must_use]
    pub fn raw(&self) -> String {
        match self {
            Self::Positioned(runs) => runs.iter().map(|run| run.text.as_str()).collect(),
            Self::Plain(text) => text.clone(),
        }
    }
}

/// Reading-order reconstruction tolerances, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Runs whose baselines differ by at most this much share a row.
    pub row_tolerance: f32,
    /// Gaps wider than this become a space.
    pub space_gap: f32,
    /// Gaps wider than this become a tab (a reconstructed table column).
    pub tab_gap: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            space_gap: 1.0,
            tab_gap: 15.0,
        }
    }
}

/// Character thresholds below which a document counts as scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanThresholds {
    /// Minimum trimmed characters in the pre-check sample.
    pub sample_min_chars: usize,
    /// Number of leading pages sampled by the pre-check.
    pub sample_pages: usize,
    /// Minimum trimmed characters in a fully extracted document.
    pub document_min_chars: usize,
}

impl Default for ScanThresholds {
    fn default() -> Self {
        Self {
            sample_min_chars: 50,
            sample_pages: 2,
            document_min_chars: 100,
        }
    }
}

/// Page caps bounding the expensive stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// At most this many pages are rasterized for OCR.
    pub ocr_hard_limit: usize,
    /// At most this many pages are read by structural extraction.
    pub text_page_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            ocr_hard_limit: 50,
            text_page_limit: 1000,
        }
    }
}

/// Runtime options for PDF processing.
#[derive(Debug, Clone, Default)]
pub struct PdfProcessOptions {
    /// Absolute path to the Pdfium dynamic library, or a directory containing it.
    pub pdfium_library_path: Option<String>,
    /// Render DPI used when rasterizing pages for OCR. Defaults to 144 (2x scale).
    pub render_dpi: Option<u16>,
    /// Reading-order reconstruction tolerances.
    pub layout: LayoutOptions,
    /// Scanned-document heuristics.
    pub scan: ScanThresholds,
    /// Page caps.
    pub limits: PageLimits,
}

impl PdfProcessOptions {
    /// Default render DPI for OCR rasterization.
    pub const DEFAULT_RENDER_DPI: u16 = 144;

    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Pdfium library location.
    #[must_use]
    pub fn with_pdfium_library_path(mut self, path: impl Into<String>) -> Self {
        self.pdfium_library_path = Some(path.into());
        self
    }

    /// Sets the OCR render DPI.
    #[must_use]
    pub const fn with_render_dpi(mut self, dpi: u16) -> Self {
        self.render_dpi = Some(dpi);
        self
    }

    /// Sets the layout tolerances.
    #[must_use]
    pub const fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the scanned-document thresholds.
    #[must_use]
    pub const fn with_scan_thresholds(mut self, scan: ScanThresholds) -> Self {
        self.scan = scan;
        self
    }

    /// Sets the page caps.
    #[must_use]
    pub const fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Effective render DPI, never below 72.
    #[must_use]
    pub fn effective_render_dpi(&self) -> u16 {
        self.render_dpi.unwrap_or(Self::DEFAULT_RENDER_DPI).max(72)
    }
}

/// Reading-order text of a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfExtraction {
    /// Trimmed document text, pages separated by newlines.
    pub text: String,
    /// Total pages in the document.
    pub page_count: usize,
    /// Pages actually read (may be capped by [`PageLimits::text_page_limit`]).
    pub pages_read: usize,
    /// The extracted text is too short to be a text-based document.
    pub is_scanned: bool,
}

/// Cheap up-front facts about a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreCheckResult {
    /// Total pages, zero when the document is password protected.
    pub page_count: usize,
    /// The sampled pages carry almost no text. A heuristic, not a guarantee.
    pub is_scanned: bool,
    /// Opening the document needs a password.
    pub is_password_protected: bool,
    /// Trimmed character count of the sampled pages.
    pub sample_text_length: usize,
}

impl PreCheckResult {
    /// Marker returned when the document cannot be opened without a password.
    #[must_use]
    pub const fn password_protected() -> Self {
        Self {
            page_count: 0,
            is_scanned: false,
            is_password_protected: true,
            sample_text_length: 0,
        }
    }

    /// What OCR would cost for this document, if it looks scanned.
    #[must_use]
    pub fn ocr_advisory(&self, limits: &PageLimits) -> Option<OcrAdvisory> {
        if !self.is_scanned || self.is_password_protected {
            return None;
        }
        Some(OcrAdvisory {
            page_count: self.page_count,
            exceeds_limit: self.page_count > limits.ocr_hard_limit,
            pages_to_process: self.page_count.min(limits.ocr_hard_limit),
        })
    }

    /// The document is longer than structural extraction will read.
    #[must_use]
    pub const fn exceeds_text_limit(&self, limits: &PageLimits) -> bool {
        self.page_count > limits.text_page_limit
    }
}

/// Warning data for a scanned document about to go through OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrAdvisory {
    /// Pages in the document.
    pub page_count: usize,
    /// The document has more pages than OCR will process.
    pub exceeds_limit: bool,
    /// Pages OCR will actually process.
    pub pages_to_process: usize,
}
