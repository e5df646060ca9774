use std::fmt;
use std::path::PathBuf;

use image::RgbImage;
use pdfium_render::prelude::{PdfDocument, PdfPage, Pdfium, PdfiumError, PdfiumInternalError};

use crate::backend::{LoadedPdf, PdfBackend};
use crate::error::{PdfProcessError, Result};
use crate::model::{PageText, PdfProcessOptions, TextRun};
use crate::render::render_page;

pub(crate) fn bind_pdfium(options: &PdfProcessOptions) -> Result<Pdfium> {
    let mut path = options
        .pdfium_library_path
        .as_ref()
        .ok_or(PdfProcessError::MissingPdfiumLibraryPath)
        .map(PathBuf::from)?;
    if path.is_dir() {
        path = Pdfium::pdfium_platform_library_name_at_path(&path);
    }

    let bindings = Pdfium::bind_to_library(&path).map_err(map_pdfium_load_error)?;
    tracing::debug!(path = %path.display(), "bound pdfium library");
    Ok(Pdfium::new(bindings))
}

fn map_pdfium_load_error(error: PdfiumError) -> PdfProcessError {
    PdfProcessError::PdfiumLoad(error.to_string())
}

fn map_open_error(error: PdfiumError, password: Option<&str>) -> PdfProcessError {
    match error {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            PdfProcessError::password(password.is_some())
        }
        other => PdfProcessError::Parse(other.to_string()),
    }
}

/// Backend driving a dynamically loaded Pdfium library.
///
/// Pages come back as positioned runs, so tables keep their columns after
/// reconstruction, and pages can be rasterized for OCR.
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl fmt::Debug for PdfiumBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfiumBackend").finish_non_exhaustive()
    }
}

impl PdfiumBackend {
    /// Bind the library named by [`PdfProcessOptions::pdfium_library_path`].
    ///
    /// # Errors
    ///
    /// Fails when no path is configured or the library cannot be loaded.
    pub fn new(options: &PdfProcessOptions) -> Result<Self> {
        Ok(Self {
            pdfium: bind_pdfium(options)?,
        })
    }
}

/// Document opened by [`PdfiumBackend`].
pub struct PdfiumDocument<'a> {
    doc: PdfDocument<'a>,
}

impl fmt::Debug for PdfiumDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfiumDocument")
            .field("page_count", &self.page_count())
            .finish()
    }
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>> {
        let out_of_range = || PdfProcessError::PageOutOfRange {
            index,
            page_count: self.page_count(),
        };
        if index >= self.page_count() {
            return Err(out_of_range());
        }
        let page_index = index.try_into().map_err(|_| out_of_range())?;
        self.doc
            .pages()
            .get(page_index)
            .map_err(|e| PdfProcessError::Parse(e.to_string()))
    }
}

impl PdfBackend for PdfiumBackend {
    type Document<'a> = PdfiumDocument<'a>;

    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<Self::Document<'a>> {
        let doc = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| map_open_error(e, password))?;
        Ok(PdfiumDocument { doc })
    }
}

impl LoadedPdf for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        usize::try_from(self.doc.pages().len()).unwrap_or(0)
    }

    fn page_text(&self, index: usize) -> Result<PageText> {
        let page = self.page(index)?;
        let text = page
            .text()
            .map_err(|e| PdfProcessError::Parse(e.to_string()))?;

        let runs = text
            .segments()
            .iter()
            .map(|segment| {
                let bounds = segment.bounds();
                TextRun::new(
                    segment.text(),
                    bounds.left().value,
                    bounds.bottom().value,
                    bounds.width().value,
                )
            })
            .collect();
        Ok(PageText::Positioned(runs))
    }

    fn render_page(&self, index: usize, dpi: u16) -> Result<RgbImage> {
        let page = self.page(index)?;
        render_page(&page, dpi)
    }
}
