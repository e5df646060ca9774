use image::RgbImage;
use lopdf::Document;

use crate::backend::{LoadedPdf, PdfBackend};
use crate::error::{PdfProcessError, Result};
use crate::model::PageText;

/// Pure-Rust backend built on `lopdf`.
///
/// Pages come back as plain text in content-stream order, so no layout reconstruction is
/// possible, and pages cannot be rasterized. It needs no native library, which makes it
/// the cheap choice for pre-checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

/// Document opened by [`LopdfBackend`].
#[derive(Debug)]
pub struct LopdfDocument {
    doc: Document,
    page_numbers: Vec<u32>,
}

impl PdfBackend for LopdfBackend {
    type Document<'a> = LopdfDocument;

    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<Self::Document<'a>> {
        let mut doc =
            Document::load_mem(bytes).map_err(|e| map_load_error(&e.to_string(), password))?;

        if doc.is_encrypted() {
            doc.decrypt(password.unwrap_or_default())
                .map_err(|_| PdfProcessError::password(password.is_some()))?;
        }

        let mut page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        page_numbers.sort_unstable();
        Ok(LopdfDocument { doc, page_numbers })
    }
}

impl LoadedPdf for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<PageText> {
        let page_number =
            self.page_numbers
                .get(index)
                .ok_or(PdfProcessError::PageOutOfRange {
                    index,
                    page_count: self.page_numbers.len(),
                })?;
        Ok(PageText::Plain(text_or_empty(
            self.doc.extract_text(&[*page_number]),
            index,
        )))
    }

    fn render_page(&self, _index: usize, _dpi: u16) -> Result<RgbImage> {
        Err(PdfProcessError::RenderUnsupported)
    }
}

// Pages with fonts lopdf cannot decode read as empty instead of failing the document.
fn text_or_empty<E: std::fmt::Display>(
    decoded: std::result::Result<String, E>,
    index: usize,
) -> String {
    decoded.unwrap_or_else(|err| {
        tracing::warn!(page = index + 1, error = %err, "could not decode page text");
        String::new()
    })
}

fn map_load_error(message: &str, password: Option<&str>) -> PdfProcessError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("password") || lower.contains("decrypt") || lower.contains("encrypt") {
        PdfProcessError::password(password.is_some())
    } else {
        PdfProcessError::Parse(message.to_string())
    }
}
