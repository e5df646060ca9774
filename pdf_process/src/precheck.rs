use crate::backend::{LoadedPdf, PdfBackend};
use crate::error::Result;
use crate::model::{PreCheckResult, ScanThresholds};

/// Probe a PDF for page count, scanned-ness and password protection.
///
/// Encryption never surfaces as an error here: a document that cannot be opened without
/// a password yields [`PreCheckResult::password_protected`]. Only the first
/// [`ScanThresholds::sample_pages`] pages are read, as raw glyph text without layout.
///
/// # Errors
///
/// Fails for input that is not a readable PDF at all.
pub fn pre_check<B: PdfBackend>(
    backend: &B,
    bytes: &[u8],
    password: Option<&str>,
    scan: &ScanThresholds,
) -> Result<PreCheckResult> {
    let doc = match backend.open(bytes, password) {
        Ok(doc) => doc,
        Err(err) if err.is_password_error() => {
            tracing::debug!(error = %err, "pre-check hit a password-protected document");
            return Ok(PreCheckResult::password_protected());
        }
        Err(err) => return Err(err),
    };

    let page_count = doc.page_count();
    let mut sample = String::new();
    for index in 0..page_count.min(scan.sample_pages) {
        sample.push_str(&doc.page_text(index)?.raw());
    }

    let sample_text_length = sample.trim().chars().count();
    Ok(PreCheckResult {
        page_count,
        is_scanned: sample_text_length < scan.sample_min_chars,
        is_password_protected: false,
        sample_text_length,
    })
}
