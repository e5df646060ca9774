use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbImage;

use crate::error::Result;
use crate::filter::{NoiseFilter, OcrLine};
use crate::recognizer::Recognizer;

/// Options for [`OcrPipeline`].
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Line-level noise filter.
    pub filter: NoiseFilter,
    /// Yield to the executor after this many pages. Zero disables yielding.
    pub yield_every_pages: usize,
    /// Language of the single recognition model, for logs and reports.
    pub language: String,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            filter: NoiseFilter::default(),
            yield_every_pages: 2,
            language: "en".to_string(),
        }
    }
}

impl OcrOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the noise filter.
    #[must_use]
    pub const fn with_filter(mut self, filter: NoiseFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets how often the pipeline yields.
    #[must_use]
    pub const fn with_yield_every_pages(mut self, pages: usize) -> Self {
        self.yield_every_pages = pages;
        self
    }

    /// Sets the model language label.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Recognized text of a page batch or a single image.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    /// Filtered text; pages separated by newlines.
    pub text: String,
    /// Mean confidence (0 to 100) over pages that kept at least one line, or 0.
    pub confidence: f32,
    /// Pages that kept at least one line.
    pub pages_with_text: usize,
}

/// Progress of a running OCR job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcrProgress {
    /// Zero-based index of the page being recognized.
    pub page: usize,
    /// Pages in the job.
    pub total_pages: usize,
    /// Recognition progress inside the current page, `0.0..=1.0`.
    pub page_fraction: f32,
    /// Estimated time left, once at least one page has finished.
    pub remaining: Option<Duration>,
}

impl OcrProgress {
    /// Progress of the whole job, `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn overall(&self) -> f32 {
        if self.total_pages == 0 {
            return 1.0;
        }
        ((self.page as f32 + self.page_fraction.clamp(0.0, 1.0)) / self.total_pages as f32)
            .min(1.0)
    }
}

/// Runs a [`Recognizer`] over pages, filters noise, and reports progress.
///
/// Recognition is CPU-bound, so every page is recognized on the `blocking` thread pool while
/// the calling task relays the recognizer's sub-page progress.
#[derive(Debug)]
pub struct OcrPipeline<R> {
    recognizer: Arc<R>,
    options: OcrOptions,
}

impl<R: Recognizer + Send + Sync + 'static> OcrPipeline<R> {
    /// Create a pipeline around `recognizer`.
    #[must_use]
    pub fn new(recognizer: R, options: OcrOptions) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            options,
        }
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> &OcrOptions {
        &self.options
    }

    /// Start a job over `total_pages` pages supplied one at a time.
    #[must_use]
    pub fn session(&self, total_pages: usize) -> OcrSession<'_, R> {
        tracing::info!(pages = total_pages, language = %self.options.language, "starting OCR");
        OcrSession {
            pipeline: self,
            total_pages,
            next_page: 0,
            started: Instant::now(),
            texts: Vec::new(),
            confidence_sum: 0.0,
        }
    }

    /// Recognize a batch of rasterized pages.
    ///
    /// # Errors
    ///
    /// The first recognizer failure aborts the batch.
    pub async fn run_batch(
        &self,
        pages: Vec<RgbImage>,
        mut on_progress: impl FnMut(&OcrProgress),
    ) -> Result<OcrResult> {
        let mut session = self.session(pages.len());
        for image in pages {
            session.recognize(image, &mut on_progress).await?;
        }
        Ok(session.finish())
    }

    /// Recognize one standalone image.
    ///
    /// # Errors
    ///
    /// Fails when the recognizer fails.
    pub async fn run_single(
        &self,
        image: RgbImage,
        on_progress: impl FnMut(&OcrProgress),
    ) -> Result<OcrResult> {
        self.run_batch(vec![image], on_progress).await
    }

    /// Decode encoded image bytes and recognize them.
    ///
    /// # Errors
    ///
    /// Fails when the bytes are not a supported image or recognition fails.
    pub async fn run_encoded(
        &self,
        bytes: &[u8],
        on_progress: impl FnMut(&OcrProgress),
    ) -> Result<OcrResult> {
        let image = decode_image(bytes)?;
        self.run_single(image, on_progress).await
    }

    async fn recognize_off_task(
        &self,
        image: RgbImage,
        report: &mut dyn FnMut(f32),
    ) -> Result<Vec<OcrLine>> {
        let recognizer = Arc::clone(&self.recognizer);
        let (tx, rx) = async_channel::unbounded();
        let task = blocking::unblock(move || {
            recognizer.recognize(&image, &mut |fraction: f32| {
                let _ = tx.try_send(fraction);
            })
        });
        // The channel closes once the recognizer returns and drops its sender.
        while let Ok(fraction) = rx.recv().await {
            report(fraction);
        }
        task.await
    }
}

/// An OCR job fed one page at a time, so only the page being recognized is held in memory.
#[derive(Debug)]
pub struct OcrSession<'p, R> {
    pipeline: &'p OcrPipeline<R>,
    total_pages: usize,
    next_page: usize,
    started: Instant,
    texts: Vec<String>,
    confidence_sum: f32,
}

impl<R: Recognizer + Send + Sync + 'static> OcrSession<'_, R> {
    /// Recognize the next page and keep its filtered text.
    ///
    /// # Errors
    ///
    /// Fails when the recognizer fails; the session should then be dropped.
    pub async fn recognize(
        &mut self,
        image: RgbImage,
        mut on_progress: impl FnMut(&OcrProgress),
    ) -> Result<()> {
        let page = self.next_page;
        self.next_page += 1;
        let total_pages = self.total_pages.max(self.next_page);
        let remaining = estimate_remaining(self.started.elapsed(), page, total_pages);
        let mut report = |page_fraction: f32| {
            on_progress(&OcrProgress {
                page,
                total_pages,
                page_fraction,
                remaining,
            });
        };
        report(0.0);

        let lines = self.pipeline.recognize_off_task(image, &mut report).await?;
        match self.pipeline.options.filter.apply(&lines) {
            Some((text, confidence)) => {
                tracing::debug!(page, lines = lines.len(), confidence, "recognized page");
                self.texts.push(text);
                self.confidence_sum += confidence;
            }
            None => tracing::debug!(page, lines = lines.len(), "page filtered out entirely"),
        }

        let every = self.pipeline.options.yield_every_pages;
        if every > 0 && self.next_page % every == 0 {
            futures_lite::future::yield_now().await;
        }
        Ok(())
    }

    /// Join the kept text and average the confidence.
    #[must_use]
    pub fn finish(self) -> OcrResult {
        finish(&self.texts, self.confidence_sum)
    }
}

/// Decode PNG, JPEG, GIF, BMP, WebP or TIFF bytes into RGB.
///
/// # Errors
///
/// Fails when the format is unknown or the data is corrupt.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    Ok(image::load_from_memory(bytes)?.into_rgb8())
}

#[allow(clippy::cast_precision_loss)]
fn finish(texts: &[String], confidence_sum: f32) -> OcrResult {
    let pages_with_text = texts.len();
    let confidence = if pages_with_text == 0 {
        0.0
    } else {
        confidence_sum / pages_with_text as f32
    };
    OcrResult {
        text: texts.join("\n").trim().to_string(),
        confidence,
        pages_with_text,
    }
}

fn estimate_remaining(elapsed: Duration, done: usize, total: usize) -> Option<Duration> {
    if done == 0 {
        return None;
    }
    let per_page = elapsed / u32::try_from(done).ok()?;
    per_page.checked_mul(u32::try_from(total.saturating_sub(done)).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_estimate_before_first_page() {
        assert_eq!(estimate_remaining(Duration::from_secs(3), 0, 10), None);
    }

    #[test]
    fn estimate_scales_with_pages_left() {
        assert_eq!(
            estimate_remaining(Duration::from_secs(6), 2, 5),
            Some(Duration::from_secs(9))
        );
        assert_eq!(
            estimate_remaining(Duration::from_secs(6), 5, 5),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn overall_progress_includes_sub_page_fraction() {
        let progress = OcrProgress {
            page: 1,
            total_pages: 4,
            page_fraction: 0.5,
            remaining: None,
        };
        assert!((progress.overall() - 0.375).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_batch_has_zero_confidence() {
        let result = finish(&[], 0.0);
        assert_eq!(result.text, "");
        assert!(result.confidence.abs() < f32::EPSILON);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(decode_image(b"not an image").is_err());
    }
}
