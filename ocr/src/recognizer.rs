use std::path::PathBuf;
use std::sync::Arc;

use image::RgbImage;

use crate::error::{OcrError, Result};
use crate::filter::OcrLine;

/// A text recognition engine for a single fixed language.
///
/// `progress` receives the fraction of the image recognized so far, in `0.0..=1.0`.
/// Engines without incremental feedback report `0.0` and `1.0` only.
pub trait Recognizer {
    /// Recognize the lines of text in `image`.
    ///
    /// # Errors
    ///
    /// Fails when the engine cannot process the image.
    fn recognize(&self, image: &RgbImage, progress: &mut dyn FnMut(f32))
    -> Result<Vec<OcrLine>>;
}

impl<R: Recognizer + ?Sized> Recognizer for Arc<R> {
    fn recognize(
        &self,
        image: &RgbImage,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<OcrLine>> {
        (**self).recognize(image, progress)
    }
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn recognize(
        &self,
        image: &RgbImage,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<OcrLine>> {
        (**self).recognize(image, progress)
    }
}

/// Stand-in used when no OCR models are configured; every call fails.
#[derive(Debug, Clone)]
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    /// Create a recognizer that fails with `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Recognizer for UnavailableRecognizer {
    fn recognize(
        &self,
        _image: &RgbImage,
        _progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<OcrLine>> {
        Err(OcrError::Unavailable(self.reason.clone()))
    }
}

/// ONNX model bundle for the Paddle recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddleModels {
    /// Text detection model (.onnx).
    pub det_model_path: PathBuf,
    /// Text recognition model (.onnx).
    pub rec_model_path: PathBuf,
    /// Character dictionary for the recognition model.
    pub char_dict_path: PathBuf,
    /// Optional text line orientation classifier (.onnx).
    pub cls_model_path: Option<PathBuf>,
}

impl PaddleModels {
    /// Conventional file names inside a model directory:
    /// `det.onnx`, `rec.onnx`, `dict.txt` and, if present, `cls.onnx`.
    #[must_use]
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let cls = dir.join("cls.onnx");
        Self {
            det_model_path: dir.join("det.onnx"),
            rec_model_path: dir.join("rec.onnx"),
            char_dict_path: dir.join("dict.txt"),
            cls_model_path: cls.exists().then_some(cls),
        }
    }
}

#[cfg(feature = "paddle")]
pub use paddle::PaddleRecognizer;

#[cfg(feature = "paddle")]
mod paddle {
    use std::fmt;

    use image::RgbImage;
    use oar_ocr::oarocr::{OAROCR, OAROCRBuilder};

    use super::{PaddleModels, Recognizer};
    use crate::error::{OcrError, Result};
    use crate::filter::OcrLine;

    /// Recognizer running PaddleOCR ONNX models in-process.
    pub struct PaddleRecognizer {
        ocr: OAROCR,
    }

    impl fmt::Debug for PaddleRecognizer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("PaddleRecognizer").finish_non_exhaustive()
        }
    }

    impl PaddleRecognizer {
        /// Load the models once; they are reused for every page.
        ///
        /// # Errors
        ///
        /// Fails when any model file cannot be loaded.
        pub fn new(models: &PaddleModels) -> Result<Self> {
            let mut builder = OAROCRBuilder::new(
                &models.det_model_path,
                &models.rec_model_path,
                &models.char_dict_path,
            );
            if let Some(cls) = models.cls_model_path.as_deref() {
                builder = builder.with_text_line_orientation_classification(cls);
            }
            let ocr = builder
                .image_batch_size(1)
                .region_batch_size(16)
                .build()
                .map_err(|e| OcrError::ModelLoad(e.to_string()))?;
            tracing::debug!(models = ?models, "loaded paddle OCR models");
            Ok(Self { ocr })
        }
    }

    impl Recognizer for PaddleRecognizer {
        fn recognize(
            &self,
            image: &RgbImage,
            progress: &mut dyn FnMut(f32),
        ) -> Result<Vec<OcrLine>> {
            progress(0.0);
            let mut results = self
                .ocr
                .predict(vec![image.clone()])
                .map_err(|e| OcrError::Recognition(e.to_string()))?;
            progress(1.0);

            let Some(result) = results.pop() else {
                return Ok(Vec::new());
            };
            Ok(result
                .text_regions
                .into_iter()
                .filter_map(|region| {
                    let text = region.text.as_deref()?.to_string();
                    let confidence = region.confidence.map_or(100.0, |c| c * 100.0);
                    Some(OcrLine::new(text, confidence))
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_recognizer_always_fails() {
        let recognizer = UnavailableRecognizer::new("no models configured");
        let err = recognizer
            .recognize(&RgbImage::new(4, 4), &mut |_| {})
            .unwrap_err();
        assert!(matches!(err, OcrError::Unavailable(reason) if reason == "no models configured"));
    }

    #[test]
    fn model_dir_uses_conventional_names() {
        let models = PaddleModels::from_dir("/nonexistent/models");
        assert_eq!(models.det_model_path, PathBuf::from("/nonexistent/models/det.onnx"));
        assert_eq!(models.rec_model_path, PathBuf::from("/nonexistent/models/rec.onnx"));
        assert_eq!(models.char_dict_path, PathBuf::from("/nonexistent/models/dict.txt"));
        assert_eq!(models.cls_model_path, None);
    }
}
