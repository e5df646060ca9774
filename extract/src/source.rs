use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::Path;

use crate::error::{ExtractError, Result};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];
const WORD_EXTENSIONS: &[&str] = &["docx", "doc"];
const WORD_MEDIA_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
];

/// A document blob with its declared name and media type. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File contents.
    pub bytes: Vec<u8>,
    /// Declared file name, used for type detection and messages.
    pub name: String,
    /// Declared MIME type; may be empty.
    pub media_type: String,
}

impl SourceFile {
    /// Wrap bytes with a name and media type.
    #[must_use]
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        name: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            name: name.into(),
            media_type: media_type.into(),
        }
    }

    /// Read a file from disk, guessing the media type from its extension.
    ///
    /// # Errors
    ///
    /// Fails with [`ExtractError::ExtractionFailure`] when the file cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let bytes = std::fs::read(path).map_err(|e| ExtractError::ExtractionFailure {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        let media_type = media_type_for(&name).unwrap_or_default().to_string();
        Ok(Self::new(bytes, name, media_type))
    }

    /// Lower-cased extension of the declared name.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    /// Classify by extension first, then by media type.
    #[must_use]
    pub fn kind(&self) -> Option<FileKind> {
        let media_type = self.media_type.to_ascii_lowercase();
        let extension = self.extension();
        let ext = extension.as_deref().unwrap_or_default();

        if IMAGE_EXTENSIONS.contains(&ext) || media_type.starts_with("image/") {
            Some(FileKind::Image)
        } else if WORD_EXTENSIONS.contains(&ext)
            || WORD_MEDIA_TYPES.contains(&media_type.as_str())
        {
            Some(FileKind::Word)
        } else if ext == "pdf" || media_type == "application/pdf" {
            Some(FileKind::Pdf)
        } else {
            None
        }
    }

    /// Identity of this document for the password cache.
    #[must_use]
    pub fn key(&self) -> DocumentKey {
        let mut hasher = DefaultHasher::new();
        self.bytes.hash(&mut hasher);
        DocumentKey {
            name: self.name.clone(),
            len: self.bytes.len(),
            fingerprint: hasher.finish(),
        }
    }
}

/// Extractor family a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// PDF document.
    Pdf,
    /// Word document.
    Word,
    /// Raster image.
    Image,
}

/// Session-scoped identity of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    /// Declared file name.
    pub name: String,
    /// Content length in bytes.
    pub len: usize,
    /// Content hash.
    pub fingerprint: u64,
}

fn media_type_for(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_string_lossy().to_ascii_lowercase();
    Some(match ext.as_str() {
        "pdf" => "application/pdf",
        "docx" => WORD_MEDIA_TYPES[0],
        "doc" => WORD_MEDIA_TYPES[1],
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    })
}
