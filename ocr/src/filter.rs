/// One recognized line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    /// Recognized text.
    pub text: String,
    /// Recognizer confidence, 0 to 100.
    pub confidence: f32,
}

impl OcrLine {
    /// Create a line.
    #[must_use]
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Drops recognized lines that are probably logos, rules or stray glyphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseFilter {
    /// Lines below this confidence are dropped outright.
    pub min_confidence: f32,
    /// Lines at most this many characters long are "short".
    pub short_line_max_chars: usize,
    /// Short lines below this confidence are dropped.
    pub short_line_min_confidence: f32,
    /// Lines whose letter/digit share is below this ratio are dropped...
    pub min_alnum_ratio: f32,
    /// ...but only when longer than this many characters.
    pub alnum_check_min_chars: usize,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self {
            min_confidence: 40.0,
            short_line_max_chars: 2,
            short_line_min_confidence: 70.0,
            min_alnum_ratio: 0.3,
            alnum_check_min_chars: 3,
        }
    }
}

impl NoiseFilter {
    /// The trimmed text of `line` if it survives the filter.
    #[must_use]
    pub fn keep<'a>(&self, line: &'a OcrLine) -> Option<&'a str> {
        if line.confidence < self.min_confidence {
            return None;
        }
        let text = line.text.trim();
        if text.is_empty() {
            return None;
        }

        let len = text.chars().count();
        let alnum = text.chars().filter(|c| c.is_alphanumeric()).count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = alnum as f32 / len as f32;
        if len > self.alnum_check_min_chars && ratio < self.min_alnum_ratio {
            return None;
        }
        if len <= self.short_line_max_chars && line.confidence < self.short_line_min_confidence {
            return None;
        }
        Some(text)
    }

    /// Filter a page's lines.
    ///
    /// Returns the surviving lines joined with `\n` and their mean confidence, or `None`
    /// when nothing survives.
    #[must_use]
    pub fn apply(&self, lines: &[OcrLine]) -> Option<(String, f32)> {
        let mut kept = Vec::new();
        let mut confidence = 0.0;
        for line in lines {
            if let Some(text) = self.keep(line) {
                kept.push(text);
                confidence += line.confidence;
            }
        }
        if kept.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = confidence / kept.len() as f32;
        Some((kept.join("\n"), mean))
    }
}
