use std::time::Duration;

/// A progress signal: percent complete and a status line for the user.
///
/// Meant to be non-decreasing, but callers should not rely on strict monotonicity.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionProgress {
    /// 0 to 100.
    pub percent: f32,
    /// Human-readable status.
    pub message: String,
}

impl ExtractionProgress {
    /// Create a progress signal, clamping `percent` into range.
    #[must_use]
    pub fn new(percent: f32, message: impl Into<String>) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
            message: message.into(),
        }
    }
}

/// Maps `fraction` of a stage onto the `start..start + span` percent band.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn band(start: f32, span: f32, done: usize, total: usize) -> f32 {
    if total == 0 {
        return start + span;
    }
    start + (done as f32 / total as f32) * span
}

/// "about 1m 05s left", or an empty string when nothing is known yet.
pub(crate) fn remaining_suffix(remaining: Option<Duration>) -> String {
    let Some(remaining) = remaining else {
        return String::new();
    };
    let secs = remaining.as_secs();
    if secs >= 60 {
        format!(" · about {}m {:02}s left", secs / 60, secs % 60)
    } else {
        format!(" · about {secs}s left")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_clamped() {
        assert!((ExtractionProgress::new(140.0, "").percent - 100.0).abs() < f32::EPSILON);
        assert!(ExtractionProgress::new(-3.0, "").percent.abs() < f32::EPSILON);
    }

    #[test]
    fn bands_map_pages() {
        assert!((band(10.0, 40.0, 1, 4) - 20.0).abs() < f32::EPSILON);
        assert!((band(10.0, 40.0, 4, 4) - 50.0).abs() < f32::EPSILON);
        assert!((band(50.0, 20.0, 0, 0) - 70.0).abs() < f32::EPSILON);
    }

    #[test]
    fn remaining_time_formatting() {
        assert_eq!(remaining_suffix(None), "");
        assert_eq!(remaining_suffix(Some(Duration::from_secs(42))), " · about 42s left");
        assert_eq!(remaining_suffix(Some(Duration::from_secs(65))), " · about 1m 05s left");
    }
}
