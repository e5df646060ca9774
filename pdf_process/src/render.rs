use image::RgbImage;
use pdfium_render::prelude::*;

use crate::error::{PdfProcessError, Result};

/// Rasterize one page at `dpi`, never narrower than 256 pixels.
pub(crate) fn render_page(page: &PdfPage<'_>, dpi: u16) -> Result<RgbImage> {
    let target_width = target_width(page.width().value, dpi);

    let render_config = PdfRenderConfig::new()
        .set_target_width(target_width)
        .rotate_if_landscape(PdfPageRenderRotation::None, true);

    let image = page
        .render_with_config(&render_config)
        .map_err(|e| PdfProcessError::Render(e.to_string()))?
        .as_image()
        .into_rgb8();
    tracing::trace!(
        width = image.width(),
        height = image.height(),
        dpi,
        "rendered page"
    );
    Ok(image)
}

#[allow(clippy::cast_possible_truncation)]
fn target_width(width_pt: f32, dpi: u16) -> i32 {
    let dpi = dpi.max(72);
    ((width_pt.max(1.0) / 72.0) * f32::from(dpi)).round().max(256.0) as i32
}

#[cfg(test)]
mod tests {
    use super::target_width;

    #[test]
    fn letter_page_at_double_scale() {
        assert_eq!(target_width(612.0, 144), 1224);
    }

    #[test]
    fn tiny_pages_are_clamped() {
        assert_eq!(target_width(10.0, 144), 256);
        assert_eq!(target_width(0.0, 144), 256);
    }

    #[test]
    fn dpi_floor_is_72() {
        assert_eq!(target_width(720.0, 10), 720);
    }
}
