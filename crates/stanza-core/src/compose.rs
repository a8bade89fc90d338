//! Lay wrapped lines onto a copy of the background
//!
//! The text block starts `padding` pixels from the top and `padding - offset`
//! pixels from the left. When the block plus padding above and below is taller
//! than the background, the copy is stretched vertically (bicubic) to make room.
//! The background template itself is never touched.

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::{
    error::{RenderError, Result},
    wrap::WrapResult,
    Background, FontSpec, LayoutParams,
};

/// Largest canvas side we are willing to allocate
pub const MAX_DIMENSION: u32 = 65_535;

/// Draws wrapped text onto backgrounds
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasComposer {
    layout: LayoutParams,
}

impl CanvasComposer {
    pub fn new(layout: LayoutParams) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LayoutParams {
        &self.layout
    }

    /// Horizontal room the wrapper may use on this background
    ///
    /// May be zero or negative for backgrounds narrower than the padding; the
    /// wrapper rejects those.
    pub fn wrap_width(&self, background: &Background) -> f32 {
        background.width() as f32 - 2.0 * self.layout.padding as f32 + self.layout.offset as f32
    }

    /// Height the canvas needs so `lines` fit with padding above and below
    pub fn required_height(&self, lines: &WrapResult, font: &FontSpec) -> Result<u32> {
        let extent = font
            .face
            .block_extent(lines.lines(), self.layout.line_spacing)?;
        let needed = extent.height.ceil() + 2.0 * self.layout.padding as f32;

        if !needed.is_finite() || needed > MAX_DIMENSION as f32 {
            return Err(RenderError::InvalidDimensions {
                width: 0,
                height: if needed.is_finite() { needed as u32 } else { u32::MAX },
            }
            .into());
        }
        Ok(needed as u32)
    }

    /// Produce a fresh canvas with `lines` drawn on it
    pub fn compose(
        &self,
        lines: &WrapResult,
        font: &FontSpec,
        background: &Background,
    ) -> Result<RgbaImage> {
        let (width, height) = (background.width(), background.height());
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RenderError::InvalidDimensions { width, height }.into());
        }

        let needed = self.required_height(lines, font)?;
        let mut canvas = if needed > height {
            log::debug!(
                "Stretching background '{}' from {}px to {}px tall",
                background.id,
                height,
                needed
            );
            imageops::resize(&*background.image, width, needed, FilterType::CatmullRom)
        } else {
            (*background.image).clone()
        };

        let x = self.layout.padding as f32 - self.layout.offset as f32;
        let step = font.face.line_height() + self.layout.line_spacing;

        for (i, line) in lines.lines().iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let y = self.layout.padding as f32 + i as f32 * step;
            font.face.draw_line(&mut canvas, line, (x, y), self.layout.ink)?;
        }

        Ok(canvas)
    }
}

/// Encode a canvas as PNG
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut png_data = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut png_data, CompressionType::Default, PngFilter::Adaptive);

    encoder
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))?;

    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{traits::GlyphMetrics, traits::GlyphPainter, Color, TextExtent};
    use image::Rgba;
    use std::sync::Arc;

    /// 10px wide, 20px tall boxes of ink per character
    struct Blocks;

    impl GlyphMetrics for Blocks {
        fn measure(&self, line: &str) -> Result<TextExtent> {
            Ok(TextExtent::new(line.chars().count() as f32 * 10.0, 20.0))
        }

        fn line_height(&self) -> f32 {
            20.0
        }
    }

    impl GlyphPainter for Blocks {
        fn name(&self) -> &'static str {
            "blocks"
        }

        fn draw_line(
            &self,
            canvas: &mut RgbaImage,
            line: &str,
            origin: (f32, f32),
            ink: Color,
        ) -> Result<()> {
            let width = line.chars().count() as u32 * 10;
            for dy in 0..20 {
                for dx in 0..width {
                    let (x, y) = (origin.0 as u32 + dx, origin.1 as u32 + dy);
                    if x < canvas.width() && y < canvas.height() {
                        canvas.put_pixel(x, y, Rgba([ink.r, ink.g, ink.b, ink.a]));
                    }
                }
            }
            Ok(())
        }
    }

    fn font() -> FontSpec {
        FontSpec::new("blocks", 20.0, Arc::new(Blocks))
    }

    fn paper(width: u32, height: u32) -> Background {
        Background::new("paper", RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn wrap_width_uses_padding_and_offset() {
        let composer = CanvasComposer::default();
        assert_eq!(composer.wrap_width(&paper(1000, 10)), 825.0);
    }

    #[test]
    fn short_poem_keeps_background_size() {
        let composer = CanvasComposer::default();
        let bg = paper(400, 400);
        let canvas = composer
            .compose(&WrapResult::from_text("hello"), &font(), &bg)
            .unwrap();

        assert_eq!(canvas.dimensions(), (400, 400));
        // first glyph box starts at (padding - offset, padding)
        assert_eq!(canvas.get_pixel(75, 100), &Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(74, 100), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn long_poem_grows_the_canvas() {
        let composer = CanvasComposer::default();
        let bg = paper(400, 250);
        let lines = WrapResult::from_text("a\nb\nc\nd\ne");
        let canvas = composer.compose(&lines, &font(), &bg).unwrap();

        // 5 * 20 + 4 * 4 + 2 * 100
        assert_eq!(canvas.dimensions(), (400, 316));
        assert_eq!(bg.height(), 250);
    }

    #[test]
    fn background_is_never_mutated() {
        let composer = CanvasComposer::default();
        let bg = paper(400, 400);
        composer
            .compose(&WrapResult::from_text("ink"), &font(), &bg)
            .unwrap();
        assert!(bg.image.pixels().all(|p| p == &Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn blank_lines_keep_their_slot() {
        let composer = CanvasComposer::default();
        let bg = paper(400, 400);
        let canvas = composer
            .compose(&WrapResult::from_text("a\n\nb"), &font(), &bg)
            .unwrap();

        let third_line_y = 100 + 2 * 24;
        assert_eq!(canvas.get_pixel(75, 100 + 24), &Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(75, third_line_y), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn rejects_empty_background() {
        let composer = CanvasComposer::default();
        let bg = Background::new("empty", RgbaImage::new(0, 0));
        assert!(composer
            .compose(&WrapResult::from_text("x"), &font(), &bg)
            .is_err());
    }

    #[test]
    fn encodes_png() {
        let canvas = RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255]));
        let png = encode_png(&canvas).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded, canvas);
    }
}
