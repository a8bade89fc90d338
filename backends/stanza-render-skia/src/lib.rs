//! Skia painter: glyph outlines rasterized with tiny-skia
//!
//! Each line is traced into a single path with skrifa, filled once into a
//! coverage mask the size of the line's bounds, and then blended onto the
//! background in the ink color. The background keeps its own alpha, so
//! semi-transparent paper stays semi-transparent under the text.

use image::RgbaImage;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::DrawSettings;
use skrifa::{GlyphId, MetadataProvider};
use stanza_core::{
    error::{RenderError, Result},
    traits::{GlyphMetrics, GlyphPainter},
    Color, TextExtent,
};
use stanza_fontdb::FontFace;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

/// A font face that can both measure and draw
///
/// Measuring goes straight to the wrapped [`FontFace`], so the wrapper and
/// the painter always agree on how wide a line is.
#[derive(Debug)]
pub struct SkiaFace {
    face: FontFace,
}

impl SkiaFace {
    pub fn new(face: FontFace) -> Self {
        Self { face }
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }

    /// Trace `line` into one path with its baseline at `baseline`
    ///
    /// Returns `None` for lines with no visible outlines (spaces only).
    fn trace_line(&self, line: &str, x: f32, baseline: f32) -> Result<Option<tiny_skia::Path>> {
        let font = self.face.font().font_ref()?;
        let outlines = font.outline_glyphs();
        let charmap = font.charmap();
        let size = Size::new(self.face.size());

        let mut builder = PathBuilder::new();
        let mut pen_x = x;

        for ch in line.chars() {
            let gid = charmap.map(ch).unwrap_or(GlyphId::NOTDEF);
            if let Some(glyph) = outlines.get(gid) {
                let mut pen = PathPen {
                    builder: &mut builder,
                    x: pen_x,
                    baseline,
                };
                let settings = DrawSettings::unhinted(size, LocationRef::default());
                glyph
                    .draw(settings, &mut pen)
                    .map_err(|e| RenderError::Draw(format!("outline of {ch:?} failed: {e}")))?;
            }
            pen_x += self.face.advance(ch)?;
        }

        Ok(builder.finish())
    }
}

impl GlyphMetrics for SkiaFace {
    fn measure(&self, line: &str) -> Result<TextExtent> {
        self.face.measure(line)
    }

    fn line_height(&self) -> f32 {
        self.face.line_height()
    }
}

impl GlyphPainter for SkiaFace {
    fn name(&self) -> &'static str {
        "skia"
    }

    fn draw_line(
        &self,
        canvas: &mut RgbaImage,
        line: &str,
        origin: (f32, f32),
        ink: Color,
    ) -> Result<()> {
        let baseline = origin.1 + self.face.ascent();
        let Some(path) = self.trace_line(line, origin.0, baseline)? else {
            return Ok(());
        };

        // Only rasterize the part of the line that lands on the canvas
        let bounds = path.bounds();
        let x0 = bounds.left().floor().max(0.0) as u32;
        let y0 = bounds.top().floor().max(0.0) as u32;
        let x1 = (bounds.right().ceil().max(0.0) as u32).min(canvas.width());
        let y1 = (bounds.bottom().ceil().max(0.0) as u32).min(canvas.height());
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        let (width, height) = (x1 - x0, y1 - y0);
        let mut mask = Pixmap::new(width, height)
            .ok_or(RenderError::InvalidDimensions { width, height })?;

        let paint = Paint {
            anti_alias: true,
            ..Default::default()
        };
        let transform = Transform::from_translate(-(x0 as f32), -(y0 as f32));
        mask.fill_path(&path, &paint, FillRule::Winding, transform, None);

        log::trace!(
            "Skia: {:?} covers {}x{} at ({}, {})",
            line,
            width,
            height,
            x0,
            y0
        );

        let coverage = mask.data();
        for my in 0..height {
            for mx in 0..width {
                let alpha = coverage[((my * width + mx) * 4 + 3) as usize];
                if alpha == 0 {
                    continue;
                }
                let pixel = canvas.get_pixel_mut(x0 + mx, y0 + my);
                pixel.0 = blend(pixel.0, ink, alpha);
            }
        }

        Ok(())
    }
}

/// Source-over of `ink` at `coverage` onto a straight-alpha pixel
fn blend(dst: [u8; 4], ink: Color, coverage: u8) -> [u8; 4] {
    let src_a = coverage as u32 * ink.a as u32 / 255;
    if src_a == 0 {
        return dst;
    }

    let dst_a = dst[3] as u32;
    let inv_a = 255 - src_a;
    // destination contribution, already weighted by its own alpha
    let dst_w = dst_a * inv_a / 255;
    let out_a = src_a + dst_w;

    let channel = |src: u8, dst: u8| -> u8 {
        ((src as u32 * src_a + dst as u32 * dst_w + out_a / 2) / out_a).min(255) as u8
    };

    [
        channel(ink.r, dst[0]),
        channel(ink.g, dst[1]),
        channel(ink.b, dst[2]),
        out_a.min(255) as u8,
    ]
}

/// Bridge between skrifa's outline commands and tiny-skia's path builder
///
/// Font units come in y-up and already scaled to pixels; the pen moves them
/// to the glyph's pen position and flips them onto the y-down canvas.
struct PathPen<'a> {
    builder: &'a mut PathBuilder,
    x: f32,
    baseline: f32,
}

impl PathPen<'_> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x, self.baseline - y)
    }
}

impl skrifa::outline::OutlinePen for PathPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        let (cx0, cy0) = self.map(cx0, cy0);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(cx0, cy0, x, y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        let (cx0, cy0) = self.map(cx0, cy0);
        let (cx1, cy1) = self.map(cx1, cy1);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(cx0, cy0, cx1, cy1, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
