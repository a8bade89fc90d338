//! The contracts between the pipeline and its collaborators
//!
//! - [`GlyphMetrics`] - Reports how much room text takes up
//! - [`GlyphPainter`] - Puts text onto a canvas
//! - [`Renderer`] - Turns a whole request into encoded bytes
//! - [`Stage`] - One step of the render pipeline

use crate::{error::Result, Color, RenderContext, RenderRequest, TextExtent};
use image::RgbaImage;

/// Your window into a font's measurements at one fixed size
///
/// Implementations are immutable for the life of the process and may be
/// shared across every worker thread.
///
/// ```ignore
/// struct Monospace;
///
/// impl GlyphMetrics for Monospace {
///     fn measure(&self, line: &str) -> Result<TextExtent> {
///         Ok(TextExtent::new(line.chars().count() as f32 * 10.0, 20.0))
///     }
///
///     fn line_height(&self) -> f32 {
///         20.0
///     }
/// }
/// ```
pub trait GlyphMetrics: Send + Sync {
    /// Size of a single line of text (no newlines) in pixels
    fn measure(&self, line: &str) -> Result<TextExtent>;

    /// Vertical advance of one line, excluding extra spacing
    fn line_height(&self) -> f32;

    /// Width of possibly multi-line text: the widest of its lines
    fn text_width(&self, text: &str) -> Result<f32> {
        let mut widest: f32 = 0.0;
        for line in text.split('\n') {
            widest = widest.max(self.measure(line)?.width);
        }
        Ok(widest)
    }

    /// Size of a block of lines stacked with `spacing` pixels between them
    fn block_extent(&self, lines: &[String], spacing: f32) -> Result<TextExtent> {
        if lines.is_empty() {
            return Ok(TextExtent::default());
        }

        let mut width: f32 = 0.0;
        for line in lines {
            width = width.max(self.measure(line)?.width);
        }
        let count = lines.len() as f32;
        let height = count * self.line_height() + (count - 1.0) * spacing;

        Ok(TextExtent::new(width, height))
    }
}

/// Where measured text becomes ink
pub trait GlyphPainter: GlyphMetrics {
    /// Identify the drawing backend in logs
    fn name(&self) -> &'static str;

    /// Draw one line with its top-left corner at `origin`
    ///
    /// Pixels outside the canvas are clipped silently.
    fn draw_line(
        &self,
        canvas: &mut RgbaImage,
        line: &str,
        origin: (f32, f32),
        ink: Color,
    ) -> Result<()>;
}

/// A request goes in, encoded image bytes come out
///
/// This is the unit of work the content cache runs at most once per
/// fingerprint.
pub trait Renderer: Send + Sync {
    /// Who are you?
    fn name(&self) -> &'static str;

    /// Reject requests that can never render, before any work starts
    ///
    /// Receives an already-normalized request.
    fn validate(&self, _request: &RenderRequest) -> Result<()> {
        Ok(())
    }

    /// Produce the encoded image for a request
    ///
    /// The cache hands over normalized requests, but direct callers may not.
    fn render(&self, request: &RenderRequest) -> Result<Vec<u8>>;
}

/// One step of the render pipeline
///
/// ```ignore
/// struct MyStage;
///
/// impl Stage for MyStage {
///     fn name(&self) -> &'static str {
///         "my-stage"
///     }
///
///     fn process(&self, context: RenderContext) -> Result<RenderContext> {
///         Ok(context)
///     }
/// }
/// ```
pub trait Stage: Send + Sync {
    /// Used for debugging and deadline errors
    fn name(&self) -> &'static str;

    /// Take the context, do your part, hand it on
    fn process(&self, context: RenderContext) -> Result<RenderContext>;
}
