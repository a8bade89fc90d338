//! A font pinned at one pixel size

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use skrifa::instance::{LocationRef, Size};
use skrifa::{GlyphId, MetadataProvider};
use stanza_core::{
    error::{RenderError, Result},
    traits::GlyphMetrics,
    TextExtent,
};

use crate::Font;

/// Measures text in one font at one size
///
/// Advance widths are looked up once per character and remembered; the rest
/// of the vertical metrics are fixed when the face is created.
pub struct FontFace {
    font: Arc<Font>,
    size: f32,
    ascent: f32,
    descent: f32,
    leading: f32,
    advances: RwLock<HashMap<char, f32>>,
}

impl FontFace {
    pub fn new(font: Arc<Font>, size: f32) -> Result<Self> {
        if !(size > 0.0 && size.is_finite()) {
            return Err(RenderError::Metrics(format!("font size must be positive, got {size}")).into());
        }

        let metrics = font
            .font_ref()?
            .metrics(Size::new(size), LocationRef::default());

        log::debug!(
            "Face {} @ {}px: ascent={}, descent={}, leading={}",
            font.source(),
            size,
            metrics.ascent,
            metrics.descent,
            metrics.leading
        );

        Ok(Self {
            font,
            size,
            ascent: metrics.ascent,
            // skrifa reports descent as a negative offset below the baseline
            descent: -metrics.descent,
            leading: metrics.leading,
            advances: RwLock::new(HashMap::new()),
        })
    }

    pub fn font(&self) -> &Arc<Font> {
        &self.font
    }

    /// Pixel size this face measures at
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Distance from the top of a line to its baseline
    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    /// Distance from the baseline to the bottom of a line
    pub fn descent(&self) -> f32 {
        self.descent
    }

    pub fn leading(&self) -> f32 {
        self.leading
    }

    /// Horizontal advance of one character, in pixels
    ///
    /// Characters the font cannot map take the advance of `.notdef`.
    pub fn advance(&self, ch: char) -> Result<f32> {
        if let Some(advance) = self.advances.read().get(&ch) {
            return Ok(*advance);
        }

        let font = self.font.font_ref()?;
        let gid = font.charmap().map(ch).unwrap_or(GlyphId::NOTDEF);
        let advance = font
            .glyph_metrics(Size::new(self.size), LocationRef::default())
            .advance_width(gid)
            .ok_or_else(|| RenderError::Metrics(format!("no advance for {ch:?} ({gid:?})")))?;

        self.advances.write().insert(ch, advance);
        Ok(advance)
    }

    /// How many characters have had their advance looked up so far
    pub fn cached_advances(&self) -> usize {
        self.advances.read().len()
    }
}

impl GlyphMetrics for FontFace {
    fn measure(&self, line: &str) -> Result<TextExtent> {
        let mut width = 0.0;
        for ch in line.chars() {
            width += self.advance(ch)?;
        }
        Ok(TextExtent::new(width, self.line_height()))
    }

    fn line_height(&self) -> f32 {
        self.ascent + self.descent
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("font", &self.font.source())
            .field("size", &self.size)
            .field("ascent", &self.ascent)
            .field("descent", &self.descent)
            .finish()
    }
}
