//! Stanza Core: from a block of text to a poem on paper
//!
//! A request carries three strings: the text, a font id and a background id.
//! This crate turns that request into PNG bytes and makes sure the expensive
//! part happens at most once per distinct request.
//!
//! ## The Pipeline
//!
//! 1. **Resolve** - Font and background ids become loaded assets
//! 2. **Wrap** - Text is broken into lines that fit the paper's width
//! 3. **Compose** - Lines are drawn onto a private copy of the background,
//!    grown taller when the poem does not fit
//! 4. **Encode** - The canvas becomes a PNG
//!
//! ## Caching
//!
//! [`ContentCache`] sits in front of the pipeline. Requests are reduced to a
//! 128-bit [`Fingerprint`]; concurrent requests with the same fingerprint share
//! one render, and finished renders live for a configurable TTL.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stanza_core::{
//!     CacheConfig, ContentCache, LayoutParams, Registry, RenderPipeline, RenderRequest,
//!     RenderService,
//! };
//!
//! # fn registry() -> Registry { unimplemented!() }
//! let pipeline = RenderPipeline::new(Arc::new(registry()), LayoutParams::default());
//! let service = RenderService::new(
//!     Arc::new(pipeline),
//!     ContentCache::new(CacheConfig::default()),
//!     4,
//! )?;
//!
//! let png = service.render(RenderRequest::new("roses are red", "m1", "default"))?;
//! # Ok::<(), stanza_core::StanzaError>(())
//! ```
//!
//! ## The Traits
//!
//! - [`GlyphMetrics`] - How wide and tall text is in a given font
//! - [`GlyphPainter`] - How that text lands on a canvas
//! - [`Renderer`] - A whole request in, encoded bytes out
//! - [`Stage`] - One step of the [`RenderPipeline`]

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

pub mod cache;
pub mod cache_config;
pub mod compose;
pub mod context;
pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod registry;
pub mod request;
pub mod service;
pub mod traits;
pub mod wrap;

pub use cache::{CacheStats, ContentCache, ImageBytes};
pub use cache_config::CacheConfig;
pub use compose::{encode_png, CanvasComposer};
pub use context::RenderContext;
pub use error::{FontLoadError, RenderError, Result, StanzaError};
pub use fingerprint::Fingerprint;
pub use pipeline::{RenderPipeline, RenderPipelineBuilder};
pub use registry::{Registry, RegistryBuilder};
pub use request::RenderRequest;
pub use service::{RenderService, RenderTicket};
pub use traits::{GlyphMetrics, GlyphPainter, Renderer, Stage};
pub use wrap::{wrap, WrapResult};

pub use image;

/// Pixel size of a run of text
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

impl TextExtent {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Simple RGBA color that works everywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::rgba(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::rgba(255, 255, 255, 255)
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();

        match digits.len() {
            6 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }
}

/// Where text sits on the paper and how it looks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    /// Distance between the text block and the paper's edges
    pub padding: u32,
    /// Nudge that shifts the text left and widens the wrap budget by the same amount
    pub offset: u32,
    /// Extra pixels between consecutive lines
    pub line_spacing: f32,
    /// Text color
    pub ink: Color,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            padding: 100,
            offset: 25,
            line_spacing: 4.0,
            ink: Color::black(),
        }
    }
}

/// A font the registry knows by id
#[derive(Clone)]
pub struct FontSpec {
    pub id: String,
    /// Pixel size the face was loaded at
    pub size: f32,
    pub face: Arc<dyn GlyphPainter>,
}

impl FontSpec {
    pub fn new(id: impl Into<String>, size: f32, face: Arc<dyn GlyphPainter>) -> Self {
        Self {
            id: id.into(),
            size,
            face,
        }
    }
}

impl fmt::Debug for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontSpec")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("painter", &self.face.name())
            .finish()
    }
}

/// A background template; composition always works on a copy
#[derive(Clone)]
pub struct Background {
    pub id: String,
    pub image: Arc<RgbaImage>,
}

impl Background {
    pub fn new(id: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            id: id.into(),
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl fmt::Debug for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Background")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Color::from_hex("#000000"), Some(Color::black()));
        assert_eq!(Color::from_hex("ffffff"), Some(Color::white()));
        assert_eq!(
            Color::from_hex("#10203040"),
            Some(Color::rgba(0x10, 0x20, 0x30, 0x40))
        );
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
        assert_eq!(Color::from_hex("#ééé"), None);
    }

    #[test]
    fn default_layout_matches_paper() {
        let layout = LayoutParams::default();
        assert_eq!(layout.padding, 100);
        assert_eq!(layout.offset, layout.padding / 4);
        assert_eq!(layout.ink, Color::black());
    }
}
