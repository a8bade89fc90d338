//! Where fonts come to life: loading and measuring for Stanza
//!
//! A [`Font`] holds the raw bytes of one face; a [`FontFace`] is that font
//! pinned at one pixel size, and is what the line wrapper measures with.
//!
//! ## Memory Management
//!
//! Fonts store their raw data and create `FontRef` on demand for parsing, so
//! a face never borrows from a buffer that might move. TTC collections are
//! supported through `face_index`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use read_fonts::{FontRef, TableProvider};
use stanza_core::error::{FontLoadError, Result};

mod face;

pub use face::FontFace;

/// A font that's been brought into memory, ready to measure and draw text
pub struct Font {
    data: Vec<u8>,
    face_index: u32,
    units_per_em: u16,
    source: String,
}

impl Font {
    /// Opens a font file from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_index(path, 0)
    }

    /// Opens a specific face from a font file (for TTC collections)
    pub fn from_file_index(path: impl AsRef<Path>, face_index: u32) -> Result<Self> {
        let path = path.as_ref();
        let data =
            fs::read(path).map_err(|_| FontLoadError::FileNotFound(path.display().to_string()))?;

        let mut font = Self::from_data_index(data, face_index)?;
        font.source = path.display().to_string();
        Ok(font)
    }

    /// Turns raw font bytes into something we can work with
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_index(data, 0)
    }

    /// Turns raw font bytes into a specific face (for TTC collections)
    pub fn from_data_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let font_ref =
            FontRef::from_index(&data, face_index).map_err(|_| FontLoadError::InvalidData)?;

        // Without outlines there is nothing to draw
        let has_outlines =
            font_ref.glyf().is_ok() || font_ref.cff().is_ok() || font_ref.cff2().is_ok();
        if !has_outlines {
            return Err(FontLoadError::NoOutlines("<memory>".into()).into());
        }
        if font_ref.cmap().is_err() {
            return Err(FontLoadError::InvalidData.into());
        }

        let units_per_em = font_ref
            .head()
            .map(|head| head.units_per_em())
            .unwrap_or(1000);

        Ok(Font {
            data,
            face_index,
            units_per_em,
            source: "<memory>".into(),
        })
    }

    /// Returns the face index for TTC collections (0 for single fonts)
    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Where the bytes came from, for log messages
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Creates a FontRef on demand for parsing operations
    pub fn font_ref(&self) -> Result<FontRef<'_>> {
        FontRef::from_index(&self.data, self.face_index)
            .map_err(|_| FontLoadError::InvalidData.into())
    }

    /// Finds which glyph draws this character
    pub fn glyph_id(&self, ch: char) -> Option<u32> {
        self.font_ref()
            .ok()
            .and_then(|font| font.cmap().ok()?.map_codepoint(ch).map(|gid| gid.to_u32()))
    }

    /// Counts how many different glyphs this font contains
    pub fn glyph_count(&self) -> Option<u32> {
        self.font_ref()
            .ok()
            .and_then(|font| font.maxp().ok().map(|maxp| maxp.num_glyphs() as u32))
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("source", &self.source)
            .field("face_index", &self.face_index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

/// Your font library: every file is read and parsed at most once
///
/// Several ids may point at the same file at different sizes; they share one
/// [`Font`].
#[derive(Default)]
pub struct FontDatabase {
    /// Maps canonical paths to their loaded fonts
    path_cache: HashMap<PathBuf, Arc<Font>>,
}

impl FontDatabase {
    /// Starts with an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a font file, or returns the copy loaded earlier
    pub fn load_font(&mut self, path: impl AsRef<Path>) -> Result<Arc<Font>> {
        let path = path.as_ref();

        // Canonicalize for reliable deduplication
        let cache_key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Some(font) = self.path_cache.get(&cache_key) {
            log::debug!("Reusing font {}", path.display());
            return Ok(font.clone());
        }

        let font = Arc::new(Font::from_file(path)?);
        log::info!(
            "Loaded font {} ({} glyphs)",
            path.display(),
            font.glyph_count().unwrap_or(0)
        );
        self.path_cache.insert(cache_key, font.clone());

        Ok(font)
    }

    /// Loads a font file and pins it at `size` pixels
    pub fn load_face(&mut self, path: impl AsRef<Path>, size: f32) -> Result<FontFace> {
        let font = self.load_font(path)?;
        FontFace::new(font, size)
    }

    /// Returns the number of distinct font files loaded
    pub fn font_count(&self) -> usize {
        self.path_cache.len()
    }

    /// Forgets every loaded font; faces already handed out keep theirs alive
    pub fn clear(&mut self) {
        self.path_cache.clear();
    }
}
