//! The traveling container that carries one render through the pipeline stages

use image::RgbaImage;

use crate::{wrap::WrapResult, Background, FontSpec, RenderRequest};

/// Everything a stage needs, nothing it doesn't
///
/// Ids become assets, text becomes lines, lines become pixels, and pixels
/// become PNG bytes, all tracked here.
#[derive(Debug)]
pub struct RenderContext {
    // What we start with
    request: RenderRequest,

    // What emerges along the way
    font: Option<FontSpec>,
    background: Option<Background>,
    wrapped: Option<WrapResult>,
    canvas: Option<RgbaImage>,
    encoded: Option<Vec<u8>>,
}

impl RenderContext {
    /// Start fresh from an already-normalized request
    pub fn new(request: RenderRequest) -> Self {
        Self {
            request,
            font: None,
            background: None,
            wrapped: None,
            canvas: None,
            encoded: None,
        }
    }

    // Read what's inside

    pub fn request(&self) -> &RenderRequest {
        &self.request
    }

    pub fn font(&self) -> Option<&FontSpec> {
        self.font.as_ref()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn wrapped(&self) -> Option<&WrapResult> {
        self.wrapped.as_ref()
    }

    pub fn canvas(&self) -> Option<&RgbaImage> {
        self.canvas.as_ref()
    }

    pub fn encoded(&self) -> Option<&[u8]> {
        self.encoded.as_deref()
    }

    // Change what's inside

    pub fn set_font(&mut self, font: FontSpec) {
        self.font = Some(font);
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = Some(background);
    }

    pub fn set_wrapped(&mut self, wrapped: WrapResult) {
        self.wrapped = Some(wrapped);
    }

    pub fn set_canvas(&mut self, canvas: RgbaImage) {
        self.canvas = Some(canvas);
    }

    pub fn set_encoded(&mut self, encoded: Vec<u8>) {
        self.encoded = Some(encoded);
    }

    /// Hand the canvas to whoever encodes it
    pub fn take_canvas(&mut self) -> Option<RgbaImage> {
        self.canvas.take()
    }

    /// Pull out the finished bytes
    pub fn into_encoded(self) -> Option<Vec<u8>> {
        self.encoded
    }
}
