//! Render requests and their normalization

use crate::error::{Result, StanzaError};

/// Text plus the ids of the font and background to draw it with
///
/// Immutable once built; normalization produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderRequest {
    text: String,
    font: String,
    background: String,
}

impl RenderRequest {
    pub fn new(
        text: impl Into<String>,
        font: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            font: font.into(),
            background: background.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font(&self) -> &str {
        &self.font
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    /// Strip carriage returns and reject text with nothing printable left
    pub fn normalized(&self) -> Result<RenderRequest> {
        let text: String = self.text.chars().filter(|&c| c != '\r').collect();
        if text.trim().is_empty() {
            return Err(StanzaError::EmptyInput);
        }

        Ok(RenderRequest {
            text,
            font: self.font.clone(),
            background: self.background.clone(),
        })
    }

    /// Whether `normalized()` would return the request unchanged
    pub fn is_normalized(&self) -> bool {
        !self.text.contains('\r') && !self.text.trim().is_empty()
    }
}
