//! Error types for Stanza

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StanzaError>;

/// Main error type for Stanza
#[derive(Debug, Error)]
pub enum StanzaError {
    #[error("Text is empty after normalization")]
    EmptyInput,

    #[error("Unknown font: {0}")]
    UnknownFont(String),

    #[error("Unknown background: {0}")]
    UnknownBackground(String),

    #[error("Render failed: {0}")]
    RenderFailed(#[from] RenderError),

    #[error("Font loading failed: {0}")]
    FontLoad(#[from] FontLoadError),

    #[error("Gave up waiting for render after {0:?}")]
    TimedOut(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of a single render attempt
///
/// Cloneable so one failed attempt can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Text measurement failed: {0}")]
    Metrics(String),

    #[error("Layout failed: {0}")]
    Layout(String),

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Render exceeded its {limit_ms}ms deadline during {stage}")]
    DeadlineExceeded { stage: String, limit_ms: u64 },

    #[error("Render panicked: {0}")]
    Panicked(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Font loading errors
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("Font file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid font data")]
    InvalidData,

    #[error("Font has no outlines: {0}")]
    NoOutlines(String),
}

impl From<StanzaError> for RenderError {
    fn from(err: StanzaError) -> Self {
        match err {
            StanzaError::RenderFailed(inner) => inner,
            other => RenderError::Backend(other.to_string()),
        }
    }
}

impl StanzaError {
    /// True for errors caused by the request itself rather than by rendering
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StanzaError::EmptyInput | StanzaError::UnknownFont(_) | StanzaError::UnknownBackground(_)
        )
    }
}
