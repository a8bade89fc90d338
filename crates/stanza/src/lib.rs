//! Stanza - poems rendered onto paper
//!
//! Text goes in with a font id and a background id; a PNG comes out. Each
//! distinct request is rendered once and then served from a time-limited
//! cache, and renders run on a bounded worker pool.
//!
//! # Example
//!
//! ```ignore
//! use stanza::{StanzaConfig, Studio};
//!
//! let config = StanzaConfig::from_file("stanza.toml")?.with_env_overrides();
//! let studio = Studio::from_config(config)?;
//!
//! let (id, png) = studio.render("roses are red\nviolets are blue", Some("y2"), None)?;
//! std::fs::write(format!("{id}.png"), png.as_slice())?;
//! ```
//!
//! # Crates
//!
//! - [`engine`] - wrapping, composition, pipeline, cache and service
//! - [`fontdb`] - font files and measurements
//! - [`render_skia`] - glyph drawing

pub mod config;
pub mod studio;

pub use config::{BackgroundEntry, CacheSection, FontEntry, StanzaConfig};
pub use studio::{load_registry, resolve_request, Studio};

pub use stanza_core as engine;
pub use stanza_fontdb as fontdb;
pub use stanza_render_skia as render_skia;

pub use stanza_core::{
    error, traits, CacheStats, Fingerprint, ImageBytes, RenderRequest, RenderTicket, Result,
    StanzaError,
};

/// Common imports for typical usage
pub mod prelude {
    pub use crate::{StanzaConfig, Studio};
    pub use stanza_core::{
        error::{Result, StanzaError},
        Fingerprint, ImageBytes, RenderRequest,
    };
}
