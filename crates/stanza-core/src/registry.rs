//! Fonts and backgrounds, known by id
//!
//! Built once at startup and shared read-only by every render afterwards.

use std::collections::BTreeMap;

use crate::{
    error::{Result, StanzaError},
    Background, FontSpec,
};

/// The immutable catalogue of render assets
#[derive(Debug, Clone)]
pub struct Registry {
    fonts: BTreeMap<String, FontSpec>,
    backgrounds: BTreeMap<String, Background>,
    default_font: String,
    default_background: String,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn font(&self, id: &str) -> Result<&FontSpec> {
        self.fonts.get(id).ok_or_else(|| {
            StanzaError::UnknownFont(format!("{id:?} (available: {})", self.font_ids().join(", ")))
        })
    }

    pub fn background(&self, id: &str) -> Result<&Background> {
        self.backgrounds.get(id).ok_or_else(|| {
            StanzaError::UnknownBackground(format!(
                "{id:?} (available: {})",
                self.background_ids().join(", ")
            ))
        })
    }

    pub fn has_font(&self, id: &str) -> bool {
        self.fonts.contains_key(id)
    }

    pub fn has_background(&self, id: &str) -> bool {
        self.backgrounds.contains_key(id)
    }

    /// Font ids in sorted order
    pub fn font_ids(&self) -> Vec<&str> {
        self.fonts.keys().map(String::as_str).collect()
    }

    /// Background ids in sorted order
    pub fn background_ids(&self) -> Vec<&str> {
        self.backgrounds.keys().map(String::as_str).collect()
    }

    pub fn fonts(&self) -> impl Iterator<Item = &FontSpec> {
        self.fonts.values()
    }

    pub fn backgrounds(&self) -> impl Iterator<Item = &Background> {
        self.backgrounds.values()
    }

    pub fn default_font(&self) -> &str {
        &self.default_font
    }

    pub fn default_background(&self) -> &str {
        &self.default_background
    }
}

/// Collects assets, then checks the defaults actually exist
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    fonts: BTreeMap<String, FontSpec>,
    backgrounds: BTreeMap<String, Background>,
    default_font: Option<String>,
    default_background: Option<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font; a later font with the same id replaces the earlier one
    pub fn font(mut self, font: FontSpec) -> Self {
        if self.fonts.contains_key(&font.id) {
            log::warn!("Font '{}' registered twice, keeping the last one", font.id);
        }
        self.fonts.insert(font.id.clone(), font);
        self
    }

    pub fn background(mut self, background: Background) -> Self {
        if self.backgrounds.contains_key(&background.id) {
            log::warn!(
                "Background '{}' registered twice, keeping the last one",
                background.id
            );
        }
        self.backgrounds.insert(background.id.clone(), background);
        self
    }

    pub fn default_font(mut self, id: impl Into<String>) -> Self {
        self.default_font = Some(id.into());
        self
    }

    pub fn default_background(mut self, id: impl Into<String>) -> Self {
        self.default_background = Some(id.into());
        self
    }

    /// Finish the registry
    ///
    /// Without explicit defaults, the first id in sorted order is used.
    pub fn build(self) -> Result<Registry> {
        let default_font = pick_default("font", self.default_font, self.fonts.keys())?;
        let default_background =
            pick_default("background", self.default_background, self.backgrounds.keys())?;

        log::info!(
            "Registry ready: {} fonts (default '{}'), {} backgrounds (default '{}')",
            self.fonts.len(),
            default_font,
            self.backgrounds.len(),
            default_background
        );

        Ok(Registry {
            fonts: self.fonts,
            backgrounds: self.backgrounds,
            default_font,
            default_background,
        })
    }
}

fn pick_default<'a>(
    kind: &str,
    chosen: Option<String>,
    mut ids: impl Iterator<Item = &'a String> + Clone,
) -> Result<String> {
    match chosen {
        Some(id) if ids.clone().any(|known| *known == id) => Ok(id),
        Some(id) => Err(StanzaError::Config(format!(
            "default {kind} '{id}' is not registered"
        ))),
        None => ids
            .next()
            .cloned()
            .ok_or_else(|| StanzaError::Config(format!("no {kind}s registered"))),
    }
}
