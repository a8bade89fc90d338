//! Settings file for a Stanza deployment
//!
//! Everything has a default, so an empty file (or no file at all) gives the
//! classic setup: six fonts, three papers, 100px margins, black ink.
//!
//! ```toml
//! padding = 80
//! ink = "#1b1b1b"
//! asset_root = "/srv/poems/assets"
//!
//! [cache]
//! ttl_secs = 3600
//!
//! [fonts.m1]
//! path = "fonts/m1.ttf"
//! size = 34
//! ```
//!
//! A `[fonts]` or `[backgrounds]` table in the file replaces the built-in one
//! rather than adding to it. Relative asset paths resolve against
//! `asset_root`, which itself resolves against the config file's directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stanza_core::{error::Result, CacheConfig, Color, LayoutParams, StanzaError};

/// One font id: which file, at which pixel size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontEntry {
    pub path: PathBuf,
    pub size: f32,
}

/// One background id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackgroundEntry {
    pub path: PathBuf,
}

/// The `[cache]` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_bytes: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        let defaults = CacheConfig::default();
        Self {
            enabled: defaults.enabled,
            ttl_secs: defaults.ttl.as_secs(),
            max_bytes: defaults.max_bytes,
        }
    }
}

impl From<CacheSection> for CacheConfig {
    fn from(section: CacheSection) -> Self {
        CacheConfig {
            enabled: section.enabled,
            ttl: Duration::from_secs(section.ttl_secs),
            max_bytes: section.max_bytes,
        }
    }
}

/// Parsed once at startup, never mutated afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StanzaConfig {
    /// Margin around the text block, in pixels
    pub padding: u32,
    /// Left shift of the text block; defaults to a quarter of `padding`
    pub offset: Option<u32>,
    /// Extra pixels between lines
    pub line_spacing: f32,
    /// Text color as `#rrggbb` or `#rrggbbaa`
    pub ink: String,
    pub default_font: String,
    pub default_background: String,
    /// Directory relative asset paths are resolved against
    pub asset_root: PathBuf,
    /// Render threads; one per core when unset
    pub workers: Option<usize>,
    /// Fail renders that take longer than this
    pub render_deadline_ms: Option<u64>,
    pub cache: CacheSection,
    pub fonts: BTreeMap<String, FontEntry>,
    pub backgrounds: BTreeMap<String, BackgroundEntry>,
}

impl Default for StanzaConfig {
    fn default() -> Self {
        Self {
            padding: 100,
            offset: None,
            line_spacing: 4.0,
            ink: "#000000".into(),
            default_font: "m1".into(),
            default_background: "default".into(),
            asset_root: PathBuf::from("assets"),
            workers: None,
            render_deadline_ms: None,
            cache: CacheSection::default(),
            fonts: builtin_fonts(),
            backgrounds: builtin_backgrounds(),
        }
    }
}

fn builtin_fonts() -> BTreeMap<String, FontEntry> {
    [
        ("m1", 34.0),
        ("s1", 34.0),
        ("n1", 28.0),
        ("y1", 32.0),
        ("y2", 40.0),
        ("y3", 18.0),
    ]
    .into_iter()
    .map(|(id, size)| {
        (
            id.to_string(),
            FontEntry {
                path: PathBuf::from(format!("fonts/{id}.ttf")),
                size,
            },
        )
    })
    .collect()
}

fn builtin_backgrounds() -> BTreeMap<String, BackgroundEntry> {
    [
        ("default", "poem_default.jpg"),
        ("y1", "poem_y1.jpg"),
        ("y2", "poem_y2.jpg"),
    ]
    .into_iter()
    .map(|(id, file)| {
        (
            id.to_string(),
            BackgroundEntry {
                path: PathBuf::from("backgrounds").join(file),
            },
        )
    })
    .collect()
}

impl StanzaConfig {
    /// Read and check a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            StanzaError::Config(format!("cannot read {}: {e}", path.display()))
        })?;

        let mut config = Self::from_toml_str(&text)?;
        if config.asset_root.is_relative() {
            if let Some(dir) = path.parent() {
                config.asset_root = dir.join(&config.asset_root);
            }
        }

        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and check TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| StanzaError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `STANZA_*` environment variables on top of the file
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let cache = CacheConfig::from(self.cache).with_overrides_from(&lookup);
        self.cache = CacheSection {
            enabled: cache.enabled,
            ttl_secs: cache.ttl.as_secs(),
            max_bytes: cache.max_bytes,
        };

        if let Some(val) = lookup("STANZA_WORKERS") {
            match val.trim().parse::<usize>() {
                Ok(n) if n > 0 => {
                    self.workers = Some(n);
                    log::info!("Using {n} render workers via STANZA_WORKERS");
                },
                _ => log::warn!("Ignoring STANZA_WORKERS={val:?}: expected a positive number"),
            }
        }

        if let Some(val) = lookup("STANZA_PADDING") {
            match val.trim().parse::<u32>() {
                Ok(px) if px > 0 => {
                    self.padding = px;
                    log::info!("Padding set to {px}px via STANZA_PADDING");
                },
                _ => log::warn!("Ignoring STANZA_PADDING={val:?}: expected pixels"),
            }
        }

        self
    }

    /// Catch mistakes that would otherwise only show up at render time
    pub fn validate(&self) -> Result<()> {
        if self.padding == 0 {
            return Err(StanzaError::Config("padding must be positive".into()));
        }
        if self.offset.is_some_and(|offset| offset > self.padding) {
            return Err(StanzaError::Config("offset cannot exceed padding".into()));
        }
        if !(self.line_spacing >= 0.0 && self.line_spacing.is_finite()) {
            return Err(StanzaError::Config("line_spacing must be zero or more".into()));
        }
        self.ink_color()?;

        if self.fonts.is_empty() {
            return Err(StanzaError::Config("at least one font is required".into()));
        }
        if self.backgrounds.is_empty() {
            return Err(StanzaError::Config("at least one background is required".into()));
        }
        if !self.fonts.contains_key(&self.default_font) {
            return Err(StanzaError::Config(format!(
                "default_font '{}' is not in [fonts]",
                self.default_font
            )));
        }
        if !self.backgrounds.contains_key(&self.default_background) {
            return Err(StanzaError::Config(format!(
                "default_background '{}' is not in [backgrounds]",
                self.default_background
            )));
        }
        for (id, font) in &self.fonts {
            if !(font.size > 0.0 && font.size.is_finite()) {
                return Err(StanzaError::Config(format!("font '{id}' needs a positive size")));
            }
        }
        if self.workers == Some(0) {
            return Err(StanzaError::Config("workers must be positive".into()));
        }
        if self.render_deadline_ms == Some(0) {
            return Err(StanzaError::Config("render_deadline_ms must be positive".into()));
        }

        Ok(())
    }

    /// Font ids in sorted order
    pub fn font_ids(&self) -> Vec<&str> {
        self.fonts.keys().map(String::as_str).collect()
    }

    /// Background ids in sorted order
    pub fn background_ids(&self) -> Vec<&str> {
        self.backgrounds.keys().map(String::as_str).collect()
    }

    pub fn ink_color(&self) -> Result<Color> {
        Color::from_hex(&self.ink)
            .ok_or_else(|| StanzaError::Config(format!("ink {:?} is not a hex color", self.ink)))
    }

    pub fn layout(&self) -> Result<LayoutParams> {
        Ok(LayoutParams {
            padding: self.padding,
            offset: self.offset.unwrap_or(self.padding / 4),
            line_spacing: self.line_spacing,
            ink: self.ink_color()?,
        })
    }

    pub fn cache_config(&self) -> CacheConfig {
        self.cache.into()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    pub fn render_deadline(&self) -> Option<Duration> {
        self.render_deadline_ms.map(Duration::from_millis)
    }

    /// Where an asset path points on disk
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.asset_root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_reproduce_the_classic_setup() {
        let config = StanzaConfig::default();
        config.validate().unwrap();

        assert_eq!(config.font_ids(), ["m1", "n1", "s1", "y1", "y2", "y3"]);
        assert_eq!(config.fonts["y2"].size, 40.0);
        assert_eq!(config.fonts["y3"].size, 18.0);
        assert_eq!(
            config.backgrounds["default"].path,
            PathBuf::from("backgrounds/poem_default.jpg")
        );

        let layout = config.layout().unwrap();
        assert_eq!(layout.padding, 100);
        assert_eq!(layout.offset, 25);
        assert_eq!(layout.ink, Color::black());
        assert_eq!(config.cache_config(), CacheConfig::default());
    }

    #[test]
    fn empty_text_is_a_valid_config() {
        assert_eq!(StanzaConfig::from_toml_str("").unwrap(), StanzaConfig::default());
    }

    #[test]
    fn offset_follows_padding() {
        let config = StanzaConfig::from_toml_str("padding = 40").unwrap();
        assert_eq!(config.layout().unwrap().offset, 10);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(StanzaConfig::from_toml_str("colour = \"red\"").is_err());
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STANZA_CACHE", "off"),
            ("STANZA_CACHE_TTL", "60"),
            ("STANZA_WORKERS", "3"),
            ("STANZA_PADDING", "nope"),
        ]
        .into_iter()
        .collect();

        let config = StanzaConfig::default()
            .with_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.padding, 100);
    }

    #[test]
    fn resolves_relative_assets() {
        let config = StanzaConfig {
            asset_root: PathBuf::from("/srv/poems"),
            ..Default::default()
        };
        assert_eq!(
            config.resolve(Path::new("fonts/m1.ttf")),
            PathBuf::from("/srv/poems/fonts/m1.ttf")
        );
        assert_eq!(
            config.resolve(Path::new("/opt/x.ttf")),
            PathBuf::from("/opt/x.ttf")
        );
    }
}
