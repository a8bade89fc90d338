//! Subcommand implementations

pub mod batch;
pub mod info;
pub mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stanza::StanzaConfig;

/// Looked for in the working directory when `--config` is not given
pub const DEFAULT_CONFIG: &str = "stanza.toml";

/// Read the configuration the user pointed at, or the one lying around, or the defaults
pub fn load_config(path: Option<&Path>) -> Result<StanzaConfig> {
    let config = match path {
        Some(path) => StanzaConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).exists() => StanzaConfig::from_file(DEFAULT_CONFIG)
            .with_context(|| format!("Failed to load ./{DEFAULT_CONFIG}"))?,
        None => {
            log::debug!("No config file, using built-in defaults");
            StanzaConfig::default()
        },
    };
    Ok(config.with_env_overrides())
}

/// `<dir>/<fingerprint>.png`
pub fn image_path(dir: &Path, fingerprint: &stanza::Fingerprint) -> PathBuf {
    dir.join(format!("{fingerprint}.png"))
}
