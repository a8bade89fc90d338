//! Render command implementation

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stanza::Studio;

use super::image_path;
use crate::cli::RenderArgs;

pub fn run(args: &RenderArgs, studio: &Studio) -> Result<PathBuf> {
    let text = input_text(args)?;

    let (fingerprint, png) = studio
        .render(&text, args.font.as_deref(), args.background.as_deref())
        .context("Render failed")?;

    let output = match &args.output {
        Some(path) => path.clone(),
        None => image_path(Path::new("."), &fingerprint),
    };
    fs::write(&output, png.as_slice())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    log::info!(
        "Rendered {fingerprint} ({} bytes) to {}",
        png.len(),
        output.display()
    );
    Ok(output)
}

fn input_text(args: &RenderArgs) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.text_file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read stdin")?;
    Ok(text)
}
