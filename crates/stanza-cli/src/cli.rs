//! Command-line argument definitions using Clap v4

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stanza - render poems onto paper
#[derive(Parser, Debug)]
#[command(name = "stanza")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./stanza.toml when present)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render one poem to a PNG file
    #[command(alias = "r")]
    Render(RenderArgs),

    /// Render many poems from a JSONL file
    Batch(BatchArgs),

    /// Show configured fonts, backgrounds and cache settings
    #[command(alias = "i")]
    Info(InfoArgs),
}

/// Arguments for the render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Poem text (reads stdin if omitted)
    #[arg(conflicts_with = "text_file")]
    pub text: Option<String>,

    /// Read the poem from a file
    #[arg(short = 'T', long = "text-file")]
    pub text_file: Option<PathBuf>,

    /// Font id (the configured default when omitted)
    #[arg(short = 'f', long = "font")]
    pub font: Option<String>,

    /// Background id (unknown ids fall back to the default)
    #[arg(short = 'b', long = "background")]
    pub background: Option<String>,

    /// Output file (`<fingerprint>.png` in the current directory if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

/// Arguments for the batch command
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Input JSONL file, one job per line (stdin if omitted)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Directory rendered images are written to
    #[arg(short = 'O', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

/// Arguments for the info command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Only list font ids
    #[arg(long)]
    pub fonts: bool,

    /// Only list background ids
    #[arg(long)]
    pub backgrounds: bool,
}
