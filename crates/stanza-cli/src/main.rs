//! Stanza CLI - render poems onto paper

use anyhow::{Context, Result};
use clap::Parser;
use stanza::Studio;
use stanza_cli::cli::{Cli, Commands};
use stanza_cli::commands::{self, batch, info, render};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Info(args) => info::run(args, &config),
        Commands::Render(args) => {
            let studio = Studio::from_config(config).context("Failed to load assets")?;
            let path = render::run(args, &studio)?;
            println!("{}", path.display());
            Ok(())
        },
        Commands::Batch(args) => {
            let studio = Studio::from_config(config).context("Failed to load assets")?;
            let summary = batch::run(args, &studio)?;
            if summary.failed > 0 {
                anyhow::bail!("{} of {} jobs failed", summary.failed, summary.jobs);
            }
            Ok(())
        },
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
