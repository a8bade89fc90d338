//! Info command implementation
//!
//! Prints what the configuration declares without loading any assets.

use anyhow::Result;
use stanza::StanzaConfig;

use crate::cli::InfoArgs;

pub fn run(args: &InfoArgs, config: &StanzaConfig) -> Result<()> {
    if args.fonts || args.backgrounds {
        if args.fonts {
            config.font_ids().iter().for_each(|id| println!("{id}"));
        }
        if args.backgrounds {
            config.background_ids().iter().for_each(|id| println!("{id}"));
        }
        return Ok(());
    }

    println!("Stanza v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Fonts:");
    for (id, entry) in &config.fonts {
        let marker = if *id == config.default_font { "*" } else { " " };
        println!(
            "  {marker} {id:<8} {:>5.1}px  {}",
            entry.size,
            config.resolve(&entry.path).display()
        );
    }
    println!();

    println!("Backgrounds:");
    for (id, entry) in &config.backgrounds {
        let marker = if *id == config.default_background { "*" } else { " " };
        println!("  {marker} {id:<8} {}", config.resolve(&entry.path).display());
    }
    println!();

    let layout = config.layout()?;
    println!("Layout:");
    println!("  padding           {}px", layout.padding);
    println!("  offset            {}px", layout.offset);
    println!("  line spacing      {}px", layout.line_spacing);
    println!("  ink               {}", config.ink);
    println!();

    let cache = config.cache_config();
    println!("Cache:");
    println!("  enabled           {}", cache.enabled);
    println!("  ttl               {}s", cache.ttl.as_secs());
    println!("  max size          {} MiB", cache.max_bytes / (1024 * 1024));
    println!();

    println!("Workers:            {}", config.worker_count());
    match config.render_deadline() {
        Some(deadline) => println!("Render deadline:    {}ms", deadline.as_millis()),
        None => println!("Render deadline:    none"),
    }

    Ok(())
}
