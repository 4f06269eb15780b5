use crate::discover::discover;
use crate::output::Written;
use crate::output::fallback_dir;
use crate::output::write_payload;
use crate::render::Palette;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use defscope_core::Catalog;
use defscope_core::DefscopeConfig;
use defscope_core::Payload;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
pub struct BuildArgs {
    /// Data root whose sub-directories are sources (defaults to current directory)
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Output file (defaults to the configured file name inside ROOT)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Never fall back to the documents directory when ROOT is not writable
    #[arg(long)]
    pub no_fallback: bool,
}

pub fn run_build(args: BuildArgs, config: &DefscopeConfig, palette: Palette) -> Result<()> {
    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("Data root {} does not exist", root.display()))?;

    info!("scanning {}", root.display());
    let discovery = discover(&root)?;
    let mut catalog = Catalog::build(discovery.inputs, config);
    catalog.record_failures(discovery.unreadable);

    let payload = Payload::from_catalog(&catalog, &root);
    let primary = args
        .output
        .unwrap_or_else(|| root.join(&config.output_file_name));
    let fallback = if args.no_fallback {
        None
    } else {
        fallback_dir()
    };

    match write_payload(&payload, &primary, fallback.as_deref())? {
        Written::Primary(path) => {
            println!("{} Wrote {}", palette.ok("✓"), path.display());
        }
        Written::Fallback(path) => {
            println!(
                "{} Could not write inside {}. Wrote to:",
                palette.warn("!"),
                root.display()
            );
            println!("  {}", path.display());
        }
    }

    let stats = &catalog.stats;
    println!(
        "Scanned {} XML files • {} records • {} parse errors • {} source(s)",
        palette.accent(&stats.documents_scanned.to_string()),
        palette.accent(&payload.meta.total.to_string()),
        palette.accent(&stats.parse_failures.to_string()),
        palette.accent(&payload.meta.sources.to_string()),
    );
    if stats.duplicate_ids > 0 {
        println!(
            "{} {} duplicate id(s) were renamed with a ~N suffix",
            palette.warn("!"),
            stats.duplicate_ids
        );
    }
    Ok(())
}
