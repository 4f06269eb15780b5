//! `defscope` command line.
//!
//! ```text
//! defscope build <ROOT>        scan sources, write defscope.json
//! defscope search <QUERY>...   grouped, highlighted matches
//! defscope show <ID>           one record with its parent chain
//! defscope values <TAG>        distinct values of a tag
//! defscope facets              source and type counts
//! ```

mod browse_cmd;
mod build_cmd;
pub mod discover;
pub mod output;
mod render;

use anyhow::Context;
use anyhow::Result;
use clap::ArgAction;
use clap::Parser;
use clap::Subcommand;
use defscope_core::DefscopeConfig;
use std::path::Path;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use browse_cmd::FacetsArgs;
pub use browse_cmd::PayloadArg;
pub use browse_cmd::SearchArgs;
pub use browse_cmd::ShowArgs;
pub use browse_cmd::ValuesArgs;
pub use build_cmd::BuildArgs;
pub use render::ColorChoice;
pub use render::Palette;

#[derive(Debug, Parser)]
#[command(
    name = "defscope",
    version,
    about = "Index and browse definition and patch XML across content sources"
)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// When to color output
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a data root and write the payload
    Build(BuildArgs),

    /// Search records in a payload
    Search(SearchArgs),

    /// Show one record in detail
    Show(ShowArgs),

    /// Look up the values of a tag across all records
    Values(ValuesArgs),

    /// List sources and types with record counts
    Facets(FacetsArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let palette = Palette::new(self.color);
        match self.command {
            Command::Build(args) => {
                let config = load_config(self.config.as_deref())?;
                build_cmd::run_build(args, &config, palette)
            }
            Command::Search(args) => browse_cmd::run_search(args, palette),
            Command::Show(args) => browse_cmd::run_show(args, palette),
            Command::Values(args) => browse_cmd::run_values(args, palette),
            Command::Facets(args) => browse_cmd::run_facets(args, palette),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<DefscopeConfig> {
    match path {
        Some(path) => DefscopeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(DefscopeConfig::default()),
    }
}

/// Log to stderr. `RUST_LOG` wins over the verbosity flag.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
