//! cfx - canvas filter packets from the command line
//!
//! Runs filter packets through the worker pool, prints brushes and lists
//! the filter catalog.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cfx")]
#[command(author, version, about = "Canvas filter pipeline CLI")]
#[command(long_about = "
Applies canvas filter packets (JSON) to RGBA images.

Examples:
  cfx apply packet.json -o out.json       # Filter one packet
  cfx batch 'frames/*.json' -o filtered/  # Filter many packets in parallel
  cfx brush --rx 5 --ry 3 --roll 30       # Print a blur brush
  cfx catalog                             # List filter methods
  RUST_LOG=cfx_host=trace cfx apply p.json
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Pool configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum number of host threads (overrides the config file)
    #[arg(long, global = true)]
    max_hosts: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter one packet
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// Filter every packet matching a glob pattern
    Batch(BatchArgs),

    /// Print the kernel of a blur brush
    Brush(BrushArgs),

    /// List the available filter methods
    Catalog,
}

#[derive(Args)]
struct ApplyArgs {
    /// Input packet (JSON)
    input: PathBuf,

    /// Output packet (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct BatchArgs {
    /// Input glob pattern (e.g., "frames/*.json")
    input: String,

    /// Output directory
    #[arg(short = 'o', long = "output")]
    output_dir: PathBuf,
}

#[derive(Args)]
struct BrushArgs {
    /// Horizontal radius
    #[arg(long, default_value = "2")]
    rx: f64,

    /// Vertical radius
    #[arg(long, default_value = "2")]
    ry: f64,

    /// Rotation in degrees
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    roll: f64,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let pool_config = || commands::load_pool_config(cli.config.as_deref(), cli.max_hosts);

    match cli.command {
        Commands::Apply(args) => commands::apply::run(args, pool_config()?, cli.verbose),
        Commands::Batch(args) => commands::batch::run(args, pool_config()?, cli.verbose),
        Commands::Brush(args) => commands::brush::run(args, cli.verbose),
        Commands::Catalog => commands::catalog::run(cli.verbose),
    }
}
