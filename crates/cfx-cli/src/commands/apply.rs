//! Apply command

use crate::ApplyArgs;
use anyhow::{Context, Result};
use cfx_host::{FilterPool, PoolConfig};
use tracing::{info, trace};

pub fn run(args: ApplyArgs, config: PoolConfig, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), "apply::run");

    let packet = super::load_packet(&args.input)?;
    let filters = packet.filters.as_ref().map_or(0, Vec::len);
    info!(name = ?packet.name, filters, "Applying packet");

    let pool = FilterPool::with_config(config).context("Failed to start filter pool")?;
    let out = pool.run(packet).context("Filter pool stopped before responding")?;

    match &args.output {
        Some(path) => {
            super::save_packet(path, &out)?;
            if verbose > 0 {
                println!("{} -> {}", args.input.display(), path.display());
            }
        }
        None => {
            let text = serde_json::to_string_pretty(&out).context("Failed to serialize packet")?;
            println!("{text}");
        }
    }
    Ok(())
}
