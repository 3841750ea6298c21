//! Batch processing command

use crate::BatchArgs;
use anyhow::{Result, bail};
use cfx_host::{FilterPool, PoolConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, trace};

pub fn run(args: BatchArgs, config: PoolConfig, verbose: u8) -> Result<()> {
    trace!(pattern = %args.input, "batch::run");

    let files: Vec<PathBuf> = glob::glob(&args.input)?
        .filter_map(|r| r.ok())
        .collect();

    if files.is_empty() {
        bail!("No files match pattern: {}", args.input);
    }

    info!(files = files.len(), pattern = %args.input, "Starting batch processing");
    if verbose > 0 {
        println!("Found {} files matching '{}'", files.len(), args.input);
    }

    std::fs::create_dir_all(&args.output_dir)?;

    let pool = FilterPool::with_config(config)?;
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut pending: HashMap<u64, PathBuf> = HashMap::new();
    let mut failed = 0;

    for input in files {
        match super::load_packet(&input) {
            Ok(packet) => {
                let id = pool.submit_with(packet, &tx)?;
                pending.insert(id, input);
            }
            Err(e) => {
                failed += 1;
                eprintln!("Error: {e:#}");
            }
        }
    }
    drop(tx);

    let mut success = 0;
    while !pending.is_empty() {
        let Ok(response) = rx.recv() else {
            bail!("Filter pool stopped with {} packets outstanding", pending.len());
        };
        let Some(input) = pending.remove(&response.id) else {
            debug!(id = response.id, "response for unknown request");
            continue;
        };
        let name = input.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("packet.json"));
        let output = args.output_dir.join(name);
        match super::save_packet(&output, &response.packet) {
            Ok(()) => {
                success += 1;
                if verbose > 0 {
                    println!("Processed {} -> {}", input.display(), output.display());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("Error: {e:#}");
            }
        }
    }

    info!(success = success, failed = failed, "Batch processing complete");
    println!("Processed: {} success, {} failed", success, failed);

    if failed > 0 {
        bail!("{} files failed", failed);
    }

    Ok(())
}
