//! CLI command implementations

pub mod apply;
pub mod batch;
pub mod brush;
pub mod catalog;

use anyhow::{Context, Result};
use cfx_host::{Packet, PoolConfig};
use std::path::Path;
use tracing::debug;

/// Load a packet from a JSON file
pub fn load_packet(path: &Path) -> Result<Packet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid packet: {}", path.display()))
}

/// Save a packet as pretty JSON
pub fn save_packet(path: &Path, packet: &Packet) -> Result<()> {
    let text = serde_json::to_string_pretty(packet).context("Failed to serialize packet")?;
    std::fs::write(path, text).with_context(|| format!("Failed to save: {}", path.display()))
}

/// Pool settings from an optional YAML file, with the command-line cap on top
pub fn load_pool_config(path: Option<&Path>, max_hosts: Option<usize>) -> Result<PoolConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_yaml::from_str(&text)
                .with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => PoolConfig::default(),
    };
    if max_hosts.is_some() {
        config.max_hosts = max_hosts;
    }
    debug!(?config, "pool config");
    Ok(config)
}
