//! Pool configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```rust
//! use cfx_host::PoolConfig;
//!
//! let cfg: PoolConfig = serde_json::from_str(r#"{"max_hosts": 2}"#).unwrap();
//! assert_eq!(cfg.max_hosts, Some(2));
//! assert_eq!(cfg.workstore_ttl_ms, 3000);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default workstore TTL in milliseconds.
pub const DEFAULT_WORKSTORE_TTL_MS: u64 = 3000;

/// Default worker thread name prefix.
pub const DEFAULT_THREAD_NAME: &str = "cfx-host";

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Upper bound on host threads (None = grow on demand).
    pub max_hosts: Option<usize>,
    /// Hosts started eagerly when the pool is built.
    pub prewarm: usize,
    /// Workstore entry lifetime in each host.
    pub workstore_ttl_ms: u64,
    /// Thread name prefix; threads are named `{prefix}-{n}`.
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_hosts: None,
            prewarm: 0,
            workstore_ttl_ms: DEFAULT_WORKSTORE_TTL_MS,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl PoolConfig {
    /// Workstore TTL as a duration.
    pub fn workstore_ttl(&self) -> Duration {
        Duration::from_millis(self.workstore_ttl_ms)
    }

    /// True if another host may be started when `running` already exist.
    pub fn allows_another(&self, running: usize) -> bool {
        self.max_hosts.is_none_or(|max| running < max.max(1))
    }
}
