//! Permission resolver configuration

use serde::{Deserialize, Serialize};

/// Permission resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Timeout for a full resolution (role store lookups included), in milliseconds.
    /// Resolution fails closed once exceeded.
    #[serde(default = "default_resolution_timeout_ms")]
    pub resolution_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resolution_timeout_ms: default_resolution_timeout_ms(),
        }
    }
}

impl ResolverConfig {
    /// Merge resolver configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.resolution_timeout_ms != default_resolution_timeout_ms() {
            self.resolution_timeout_ms = other.resolution_timeout_ms;
        }
        self
    }
}

fn default_resolution_timeout_ms() -> u64 {
    5000
}
