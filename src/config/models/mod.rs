//! Configuration model definitions

mod cache;
mod resolver;

pub use cache::CacheConfig;
pub use resolver::ResolverConfig;

use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Resolution cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Permission resolver configuration
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl EngineConfig {
    /// Merge engine configurations
    pub fn merge(mut self, other: Self) -> Self {
        self.cache = self.cache.merge(other.cache);
        self.resolver = self.resolver.merge(other.resolver);
        self
    }
}

pub(super) fn default_true() -> bool {
    true
}
