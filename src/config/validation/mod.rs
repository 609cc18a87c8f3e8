//! Configuration validation

use super::models::EngineConfig;
use crate::utils::error::{AuthzError, Result};

/// Validation trait for configuration types
pub trait Validate {
    /// Validate the configuration, returning the first violation found
    fn validate(&self) -> Result<()>;
}

impl Validate for EngineConfig {
    fn validate(&self) -> Result<()> {
        if self.cache.ttl == 0 {
            return Err(AuthzError::Validation(
                "cache.ttl must be greater than 0".to_string(),
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(AuthzError::Validation(
                "cache.max_entries must be greater than 0".to_string(),
            ));
        }
        if self.resolver.resolution_timeout_ms == 0 {
            return Err(AuthzError::Validation(
                "resolver.resolution_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
