//! # authgate-rs
//!
//! A role-based permission resolution engine with inheritance, denial
//! overrides, and a consistency-bounded cache, plus a deterministic
//! feature-flag rollout evaluator.
//!
//! ## Features
//!
//! - **Cycle-safe inheritance**: roles form a directed graph that may contain
//!   cycles by administrative error; resolution breaks them with a visited-set
//!   guard instead of rejecting writes.
//! - **Denial overrides**: explicit denials remove a permission from a role's
//!   effective set regardless of inheritance depth.
//! - **Consistency-bounded caching**: TTL snapshots plus a per-tenant source
//!   version counter, so invalidating a role takes effect on the next read
//!   rather than the next TTL expiry.
//! - **Stampede protection**: at most one concurrent recomputation per cache
//!   key; concurrent callers share the in-flight result.
//! - **Deterministic rollouts**: a stable 32-bit hash buckets users so a user
//!   admitted at 30% stays admitted at 50%.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use authgate_rs::config::EngineConfig;
//! use authgate_rs::core::permission::Role;
//! use authgate_rs::services::PermissionService;
//! use authgate_rs::storage::{MemoryFlagStore, MemoryRoleStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let roles = Arc::new(MemoryRoleStore::new());
//!     roles.upsert_role(Role::new("agent", "acme").with_permissions(["leads:read"]));
//!     roles.assign_roles("acme", "user-1", vec!["agent".to_string()]);
//!
//!     let service = PermissionService::new(
//!         roles,
//!         Arc::new(MemoryFlagStore::new()),
//!         EngineConfig::default(),
//!     );
//!
//!     assert!(service.has_permission("user-1", "acme", "leads:read").await);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

// Public module exports
pub mod config;
pub mod core;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::{Config, EngineConfig};
pub use utils::error::{AuthzError, Result};

pub use core::flags::{
    ConditionOperator, EvaluationContext, FeatureFlag, FeatureFlagEvaluator, FlagCondition,
    FlagDecision,
};
pub use core::permission::{
    PermissionCheck, PermissionKey, PermissionResolver, ResolvedPermissionSet, Role, RoleId,
    SubjectType, TenantId,
};
pub use core::resolution_cache::{CacheKey, CacheStats, ResolutionCache};
pub use core::traits::{FlagStore, RoleMutationHook, RoleStore};
pub use services::PermissionService;
pub use storage::{MemoryFlagStore, MemoryRoleStore};
