//! Store trait definitions
//!
//! The narrow interface the engine consumes from the persistence collaborator.
//! `Ok(None)` means the record legitimately does not exist (contributes
//! nothing during traversal); `Err` means the store itself failed and the
//! failure propagates so resolution can fail closed.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::flags::FeatureFlag;
use crate::core::permission::{Role, RoleId};
use crate::utils::error::Result;

/// Callback invoked after any committed write to a role record,
/// with `(tenant_id, role_id)`.
pub type RoleMutationHook = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Durable storage of role records.
///
/// Role ids and permission keys are scoped to a tenant and never compared
/// across tenants; every method takes the tenant explicitly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Fetch a role by id.
    async fn get_role(&self, tenant_id: &str, role_id: &str) -> Result<Option<Role>>;

    /// Fetch the role ids assigned to a subject (user).
    ///
    /// An unknown subject yields an empty list, not an error.
    async fn get_subject_roles(&self, tenant_id: &str, subject_id: &str) -> Result<Vec<RoleId>>;

    /// Register a change-notification callback, invoked after any committed
    /// write to a role record.
    fn on_role_mutated(&self, hook: RoleMutationHook);
}

/// Durable storage of feature flag records.
#[async_trait]
pub trait FlagStore: Send + Sync {
    /// Fetch a flag by name. `tenant_id: None` addresses the global record.
    async fn get_flag(&self, tenant_id: Option<&str>, name: &str) -> Result<Option<FeatureFlag>>;
}
