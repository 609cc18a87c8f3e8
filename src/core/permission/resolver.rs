//! Permission resolver
//!
//! Pure computation: given a role id and a store to look roles up in,
//! computes the effective permission set via cycle-safe transitive closure
//! and denial subtraction. No state of its own.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::core::traits::RoleStore;
use crate::utils::error::Result;

use super::types::{PermissionKey, RoleId};

/// Type alias for boxed future to handle async recursion.
type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolves effective permissions over the role graph.
///
/// Traversal is depth-first with an explicit visited set: a role never
/// contributes twice within one resolution, which both breaks cycles and
/// bounds the walk at O(V+E). Denial is applied per role being resolved:
/// a parent's denial strips the key from the parent's own contribution but
/// never retroactively removes a permission a descendant holds directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionResolver;

impl PermissionResolver {
    /// Create a new resolver
    pub fn new() -> Self {
        Self
    }

    /// Compute the effective permission set for a single role.
    ///
    /// Absent roles, inactive roles, and dangling parent edges contribute
    /// nothing; store I/O failures propagate so the caller can fail closed.
    pub async fn resolve<S>(
        &self,
        store: &S,
        tenant_id: &str,
        role_id: &str,
    ) -> Result<HashSet<PermissionKey>>
    where
        S: RoleStore + ?Sized,
    {
        let mut visited = HashSet::new();
        collect(store, tenant_id, role_id, &mut visited).await
    }

    /// Compute the effective permission set for a subject holding several
    /// roles: the union of each role's independently resolved set.
    ///
    /// Each role gets its own visited set. Sharing one would let a denial in
    /// role A's chain swallow a grant that role B legitimately inherits
    /// through the same ancestor.
    pub async fn resolve_subject<S>(
        &self,
        store: &S,
        tenant_id: &str,
        role_ids: &[RoleId],
    ) -> Result<HashSet<PermissionKey>>
    where
        S: RoleStore + ?Sized,
    {
        let mut permissions = HashSet::new();
        for role_id in role_ids {
            permissions.extend(self.resolve(store, tenant_id, role_id).await?);
        }
        Ok(permissions)
    }
}

/// Recursive collection step: `(direct ∪ inherited) \ denied` for one role.
fn collect<'a, S>(
    store: &'a S,
    tenant_id: &'a str,
    role_id: &'a str,
    visited: &'a mut HashSet<RoleId>,
) -> BoxFuture<'a, Result<HashSet<PermissionKey>>>
where
    S: RoleStore + ?Sized,
{
    Box::pin(async move {
        // Cycle break: a role does not inherit from a cycle it participates
        // in, it simply stops contributing further.
        if !visited.insert(role_id.to_string()) {
            debug!(tenant_id, role_id, "role graph cycle, stopping traversal");
            return Ok(HashSet::new());
        }

        let role = match store.get_role(tenant_id, role_id).await? {
            Some(role) if role.is_active => role,
            Some(_) => {
                debug!(tenant_id, role_id, "inactive role excluded from traversal");
                return Ok(HashSet::new());
            }
            None => {
                // Dangling edges are tolerated: failing closed here would
                // lock out every subject holding the referencing role.
                debug!(tenant_id, role_id, "dangling role reference");
                return Ok(HashSet::new());
            }
        };

        let mut effective = role.direct_permissions.clone();

        for parent_id in &role.parent_role_ids {
            let inherited = collect(store, tenant_id, parent_id, visited).await?;
            effective.extend(inherited);
        }

        for denied in &role.denied_permissions {
            effective.remove(denied);
        }

        Ok(effective)
    })
}
