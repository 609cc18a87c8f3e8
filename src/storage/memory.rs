//! In-memory role and flag stores
//!
//! DashMap-backed reference implementation of the store traits. Mutations
//! fire the registered change-notification hooks after the write lands,
//! the same contract a durable collaborator honors after commit.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::core::flags::FeatureFlag;
use crate::core::permission::{Role, RoleId, TenantId};
use crate::core::traits::{FlagStore, RoleMutationHook, RoleStore};
use crate::utils::error::Result;

/// In-memory role store with mutation notification fan-out
#[derive(Default)]
pub struct MemoryRoleStore {
    roles: DashMap<(TenantId, RoleId), Role>,
    subject_roles: DashMap<(TenantId, String), Vec<RoleId>>,
    hooks: RwLock<Vec<RoleMutationHook>>,
}

impl MemoryRoleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a role.
    ///
    /// Maintains the reciprocal child edge on every existing parent, then
    /// notifies mutation hooks.
    pub fn upsert_role(&self, role: Role) {
        let tenant_id = role.tenant_id.clone();
        let role_id = role.id.clone();

        for parent_id in role.parent_role_ids.iter() {
            if let Some(mut parent) = self
                .roles
                .get_mut(&(tenant_id.clone(), parent_id.clone()))
            {
                parent.child_role_ids.insert(role_id.clone());
            }
        }

        self.roles
            .insert((tenant_id.clone(), role_id.clone()), role);
        self.notify(&tenant_id, &role_id);
    }

    /// Remove a role. Parent edges referencing it become dangling, which
    /// resolution tolerates.
    pub fn remove_role(&self, tenant_id: &str, role_id: &str) {
        self.roles
            .remove(&(tenant_id.to_string(), role_id.to_string()));
        self.notify(tenant_id, role_id);
    }

    /// Replace a subject's role assignments
    pub fn assign_roles(&self, tenant_id: &str, subject_id: &str, role_ids: Vec<RoleId>) {
        self.subject_roles.insert(
            (tenant_id.to_string(), subject_id.to_string()),
            role_ids.clone(),
        );
        for role_id in &role_ids {
            self.notify(tenant_id, role_id);
        }
    }

    fn notify(&self, tenant_id: &str, role_id: &str) {
        let hooks = self.hooks.read();
        debug!(tenant_id, role_id, hooks = hooks.len(), "role mutated");
        for hook in hooks.iter() {
            hook(tenant_id, role_id);
        }
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn get_role(&self, tenant_id: &str, role_id: &str) -> Result<Option<Role>> {
        Ok(self
            .roles
            .get(&(tenant_id.to_string(), role_id.to_string()))
            .map(|role| role.clone()))
    }

    async fn get_subject_roles(&self, tenant_id: &str, subject_id: &str) -> Result<Vec<RoleId>> {
        Ok(self
            .subject_roles
            .get(&(tenant_id.to_string(), subject_id.to_string()))
            .map(|roles| roles.clone())
            .unwrap_or_default())
    }

    fn on_role_mutated(&self, hook: RoleMutationHook) {
        self.hooks.write().push(hook);
    }
}

/// In-memory feature flag store
#[derive(Default)]
pub struct MemoryFlagStore {
    flags: DashMap<(Option<TenantId>, String), FeatureFlag>,
}

impl MemoryFlagStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a flag under its tenant scope
    pub fn upsert_flag(&self, flag: FeatureFlag) {
        self.flags
            .insert((flag.tenant_id.clone(), flag.name.clone()), flag);
    }

    /// Remove a flag
    pub fn remove_flag(&self, tenant_id: Option<&str>, name: &str) {
        self.flags
            .remove(&(tenant_id.map(str::to_string), name.to_string()));
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn get_flag(&self, tenant_id: Option<&str>, name: &str) -> Result<Option<FeatureFlag>> {
        Ok(self
            .flags
            .get(&(tenant_id.map(str::to_string), name.to_string()))
            .map(|flag| flag.clone()))
    }
}
