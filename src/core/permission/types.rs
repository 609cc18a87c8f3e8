//! Permission type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Role identifier, scoped to a tenant
pub type RoleId = String;

/// Tenant identifier
pub type TenantId = String;

/// Permission key of the form `resource:action[:scope[:scope...]]`.
/// Equality is exact-string; ordering is irrelevant.
pub type PermissionKey = String;

/// The kind of subject a cached resolution belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// A user holding one or more roles
    User,
    /// A role resolved directly
    Role,
}

/// Role definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Role id
    pub id: RoleId,
    /// Tenant this role belongs to
    pub tenant_id: TenantId,
    /// Parent roles (inheritance sources)
    #[serde(default)]
    pub parent_role_ids: HashSet<RoleId>,
    /// Child roles (reciprocal edges, maintained by the store on write)
    #[serde(default)]
    pub child_role_ids: HashSet<RoleId>,
    /// Permissions granted directly by this role
    #[serde(default)]
    pub direct_permissions: HashSet<PermissionKey>,
    /// Explicit overrides that remove a permission even if inherited
    #[serde(default)]
    pub denied_permissions: HashSet<PermissionKey>,
    /// Tie-break hint exposed to callers; resolution never consults it
    #[serde(default)]
    pub priority: i32,
    /// Inactive roles are excluded from traversal entirely
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Role {
    /// Create a minimal active role
    pub fn new(id: impl Into<RoleId>, tenant_id: impl Into<TenantId>) -> Self {
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            parent_role_ids: HashSet::new(),
            child_role_ids: HashSet::new(),
            direct_permissions: HashSet::new(),
            denied_permissions: HashSet::new(),
            priority: 0,
            is_active: true,
        }
    }

    /// Add directly granted permissions
    pub fn with_permissions<I, K>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PermissionKey>,
    {
        self.direct_permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Add explicit denials
    pub fn with_denials<I, K>(mut self, denials: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PermissionKey>,
    {
        self.denied_permissions
            .extend(denials.into_iter().map(Into::into));
        self
    }

    /// Add parent roles
    pub fn with_parents<I, K>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<RoleId>,
    {
        self.parent_role_ids
            .extend(parents.into_iter().map(Into::into));
        self
    }
}

fn default_active() -> bool {
    true
}

/// Resolved permission snapshot, the value cached per subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPermissionSet {
    /// Subject the snapshot was computed for
    pub subject_id: String,
    /// Tenant scope
    pub tenant_id: TenantId,
    /// Effective permission keys after inheritance and denial
    pub permissions: HashSet<PermissionKey>,
    /// When the snapshot was computed
    pub computed_at: DateTime<Utc>,
    /// When the snapshot expires
    pub expires_at: DateTime<Utc>,
    /// Tenant source version captured before computation began.
    /// A snapshot whose version is behind the tenant's current counter is
    /// stale even if `expires_at` has not elapsed.
    pub source_version: u64,
}

impl ResolvedPermissionSet {
    /// Whether the snapshot grants the exact permission key
    pub fn contains(&self, key: &str) -> bool {
        self.permissions.contains(key)
    }
}

/// Detailed permission check result
#[derive(Debug, Clone)]
pub struct PermissionCheck {
    /// Whether permission is granted
    pub granted: bool,
    /// The effective key that satisfied the check, if any
    pub matched_key: Option<PermissionKey>,
    /// Reason for denial (if not granted)
    pub denial_reason: Option<String>,
}
