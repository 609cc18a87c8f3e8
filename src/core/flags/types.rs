//! Feature flag type definitions

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::core::permission::TenantId;

/// Feature flag definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlag {
    /// Flag name
    pub name: String,
    /// Master switch; a disabled flag never evaluates to enabled
    pub enabled: bool,
    /// Tenant scope; `None` means global
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// Percentage of the bucket space admitted, 0..=100
    #[serde(default = "default_rollout")]
    pub rollout_percentage: u8,
    /// If non-empty, the context user must be a member
    #[serde(default)]
    pub target_users: HashSet<String>,
    /// If non-empty, the context roles must intersect
    #[serde(default)]
    pub target_roles: HashSet<String>,
    /// Ordered conditions, all of which must pass
    #[serde(default)]
    pub conditions: Vec<FlagCondition>,
}

impl FeatureFlag {
    /// Create a flag that is on for everyone
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            tenant_id: None,
            rollout_percentage: default_rollout(),
            target_users: HashSet::new(),
            target_roles: HashSet::new(),
            conditions: Vec::new(),
        }
    }
}

fn default_rollout() -> u8 {
    100
}

/// A single flag condition: `(field, operator, value)` compared against a
/// field resolved from the evaluation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagCondition {
    /// Context field: built-ins `userId`/`tenantId`/`roles`/`environment`,
    /// anything else resolves from `custom_data`
    pub field: String,
    /// Comparison operator
    pub operator: ConditionOperator,
    /// Comparison value
    pub value: serde_json::Value,
}

/// Closed operator set for flag conditions.
///
/// Unknown operators deserialize to `Unknown` and evaluate to false rather
/// than failing, matching the defensive posture of the rest of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    In,
    NotIn,
    #[serde(other)]
    Unknown,
}

/// Request context a flag is evaluated against
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// User identifier, also the preferred rollout bucketing key
    #[serde(default)]
    pub user_id: Option<String>,
    /// Tenant identifier, the fallback bucketing key
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// Roles held by the subject
    #[serde(default)]
    pub roles: Vec<String>,
    /// Deployment environment name
    #[serde(default)]
    pub environment: Option<String>,
    /// Free-form fields for custom conditions
    #[serde(default)]
    pub custom_data: HashMap<String, serde_json::Value>,
}

impl EvaluationContext {
    /// Context for a user within a tenant
    pub fn for_user(user_id: impl Into<String>, tenant_id: impl Into<TenantId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            tenant_id: Some(tenant_id.into()),
            ..Default::default()
        }
    }
}

/// Outcome of a flag evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDecision {
    /// Whether the flag is enabled for this context
    pub enabled: bool,
    /// Which check decided the outcome, for observability
    pub reason: String,
}

impl FlagDecision {
    pub(crate) fn disabled(reason: impl Into<String>) -> Self {
        Self {
            enabled: false,
            reason: reason.into(),
        }
    }

    pub(crate) fn enabled() -> Self {
        Self {
            enabled: true,
            reason: "enabled".to_string(),
        }
    }
}
