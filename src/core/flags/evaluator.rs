//! Feature flag evaluator
//!
//! Evaluation short-circuits on the first failing check, each check producing
//! a distinct reason string. The rollout gate buckets a stable key with a
//! 32-bit multiplicative hash so the same user lands in the same bucket on
//! every process, in every language.

use serde_json::Value;
use tracing::debug;

use super::types::{
    ConditionOperator, EvaluationContext, FeatureFlag, FlagCondition, FlagDecision,
};

/// Stateless feature flag evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureFlagEvaluator;

impl FeatureFlagEvaluator {
    /// Create a new evaluator
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a flag against a request context.
    ///
    /// `None` for the flag means it was not found, which evaluates to
    /// disabled rather than an error.
    pub fn evaluate(&self, flag: Option<&FeatureFlag>, context: &EvaluationContext) -> FlagDecision {
        let flag = match flag {
            Some(flag) => flag,
            None => return FlagDecision::disabled("flag_not_found"),
        };

        if !flag.enabled {
            return FlagDecision::disabled("flag_disabled");
        }

        if let Some(flag_tenant) = &flag.tenant_id {
            if context.tenant_id.as_deref() != Some(flag_tenant.as_str()) {
                return FlagDecision::disabled("tenant_mismatch");
            }
        }

        for condition in &flag.conditions {
            if !evaluate_condition(condition, context) {
                return FlagDecision::disabled(format!("condition_failed:{}", condition.field));
            }
        }

        if !flag.target_users.is_empty() {
            let is_target = context
                .user_id
                .as_ref()
                .is_some_and(|user| flag.target_users.contains(user));
            if !is_target {
                return FlagDecision::disabled("not_in_target_users");
            }
        }

        if !flag.target_roles.is_empty() {
            let intersects = context
                .roles
                .iter()
                .any(|role| flag.target_roles.contains(role));
            if !intersects {
                return FlagDecision::disabled("not_in_target_roles");
            }
        }

        let bucket_key = context
            .user_id
            .as_deref()
            .or(context.tenant_id.as_deref())
            .unwrap_or("default");
        if rollout_bucket(bucket_key) >= u32::from(flag.rollout_percentage) {
            return FlagDecision::disabled("rollout_excluded");
        }

        FlagDecision::enabled()
    }
}

/// Deterministic rollout bucket in `0..100` for a bucketing key.
///
/// `hash = hash * 31 + code_unit` over the key's UTF-16 code units with
/// 32-bit signed wrapping, then `abs(hash) % 100`. Stable across processes
/// and languages; rollout consistency per user depends on it.
pub fn rollout_bucket(key: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in key.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    hash.unsigned_abs() % 100
}

/// Evaluate one condition against the context. Unresolvable fields and
/// unknown operators evaluate to false.
fn evaluate_condition(condition: &FlagCondition, context: &EvaluationContext) -> bool {
    let field_value = resolve_field(&condition.field, context);

    match condition.operator {
        ConditionOperator::Equals => field_value == condition.value,
        ConditionOperator::NotEquals => field_value != condition.value,
        ConditionOperator::Contains => contains(&field_value, &condition.value),
        ConditionOperator::NotContains => !contains(&field_value, &condition.value),
        ConditionOperator::GreaterThan => compare(&field_value, &condition.value)
            .map(|ordering| ordering == std::cmp::Ordering::Greater)
            .unwrap_or(false),
        ConditionOperator::LessThan => compare(&field_value, &condition.value)
            .map(|ordering| ordering == std::cmp::Ordering::Less)
            .unwrap_or(false),
        ConditionOperator::In => match &condition.value {
            Value::Array(candidates) => candidates.contains(&field_value),
            _ => false,
        },
        ConditionOperator::NotIn => match &condition.value {
            Value::Array(candidates) => !candidates.contains(&field_value),
            _ => false,
        },
        ConditionOperator::Unknown => {
            debug!(field = %condition.field, "unknown condition operator");
            false
        }
    }
}

/// Resolve a condition field from the context: built-ins first, then
/// `custom_data`, then null.
fn resolve_field(field: &str, context: &EvaluationContext) -> Value {
    match field {
        "userId" => context
            .user_id
            .as_ref()
            .map(|id| Value::String(id.clone()))
            .unwrap_or(Value::Null),
        "tenantId" => context
            .tenant_id
            .as_ref()
            .map(|id| Value::String(id.clone()))
            .unwrap_or(Value::Null),
        "roles" => Value::Array(
            context
                .roles
                .iter()
                .map(|role| Value::String(role.clone()))
                .collect(),
        ),
        "environment" => context
            .environment
            .as_ref()
            .map(|env| Value::String(env.clone()))
            .unwrap_or(Value::Null),
        other => context
            .custom_data
            .get(other)
            .cloned()
            .unwrap_or(Value::Null),
    }
}

fn contains(field_value: &Value, needle: &Value) -> bool {
    match (field_value, needle) {
        (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
        (Value::Array(items), needle) => items.contains(needle),
        _ => false,
    }
}

fn compare(field_value: &Value, other: &Value) -> Option<std::cmp::Ordering> {
    let left = field_value.as_f64()?;
    let right = other.as_f64()?;
    left.partial_cmp(&right)
}
