//! Feature flag evaluation
//!
//! Stateless, deterministic flag evaluation: ordered condition checks,
//! target lists, and a rollout-percentage gate bucketed by a stable hash.

mod evaluator;
#[cfg(test)]
mod tests;
mod types;

pub use evaluator::{rollout_bucket, FeatureFlagEvaluator};
pub use types::{
    ConditionOperator, EvaluationContext, FeatureFlag, FlagCondition, FlagDecision,
};
