//! Feature flag evaluator tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::core::flags::{
        rollout_bucket, ConditionOperator, EvaluationContext, FeatureFlag, FeatureFlagEvaluator,
        FlagCondition,
    };

    fn evaluator() -> FeatureFlagEvaluator {
        FeatureFlagEvaluator::new()
    }

    fn condition(field: &str, operator: ConditionOperator, value: serde_json::Value) -> FlagCondition {
        FlagCondition {
            field: field.to_string(),
            operator,
            value,
        }
    }

    #[test]
    fn test_flag_not_found() {
        let decision = evaluator().evaluate(None, &EvaluationContext::default());
        assert!(!decision.enabled);
        assert_eq!(decision.reason, "flag_not_found");
    }

    #[test]
    fn test_flag_disabled() {
        let mut flag = FeatureFlag::new("beta");
        flag.enabled = false;
        let decision = evaluator().evaluate(Some(&flag), &EvaluationContext::default());
        assert_eq!(decision.reason, "flag_disabled");
    }

    #[test]
    fn test_tenant_mismatch() {
        let mut flag = FeatureFlag::new("beta");
        flag.tenant_id = Some("t1".to_string());

        let wrong = EvaluationContext::for_user("u1", "t2");
        assert_eq!(
            evaluator().evaluate(Some(&flag), &wrong).reason,
            "tenant_mismatch"
        );

        let missing = EvaluationContext::default();
        assert_eq!(
            evaluator().evaluate(Some(&flag), &missing).reason,
            "tenant_mismatch"
        );

        let right = EvaluationContext::for_user("u1", "t1");
        assert!(evaluator().evaluate(Some(&flag), &right).enabled);
    }

    #[test]
    fn test_condition_equals_on_builtin_field() {
        let mut flag = FeatureFlag::new("beta");
        flag.conditions = vec![condition(
            "environment",
            ConditionOperator::Equals,
            json!("production"),
        )];

        let mut ctx = EvaluationContext::for_user("u1", "t1");
        ctx.environment = Some("production".to_string());
        assert!(evaluator().evaluate(Some(&flag), &ctx).enabled);

        ctx.environment = Some("staging".to_string());
        let decision = evaluator().evaluate(Some(&flag), &ctx);
        assert!(!decision.enabled);
        assert_eq!(decision.reason, "condition_failed:environment");
    }

    #[test]
    fn test_condition_on_custom_data() {
        let mut flag = FeatureFlag::new("beta");
        flag.conditions = vec![
            condition("plan", ConditionOperator::In, json!(["pro", "enterprise"])),
            condition("seats", ConditionOperator::GreaterThan, json!(10)),
        ];

        let mut ctx = EvaluationContext::for_user("u1", "t1");
        ctx.custom_data.insert("plan".to_string(), json!("pro"));
        ctx.custom_data.insert("seats".to_string(), json!(25));
        assert!(evaluator().evaluate(Some(&flag), &ctx).enabled);

        ctx.custom_data.insert("seats".to_string(), json!(3));
        assert_eq!(
            evaluator().evaluate(Some(&flag), &ctx).reason,
            "condition_failed:seats"
        );
    }

    #[test]
    fn test_condition_contains_on_roles() {
        let mut flag = FeatureFlag::new("beta");
        flag.conditions = vec![condition(
            "roles",
            ConditionOperator::Contains,
            json!("admin"),
        )];

        let mut ctx = EvaluationContext::for_user("u1", "t1");
        ctx.roles = vec!["agent".to_string()];
        assert!(!evaluator().evaluate(Some(&flag), &ctx).enabled);

        ctx.roles.push("admin".to_string());
        assert!(evaluator().evaluate(Some(&flag), &ctx).enabled);
    }

    #[test]
    fn test_condition_not_in() {
        let mut flag = FeatureFlag::new("beta");
        flag.conditions = vec![condition(
            "userId",
            ConditionOperator::NotIn,
            json!(["banned-1", "banned-2"]),
        )];

        assert!(evaluator()
            .evaluate(Some(&flag), &EvaluationContext::for_user("u1", "t1"))
            .enabled);
        assert!(!evaluator()
            .evaluate(Some(&flag), &EvaluationContext::for_user("banned-1", "t1"))
            .enabled);
    }

    #[test]
    fn test_missing_field_and_unknown_operator_evaluate_false() {
        let mut flag = FeatureFlag::new("beta");
        flag.conditions = vec![condition(
            "nonexistent",
            ConditionOperator::Equals,
            json!("anything"),
        )];
        assert!(!evaluator()
            .evaluate(Some(&flag), &EvaluationContext::for_user("u1", "t1"))
            .enabled);

        // unknown operators arrive via deserialization of records written by
        // newer code; they must evaluate to false, not fail
        let parsed: FlagCondition = serde_json::from_value(json!({
            "field": "plan",
            "operator": "matches_regex",
            "value": "^pro"
        }))
        .unwrap();
        assert_eq!(parsed.operator, ConditionOperator::Unknown);

        flag.conditions = vec![parsed];
        let mut ctx = EvaluationContext::for_user("u1", "t1");
        ctx.custom_data.insert("plan".to_string(), json!("pro"));
        assert!(!evaluator().evaluate(Some(&flag), &ctx).enabled);
    }

    #[test]
    fn test_target_users() {
        let mut flag = FeatureFlag::new("beta");
        flag.target_users.insert("u1".to_string());

        assert!(evaluator()
            .evaluate(Some(&flag), &EvaluationContext::for_user("u1", "t1"))
            .enabled);
        let decision =
            evaluator().evaluate(Some(&flag), &EvaluationContext::for_user("u2", "t1"));
        assert_eq!(decision.reason, "not_in_target_users");
    }

    #[test]
    fn test_target_roles_intersection() {
        let mut flag = FeatureFlag::new("beta");
        flag.target_roles.insert("manager".to_string());

        let mut ctx = EvaluationContext::for_user("u1", "t1");
        ctx.roles = vec!["agent".to_string()];
        assert_eq!(
            evaluator().evaluate(Some(&flag), &ctx).reason,
            "not_in_target_roles"
        );

        ctx.roles.push("manager".to_string());
        assert!(evaluator().evaluate(Some(&flag), &ctx).enabled);
    }

    #[test]
    fn test_rollout_bucket_is_stable() {
        assert_eq!(rollout_bucket(""), 0);
        // 'a' = 97
        assert_eq!(rollout_bucket("a"), 97);
        // 'a' * 31 + 'b' = 3105
        assert_eq!(rollout_bucket("ab"), 5);
        for _ in 0..1000 {
            assert_eq!(rollout_bucket("user-123"), rollout_bucket("user-123"));
        }
    }

    #[test]
    fn test_rollout_determinism() {
        let mut flag = FeatureFlag::new("beta");
        flag.rollout_percentage = 40;
        let ctx = EvaluationContext::for_user("u1", "t1");

        let first = evaluator().evaluate(Some(&flag), &ctx).enabled;
        for _ in 0..1000 {
            assert_eq!(evaluator().evaluate(Some(&flag), &ctx).enabled, first);
        }
    }

    #[test]
    fn test_rollout_is_monotonic_in_percentage() {
        let bucket = rollout_bucket("u1");
        let ctx = EvaluationContext::for_user("u1", "t1");
        let mut flag = FeatureFlag::new("beta");

        for percentage in 0..=100u8 {
            flag.rollout_percentage = percentage;
            let decision = evaluator().evaluate(Some(&flag), &ctx);
            assert_eq!(
                decision.enabled,
                bucket < u32::from(percentage),
                "bucket {} vs percentage {}",
                bucket,
                percentage
            );
            if !decision.enabled {
                assert_eq!(decision.reason, "rollout_excluded");
            }
        }
    }

    #[test]
    fn test_rollout_bucket_key_fallback() {
        // no user: buckets by tenant; no tenant either: the literal "default"
        let mut flag = FeatureFlag::new("beta");
        flag.rollout_percentage = rollout_bucket("t9") as u8; // excludes t9

        let mut ctx = EvaluationContext::default();
        ctx.tenant_id = Some("t9".to_string());
        assert_eq!(
            evaluator().evaluate(Some(&flag), &ctx).reason,
            "rollout_excluded"
        );

        flag.rollout_percentage = rollout_bucket("t9") as u8 + 1; // admits t9
        assert!(evaluator().evaluate(Some(&flag), &ctx).enabled);

        flag.rollout_percentage = rollout_bucket("default") as u8;
        assert_eq!(
            evaluator().evaluate(Some(&flag), &EvaluationContext::default()).reason,
            "rollout_excluded"
        );
    }

    #[test]
    fn test_check_order_conditions_before_targets() {
        // a failing condition wins over a satisfied target list
        let mut flag = FeatureFlag::new("beta");
        flag.target_users.insert("u1".to_string());
        flag.conditions = vec![condition(
            "environment",
            ConditionOperator::Equals,
            json!("production"),
        )];

        let decision =
            evaluator().evaluate(Some(&flag), &EvaluationContext::for_user("u1", "t1"));
        assert_eq!(decision.reason, "condition_failed:environment");
    }

    #[test]
    fn test_flag_serde_defaults() {
        let flag: FeatureFlag = serde_json::from_value(serde_json::json!({
            "name": "beta",
            "enabled": true
        }))
        .unwrap();
        assert_eq!(flag.rollout_percentage, 100);
        assert!(flag.tenant_id.is_none());
        assert!(flag.conditions.is_empty());
    }
}
