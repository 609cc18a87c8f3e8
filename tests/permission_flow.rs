//! End-to-end permission and feature flag flows through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use authgate_rs::config::EngineConfig;
use authgate_rs::core::flags::{EvaluationContext, FeatureFlag};
use authgate_rs::core::permission::Role;
use authgate_rs::core::traits::{FlagStore, RoleMutationHook, RoleStore};
use authgate_rs::services::PermissionService;
use authgate_rs::storage::{MemoryFlagStore, MemoryRoleStore};

fn service_with(roles: &Arc<MemoryRoleStore>, flags: &Arc<MemoryFlagStore>) -> PermissionService {
    PermissionService::new(
        Arc::clone(roles) as Arc<dyn RoleStore>,
        Arc::clone(flags) as Arc<dyn FlagStore>,
        EngineConfig::default(),
    )
}

#[tokio::test]
async fn agent_manager_inheritance_and_denial() {
    let roles = Arc::new(MemoryRoleStore::new());
    let flags = Arc::new(MemoryFlagStore::new());
    let service = service_with(&roles, &flags);

    roles.upsert_role(Role::new("agent", "crm").with_permissions(["leads:read"]));
    roles.upsert_role(
        Role::new("manager", "crm")
            .with_permissions(["leads:write"])
            .with_parents(["agent"]),
    );
    roles.assign_roles("crm", "alice", vec!["manager".to_string()]);
    roles.assign_roles("crm", "bob", vec!["agent".to_string()]);

    assert_eq!(
        service.effective_permissions("alice", "crm").await.unwrap(),
        vec!["leads:read".to_string(), "leads:write".to_string()]
    );

    // deny leads:read on manager; alice loses it, bob keeps it
    roles.upsert_role(
        Role::new("manager", "crm")
            .with_permissions(["leads:write"])
            .with_parents(["agent"])
            .with_denials(["leads:read"]),
    );

    assert_eq!(
        service.effective_permissions("alice", "crm").await.unwrap(),
        vec!["leads:write".to_string()]
    );
    assert_eq!(
        service.effective_permissions("bob", "crm").await.unwrap(),
        vec!["leads:read".to_string()]
    );
}

#[tokio::test]
async fn mutation_takes_effect_before_ttl_expiry() {
    let roles = Arc::new(MemoryRoleStore::new());
    let flags = Arc::new(MemoryFlagStore::new());
    let service = service_with(&roles, &flags);

    roles.upsert_role(Role::new("agent", "crm").with_permissions(["leads:read"]));
    roles.assign_roles("crm", "alice", vec!["agent".to_string()]);

    assert!(!service.has_permission("alice", "crm", "leads:export").await);

    roles.upsert_role(
        Role::new("agent", "crm").with_permissions(["leads:read", "leads:export"]),
    );

    // the default TTL is minutes; the mutation hook must make this visible now
    assert!(service.has_permission("alice", "crm", "leads:export").await);
}

/// Role store that counts subject lookups so tests can observe how many
/// resolutions actually reached the store.
struct CountingRoleStore {
    inner: MemoryRoleStore,
    subject_lookups: AtomicUsize,
}

#[async_trait::async_trait]
impl RoleStore for CountingRoleStore {
    async fn get_role(
        &self,
        tenant_id: &str,
        role_id: &str,
    ) -> authgate_rs::Result<Option<Role>> {
        self.inner.get_role(tenant_id, role_id).await
    }

    async fn get_subject_roles(
        &self,
        tenant_id: &str,
        subject_id: &str,
    ) -> authgate_rs::Result<Vec<String>> {
        self.subject_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_subject_roles(tenant_id, subject_id).await
    }

    fn on_role_mutated(&self, hook: RoleMutationHook) {
        self.inner.on_role_mutated(hook);
    }
}

#[tokio::test]
async fn concurrent_checks_share_one_resolution() {
    let counting = Arc::new(CountingRoleStore {
        inner: MemoryRoleStore::new(),
        subject_lookups: AtomicUsize::new(0),
    });
    counting
        .inner
        .upsert_role(Role::new("agent", "crm").with_permissions(["leads:read"]));
    counting
        .inner
        .assign_roles("crm", "user-0", vec!["agent".to_string()]);

    let service = Arc::new(PermissionService::new(
        Arc::clone(&counting) as Arc<dyn RoleStore>,
        Arc::new(MemoryFlagStore::new()),
        EngineConfig::default(),
    ));

    let mut handles = Vec::new();
    for _ in 0..32 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.has_permission("user-0", "crm", "leads:read").await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    assert_eq!(counting.subject_lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cycle_in_role_graph_still_terminates_quickly() {
    let roles = Arc::new(MemoryRoleStore::new());
    let flags = Arc::new(MemoryFlagStore::new());
    let service = service_with(&roles, &flags);

    roles.upsert_role(
        Role::new("r1", "crm")
            .with_permissions(["a:do"])
            .with_parents(["r2"]),
    );
    roles.upsert_role(
        Role::new("r2", "crm")
            .with_permissions(["b:do"])
            .with_parents(["r1"]),
    );
    roles.assign_roles("crm", "alice", vec!["r1".to_string()]);

    let effective = tokio::time::timeout(
        Duration::from_secs(1),
        service.effective_permissions("alice", "crm"),
    )
    .await
    .expect("resolution must terminate despite the cycle")
    .unwrap();
    assert_eq!(effective, vec!["a:do".to_string(), "b:do".to_string()]);
}

#[tokio::test]
async fn flag_rollout_is_stable_per_user() {
    let roles = Arc::new(MemoryRoleStore::new());
    let flags = Arc::new(MemoryFlagStore::new());
    let service = service_with(&roles, &flags);

    let mut flag = FeatureFlag::new("new-pipeline");
    flag.rollout_percentage = 50;
    flags.upsert_flag(flag);

    let ctx = EvaluationContext::for_user("alice", "crm");
    let (first, _) = service.evaluate_feature_flag("new-pipeline", &ctx).await;
    for _ in 0..100 {
        let (enabled, _) = service.evaluate_feature_flag("new-pipeline", &ctx).await;
        assert_eq!(enabled, first);
    }
}
