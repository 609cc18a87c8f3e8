//! Permission service implementation

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::core::flags::{EvaluationContext, FeatureFlag, FeatureFlagEvaluator};
use crate::core::permission::{
    matcher, PermissionCheck, PermissionKey, PermissionResolver, ResolvedPermissionSet,
    SubjectType,
};
use crate::core::resolution_cache::{CacheKey, CacheStats, ResolutionCache};
use crate::core::traits::{FlagStore, RoleStore};
use crate::utils::error::{AuthzError, Result};

/// Orchestrates the resolver and the resolution cache.
///
/// Every query method that returns a bare `bool` degrades to `false` on any
/// internal error: the service boundary is an authorization gate and fails
/// closed. The `check_*` variants return `Result` so callers that need to
/// tell "denied" apart from "authorization system degraded" can.
pub struct PermissionService {
    role_store: Arc<dyn RoleStore>,
    flag_store: Arc<dyn FlagStore>,
    resolver: PermissionResolver,
    evaluator: FeatureFlagEvaluator,
    cache: ResolutionCache,
    resolution_timeout: Duration,
}

impl PermissionService {
    /// Create a new permission service.
    ///
    /// Registers the cache invalidation hook on the role store so every
    /// committed role write bumps the owning tenant's source version.
    pub fn new(
        role_store: Arc<dyn RoleStore>,
        flag_store: Arc<dyn FlagStore>,
        config: EngineConfig,
    ) -> Self {
        let cache = ResolutionCache::new(config.cache.clone());

        let hook_cache = cache.clone();
        role_store.on_role_mutated(Arc::new(move |tenant_id: &str, role_id: &str| {
            hook_cache.invalidate_role(tenant_id, role_id);
        }));

        info!("permission service initialized");
        Self {
            role_store,
            flag_store,
            resolver: PermissionResolver::new(),
            evaluator: FeatureFlagEvaluator::new(),
            cache,
            resolution_timeout: Duration::from_millis(config.resolver.resolution_timeout_ms),
        }
    }

    /// Check whether a subject holds the exact permission key
    pub async fn check_permission(
        &self,
        subject_id: &str,
        tenant_id: &str,
        permission: &str,
    ) -> Result<bool> {
        let snapshot = self
            .resolve_cached(SubjectType::User, subject_id, tenant_id)
            .await?;
        Ok(snapshot.contains(permission))
    }

    /// Check whether a subject holds any of the permission keys.
    /// One resolution per call; membership tests short-circuit.
    pub async fn check_any_permission(
        &self,
        subject_id: &str,
        tenant_id: &str,
        permissions: &[PermissionKey],
    ) -> Result<bool> {
        let snapshot = self
            .resolve_cached(SubjectType::User, subject_id, tenant_id)
            .await?;
        Ok(permissions.iter().any(|key| snapshot.contains(key)))
    }

    /// Check whether a subject holds all of the permission keys.
    /// One resolution per call; membership tests short-circuit.
    pub async fn check_all_permissions(
        &self,
        subject_id: &str,
        tenant_id: &str,
        permissions: &[PermissionKey],
    ) -> Result<bool> {
        let snapshot = self
            .resolve_cached(SubjectType::User, subject_id, tenant_id)
            .await?;
        Ok(permissions.iter().all(|key| snapshot.contains(key)))
    }

    /// `check_permission`, degraded to deny on error
    pub async fn has_permission(&self, subject_id: &str, tenant_id: &str, permission: &str) -> bool {
        self.fail_closed(
            self.check_permission(subject_id, tenant_id, permission)
                .await,
        )
    }

    /// `check_any_permission`, degraded to deny on error
    pub async fn has_any_permission(
        &self,
        subject_id: &str,
        tenant_id: &str,
        permissions: &[PermissionKey],
    ) -> bool {
        self.fail_closed(
            self.check_any_permission(subject_id, tenant_id, permissions)
                .await,
        )
    }

    /// `check_all_permissions`, degraded to deny on error
    pub async fn has_all_permissions(
        &self,
        subject_id: &str,
        tenant_id: &str,
        permissions: &[PermissionKey],
    ) -> bool {
        self.fail_closed(
            self.check_all_permissions(subject_id, tenant_id, permissions)
                .await,
        )
    }

    /// Check a wildcard pattern (`leads:*`) against the subject's effective
    /// set, degraded to deny on error
    pub async fn has_permission_matching(
        &self,
        subject_id: &str,
        tenant_id: &str,
        pattern: &str,
    ) -> bool {
        let result = self
            .resolve_cached(SubjectType::User, subject_id, tenant_id)
            .await
            .map(|snapshot| {
                snapshot
                    .permissions
                    .iter()
                    .any(|key| matcher::matches(pattern, key))
            });
        self.fail_closed(result)
    }

    /// Detailed permission check for diagnostics surfaces
    pub async fn check_permission_detailed(
        &self,
        subject_id: &str,
        tenant_id: &str,
        permission: &str,
    ) -> Result<PermissionCheck> {
        let snapshot = self
            .resolve_cached(SubjectType::User, subject_id, tenant_id)
            .await?;

        let matched_key = if snapshot.contains(permission) {
            Some(permission.to_string())
        } else {
            matcher::find_match(permission, snapshot.permissions.iter().map(String::as_str))
                .map(str::to_string)
        };

        Ok(match matched_key {
            Some(matched_key) => PermissionCheck {
                granted: true,
                matched_key: Some(matched_key),
                denial_reason: None,
            },
            None => PermissionCheck {
                granted: false,
                matched_key: None,
                denial_reason: Some(format!("Missing permission: {}", permission)),
            },
        })
    }

    /// The subject's effective permission keys, sorted
    pub async fn effective_permissions(
        &self,
        subject_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<PermissionKey>> {
        let snapshot = self
            .resolve_cached(SubjectType::User, subject_id, tenant_id)
            .await?;
        let mut keys: Vec<PermissionKey> = snapshot.permissions.into_iter().collect();
        keys.sort();
        Ok(keys)
    }

    /// The full snapshot for a subject, including `computed_at` and
    /// `source_version`, for diagnostics endpoints
    pub async fn effective_permissions_detailed(
        &self,
        subject_id: &str,
        tenant_id: &str,
    ) -> Result<ResolvedPermissionSet> {
        self.resolve_cached(SubjectType::User, subject_id, tenant_id)
            .await
    }

    /// A role's effective permission keys, sorted
    pub async fn effective_role_permissions(
        &self,
        role_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<PermissionKey>> {
        let snapshot = self
            .resolve_cached(SubjectType::Role, role_id, tenant_id)
            .await?;
        let mut keys: Vec<PermissionKey> = snapshot.permissions.into_iter().collect();
        keys.sort();
        Ok(keys)
    }

    /// Drop the cached snapshot for one subject
    pub fn invalidate_user(&self, subject_id: &str, tenant_id: &str) {
        self.cache
            .invalidate(&CacheKey::user(subject_id, tenant_id));
    }

    /// Invalidate a role and everything that could have inherited from it
    pub fn invalidate_role(&self, role_id: &str, tenant_id: &str) {
        self.cache.invalidate_role(tenant_id, role_id);
    }

    /// Invalidate every cached snapshot for a tenant
    pub fn invalidate_tenant(&self, tenant_id: &str) {
        self.cache.invalidate_tenant(tenant_id);
    }

    /// Cache hit/miss counters for monitoring collaborators
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Evaluate a feature flag for a request context.
    ///
    /// Tenant-scoped lookup falls back to the global record. Store failures
    /// evaluate to disabled with a distinct reason; flag gating is not an
    /// authorization decision but degrades the same way.
    pub async fn evaluate_feature_flag(
        &self,
        name: &str,
        context: &EvaluationContext,
    ) -> (bool, String) {
        let flag = match self.lookup_flag(name, context.tenant_id.as_deref()).await {
            Ok(flag) => flag,
            Err(err) => {
                warn!(flag = name, error = %err, "flag lookup failed, treating as disabled");
                return (false, "flag_store_error".to_string());
            }
        };

        let decision = self.evaluator.evaluate(flag.as_ref(), context);
        (decision.enabled, decision.reason)
    }

    async fn lookup_flag(&self, name: &str, tenant_id: Option<&str>) -> Result<Option<FeatureFlag>> {
        if let Some(tenant) = tenant_id {
            if let Some(flag) = self.flag_store.get_flag(Some(tenant), name).await? {
                return Ok(Some(flag));
            }
        }
        self.flag_store.get_flag(None, name).await
    }

    /// Resolve through the cache behind the single-flight guard.
    ///
    /// The computation is handed off to the cache as an owned future so a
    /// cancelled caller detaches without cancelling it for other waiters.
    /// The tenant's source version is captured before the graph walk begins;
    /// a mutation landing mid-walk leaves the snapshot already stale.
    async fn resolve_cached(
        &self,
        subject_type: SubjectType,
        subject_id: &str,
        tenant_id: &str,
    ) -> Result<ResolvedPermissionSet> {
        let key = CacheKey {
            subject_type,
            subject_id: subject_id.to_string(),
            tenant_id: tenant_id.to_string(),
        };
        let ttl = self.cache.default_ttl();

        let store = Arc::clone(&self.role_store);
        let resolver = self.resolver;
        let cache = self.cache.clone();
        let timeout = self.resolution_timeout;
        let subject = subject_id.to_string();
        let tenant = tenant_id.to_string();

        self.cache
            .get_or_compute(key, ttl, move || async move {
                let version = cache.current_version(&tenant);

                let walk = async {
                    match subject_type {
                        SubjectType::Role => resolver.resolve(store.as_ref(), &tenant, &subject).await,
                        SubjectType::User => {
                            let role_ids = store.get_subject_roles(&tenant, &subject).await?;
                            resolver
                                .resolve_subject(store.as_ref(), &tenant, &role_ids)
                                .await
                        }
                    }
                };
                let permissions = tokio::time::timeout(timeout, walk).await.map_err(|_| {
                    AuthzError::Timeout(format!(
                        "permission resolution exceeded {}ms",
                        timeout.as_millis()
                    ))
                })??;

                let computed_at = Utc::now();
                let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
                let expires_at = computed_at
                    .checked_add_signed(chrono::Duration::milliseconds(ttl_ms))
                    .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);
                Ok(ResolvedPermissionSet {
                    subject_id: subject,
                    tenant_id: tenant,
                    permissions,
                    computed_at,
                    expires_at,
                    source_version: version,
                })
            })
            .await
    }

    fn fail_closed(&self, result: Result<bool>) -> bool {
        match result {
            Ok(granted) => granted,
            Err(err) => {
                warn!(error = %err, "permission check degraded to deny");
                false
            }
        }
    }
}
