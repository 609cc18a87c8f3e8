//! Resolution benchmarks
//!
//! Measures cold graph walks against cached lookups over a mid-size role
//! hierarchy.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;

use authgate_rs::config::EngineConfig;
use authgate_rs::core::permission::{PermissionResolver, Role};
use authgate_rs::services::PermissionService;
use authgate_rs::storage::{MemoryFlagStore, MemoryRoleStore};

fn seed_hierarchy(store: &MemoryRoleStore, width: usize, depth: usize) {
    store.upsert_role(Role::new("root", "bench").with_permissions(["base:read"]));
    for level in 1..depth {
        for slot in 0..width {
            let parent = if level == 1 {
                "root".to_string()
            } else {
                format!("role-{}-{}", level - 1, slot)
            };
            store.upsert_role(
                Role::new(format!("role-{}-{}", level, slot), "bench")
                    .with_permissions([format!("level{}:slot{}", level, slot)])
                    .with_parents([parent]),
            );
        }
    }
}

fn bench_cold_resolution(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = MemoryRoleStore::new();
    seed_hierarchy(&store, 4, 8);
    let resolver = PermissionResolver::new();

    c.bench_function("resolver_cold_walk", |b| {
        b.iter(|| {
            rt.block_on(async {
                resolver
                    .resolve(&store, "bench", "role-7-0")
                    .await
                    .unwrap()
            })
        })
    });
}

fn bench_cached_check(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let roles = Arc::new(MemoryRoleStore::new());
    seed_hierarchy(&roles, 4, 8);
    roles.assign_roles("bench", "user-1", vec!["role-7-0".to_string()]);

    let service = PermissionService::new(
        Arc::clone(&roles) as Arc<dyn authgate_rs::core::traits::RoleStore>,
        Arc::new(MemoryFlagStore::new()),
        EngineConfig::default(),
    );

    // warm the cache once so the loop measures the hit path
    rt.block_on(async {
        service.has_permission("user-1", "bench", "base:read").await;
    });

    c.bench_function("service_cached_check", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.has_permission("user-1", "bench", "base:read").await
            })
        })
    });
}

criterion_group!(benches, bench_cold_resolution, bench_cached_check);
criterion_main!(benches);
