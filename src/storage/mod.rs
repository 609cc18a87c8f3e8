//! Storage implementations
//!
//! The engine reaches persistence through the `core::traits::store` traits;
//! this module provides the in-memory reference implementation used by tests
//! and embeddable by callers without a durable store.

pub mod memory;

pub use memory::{MemoryFlagStore, MemoryRoleStore};
