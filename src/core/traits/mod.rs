//! Core trait definitions

pub mod store;

pub use store::{FlagStore, RoleMutationHook, RoleStore};
