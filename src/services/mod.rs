//! Services module
//!
//! This module contains the orchestration layer over the core engine.

pub mod permission;

pub use permission::PermissionService;
