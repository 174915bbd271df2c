//! RBAC domain operations over the relational store.
//!
//! - [`permissions`]: permission definitions
//! - [`roles`]: roles, soft-deleted via `is_deleted`
//! - [`assignments`]: role-permission grants addressed by permission key

pub mod assignments;
pub mod keys;
pub mod permissions;
pub mod roles;
