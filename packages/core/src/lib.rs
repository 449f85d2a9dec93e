//! PathGuard Core - Hierarchical Access-Control Engine
//!
//! This crate organizes arbitrary business entities (organizations,
//! departments, teams, projects, ...) into a tree addressed by materialized
//! paths and grants users role-scoped access to subtrees: access to a node
//! implies access to every descendant. It answers, at low latency and under
//! concurrent mutation, "can user U act on node N, and with which role?"
//!
//! # Architecture
//!
//! - **Materialized paths**: ancestry encoded as dot-separated sanitized
//!   labels, enabling prefix queries instead of recursive traversal
//! - **Store contract**: persistence sits behind the [`db::NodeStore`]
//!   trait; an in-memory reference backend ships in-crate
//! - **Inherited grants**: a grant on a node authorizes its whole subtree
//!   by path-prefix matching
//! - **Bounded TTL cache tier**: repeated access checks and node lookups are
//!   cheap, with precise invalidation on every mutation
//!
//! # Modules
//!
//! - [`paths`] - pure materialized-path utilities
//! - [`models`] - data structures (Node, AccessGrant, result shapes)
//! - [`db`] - store contract, in-memory backend, role collaborator
//! - [`services`] - NodeService, AccessService, BatchOperations, cache tier

pub mod db;
pub mod models;
pub mod paths;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
