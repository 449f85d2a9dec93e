//! Data Models
//!
//! This module contains the core data structures used throughout PathGuard:
//!
//! - `Node` - a business entity placed in the hierarchy, addressed by its
//!   materialized path
//! - `AccessGrant` - a user/role grant anchored to a path snapshot
//! - Derived result shapes (`AccessCheckResult`, `AccessibleNode`, `NodePage`)
//!   returned to callers instead of raw store rows

mod access;
mod node;

pub use access::{
    AccessCheckResult, AccessGrant, AccessibleNode, Inheritance, ResolvedGrant, Role,
};
pub use node::{CreateNodeParams, DeleteResult, Node, NodePage, NodeSummary, NodeUpdate};
