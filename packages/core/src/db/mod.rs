//! Store Layer
//!
//! This module defines the engine's persistence boundary:
//!
//! - [`NodeStore`] - the contract a durable backend must satisfy (node and
//!   grant CRUD, prefix-descendant queries, atomic move/delete units)
//! - [`MemoryStore`] - the in-memory reference implementation used by tests
//!   and embedded deployments
//! - [`RoleResolver`] - the role collaborator contract (the engine only
//!   resolves a role id to a descriptor; role semantics live elsewhere)
//!
//! # Architecture
//!
//! The engine never talks to a database directly. Business logic in the
//! service layer is written against `Arc<dyn NodeStore>`, so a SQL or
//! document backend can be swapped in without touching the services. The
//! store is the single authority for uniqueness (node paths, grant
//! `(user_id, access_path)` pairs) and for transactional execution of
//! subtree rewrites.

mod error;
mod memory_store;
mod node_store;
mod roles;

pub use error::DatabaseError;
pub use memory_store::MemoryStore;
pub use node_store::NodeStore;
pub use roles::{RoleResolver, StaticRoleResolver};
