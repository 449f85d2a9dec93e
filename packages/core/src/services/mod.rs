//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `NodeService` - tree CRUD, structural mutation, cache invalidation
//! - `AccessService` - grant lifecycle and authorization resolution
//! - `BatchOperations` - multi-item mutations with partial-success semantics
//! - `NodeCache` / `AccessCache` - the bounded TTL cache tier
//!
//! Services coordinate between the store layer and callers, enforcing tree
//! invariants and keeping the cache tier consistent with every mutation.

pub mod access_service;
pub mod batch_operations;
pub mod cache;
pub mod error;
pub mod node_service;

pub use access_service::AccessService;
pub use batch_operations::{BatchItemResult, BatchOperations, BatchOutcome};
pub use cache::{AccessCache, CacheConfig, NodeCache, TtlCache};
pub use error::{ErrorKind, HierarchyError};
pub use node_service::NodeService;

#[cfg(test)]
mod node_service_test;
