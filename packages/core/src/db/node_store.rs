//! NodeStore Trait - Store Abstraction Layer
//!
//! This module defines the `NodeStore` trait that abstracts persistence for
//! nodes and access grants. The trait is the engine's only view of durable
//! state: services never touch a backend directly, so SQL, document, or
//! in-memory backends can be swapped without changing business logic.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async to support both embedded and
//!    network backends
//! 2. **Ownership Semantics**: Write methods take ownership of values to
//!    avoid unnecessary cloning (caller clones if it needs the original)
//! 3. **Error Handling**: `anyhow::Result` for flexible error context;
//!    services translate into their typed error enum
//! 4. **Atomic Units**: subtree path rewrites ([`NodeStore::apply_move`]) and
//!    cascading deletes ([`NodeStore::delete_nodes`]) are single calls the
//!    backend must execute failure-atomically. A partially-moved subtree must
//!    never be observable.
//!
//! # Ordering Contract
//!
//! Every listing method that documents an order returns nodes sorted by
//! `path` ascending (lexicographic). Because a parent's path is a strict
//! prefix of its children's paths, ascending path order always yields parents
//! before children.

use crate::models::{AccessGrant, Node};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for node and grant persistence.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; services hold the store behind an
/// `Arc<dyn NodeStore>` and call it from many tasks concurrently. Overlapping
/// writers are serialized by the backend's own transaction machinery; the
/// engine adds no distributed lock of its own.
#[async_trait]
pub trait NodeStore: Send + Sync {
    //
    // NODE CRUD
    //

    /// Persist a new node.
    ///
    /// # Errors
    ///
    /// Fails when a node with the same id or path already exists.
    async fn create_node(&self, node: Node) -> Result<Node>;

    /// Get a node by id. `Ok(None)` when absent (not an error).
    async fn get_node(&self, id: &str) -> Result<Option<Node>>;

    /// Get a node by its materialized path. `Ok(None)` when absent.
    async fn get_node_by_path(&self, path: &str) -> Result<Option<Node>>;

    /// Fetch many nodes by id in one round trip, ordered by path. Ids that
    /// do not resolve are simply absent from the result (not an error).
    async fn get_nodes(&self, ids: &[String]) -> Result<Vec<Node>>;

    /// Replace a stored node with the given value (matched by `node.id`).
    ///
    /// # Errors
    ///
    /// Fails when no node with that id exists, or the new path collides with
    /// another node's path.
    async fn update_node(&self, node: Node) -> Result<Node>;

    //
    // LISTING & SEARCH
    //

    /// All root nodes (`parent_id == None`), ordered by path.
    async fn get_root_nodes(&self) -> Result<Vec<Node>>;

    /// Direct children of a node, ordered by path.
    async fn get_children(&self, parent_id: &str) -> Result<Vec<Node>>;

    /// Every node, ordered by path (parents before children).
    async fn get_all_nodes(&self) -> Result<Vec<Node>>;

    /// One page of nodes in path order. `offset` is a node count, not a page
    /// number; the service layer does the page arithmetic.
    async fn get_nodes_page(&self, offset: usize, limit: usize) -> Result<Vec<Node>>;

    /// Nodes whose name contains `term` (case-insensitive), ordered by path,
    /// at most `limit` results.
    async fn search_nodes(&self, term: &str, limit: usize) -> Result<Vec<Node>>;

    /// Total node count (pagination totals).
    async fn count_nodes(&self) -> Result<usize>;

    /// Prefix-descendant query: every node whose path is a **strict**
    /// descendant of `path`, ordered ascending by path.
    async fn get_descendants(&self, path: &str) -> Result<Vec<Node>>;

    //
    // ATOMIC STRUCTURAL UNITS
    //

    /// Reparent `node_id` under `new_parent_id` and apply every
    /// `(id, new_path)` rewrite in `path_updates` as one failure-atomic unit.
    ///
    /// `path_updates` must include the moved node's own new path; the backend
    /// applies all of them or none. Returns the moved node as stored.
    async fn apply_move(
        &self,
        node_id: &str,
        new_parent_id: &str,
        path_updates: Vec<(String, String)>,
    ) -> Result<Node>;

    /// Delete all listed nodes in the given order, atomically.
    ///
    /// Callers pass ids deepest-first so that backends with referential
    /// constraints on `parent_id` never see a dangling child.
    async fn delete_nodes(&self, ids: &[String]) -> Result<usize>;

    //
    // ACCESS GRANTS
    //

    /// Persist a new grant.
    ///
    /// # Errors
    ///
    /// Fails when a grant for the same `(user_id, access_path)` pair exists.
    async fn create_grant(&self, grant: AccessGrant) -> Result<AccessGrant>;

    /// Get a grant by id. `Ok(None)` when absent.
    async fn get_grant(&self, id: &str) -> Result<Option<AccessGrant>>;

    /// Find the unique grant for a `(user_id, access_path)` pair, if any.
    async fn find_grant(&self, user_id: &str, access_path: &str) -> Result<Option<AccessGrant>>;

    /// All grants belonging to a user.
    async fn get_grants_for_user(&self, user_id: &str) -> Result<Vec<AccessGrant>>;

    /// All grants whose `access_path` equals the given path.
    async fn get_grants_for_path(&self, access_path: &str) -> Result<Vec<AccessGrant>>;

    /// Replace a stored grant (matched by `grant.id`). Used for the
    /// duplicate-grant role update.
    async fn update_grant(&self, grant: AccessGrant) -> Result<AccessGrant>;

    /// Delete a grant by id. Returns `true` when a grant was removed.
    async fn delete_grant(&self, id: &str) -> Result<bool>;
}
