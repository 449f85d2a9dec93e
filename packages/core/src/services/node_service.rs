//! Node Service - Tree CRUD and Structural Mutation
//!
//! This module provides the main business logic layer for hierarchy
//! operations:
//!
//! - CRUD operations (create, read, update, delete)
//! - Structural mutation (move with cascading path rewrites, cascading
//!   delete)
//! - Listing, pagination, and search
//!
//! # Tree Invariants
//!
//! The service is the sole writer of node paths and is responsible for
//! keeping them consistent:
//!
//! - A node's path is its parent's path plus one sanitized label
//! - The tree is acyclic; a move that would put a node under its own
//!   descendant is rejected before anything is written
//! - Path rewrites for a whole subtree go through a single atomic store call
//!   ([`NodeStore::apply_move`]); a partially-moved subtree is never
//!   observable
//!
//! # Cache Discipline
//!
//! Reads go through the node cache (`get_or_compute`: check, compute outside
//! the lock on a miss, insert). Every write invalidates the affected entries
//! before returning - node-by-id, node-by-path, the touched children lists,
//! and the access-decision entries for every rewritten path.

use crate::db::NodeStore;
use crate::models::{CreateNodeParams, DeleteResult, Node, NodePage, NodeUpdate};
use crate::paths;
use crate::services::cache::{AccessCache, NodeCache};
use crate::services::error::HierarchyError;
use std::sync::Arc;

/// Business logic layer for tree operations.
pub struct NodeService {
    store: Arc<dyn NodeStore>,
    node_cache: Arc<NodeCache>,
    access_cache: Arc<AccessCache>,
}

/// Reject blank display names and type tags before they reach the store.
fn validate_text_field(value: &str, field: &str) -> Result<(), HierarchyError> {
    if value.trim().is_empty() {
        return Err(HierarchyError::validation(format!(
            "{} must not be blank",
            field
        )));
    }
    Ok(())
}

impl NodeService {
    /// Create a node service over a store and the shared cache tier.
    ///
    /// The access cache is shared with the access service so structural
    /// mutations can drop stale access decisions for rewritten paths.
    pub fn new(
        store: Arc<dyn NodeStore>,
        node_cache: Arc<NodeCache>,
        access_cache: Arc<AccessCache>,
    ) -> Self {
        Self {
            store,
            node_cache,
            access_cache,
        }
    }

    /// Create a node, deriving its path from the parent (or from the
    /// sanitized name alone for roots).
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank `name` or `node_type`, or when the derived
    ///   path collides with an existing node
    /// - `ParentNotFound` when `params.parent_id` does not resolve
    pub async fn create_node(&self, params: CreateNodeParams) -> Result<Node, HierarchyError> {
        validate_text_field(&params.name, "name")?;
        validate_text_field(&params.node_type, "node_type")?;

        let parent = match &params.parent_id {
            Some(parent_id) => Some(
                self.get_node(parent_id)
                    .await?
                    .ok_or_else(|| HierarchyError::parent_not_found(parent_id))?,
            ),
            None => None,
        };
        let parent_path = parent.as_ref().map(|p| p.path.as_str()).unwrap_or("");

        let node = Node::new(
            params.name,
            params.node_type,
            params.parent_id.clone(),
            parent_path,
            params.metadata,
        );

        let created = self
            .store
            .create_node(node)
            .await
            .map_err(map_duplicate_path)?;

        // A new child makes the parent's cached children list stale
        self.node_cache
            .invalidate_children(params.parent_id.as_deref())
            .await;

        tracing::debug!(id = %created.id, path = %created.path, "created node");
        Ok(created)
    }

    /// Get a node by id. `Ok(None)` when absent - never an error.
    pub async fn get_node(&self, id: &str) -> Result<Option<Node>, HierarchyError> {
        if let Some(node) = self.node_cache.get_by_id(id).await {
            return Ok(Some(node));
        }
        let node = self.store.get_node(id).await?;
        if let Some(node) = &node {
            self.node_cache.put_node(node).await;
        }
        Ok(node)
    }

    /// Get a node by its materialized path. `Ok(None)` when absent.
    pub async fn get_node_by_path(&self, path: &str) -> Result<Option<Node>, HierarchyError> {
        if let Some(node) = self.node_cache.get_by_path(path).await {
            return Ok(Some(node));
        }
        let node = self.store.get_node_by_path(path).await?;
        if let Some(node) = &node {
            self.node_cache.put_node(node).await;
        }
        Ok(node)
    }

    /// Resolve many ids in one store round trip, ordered by path. Ids that
    /// do not resolve are absent from the result. Resolved nodes are cached.
    pub async fn get_nodes(&self, ids: &[String]) -> Result<Vec<Node>, HierarchyError> {
        let nodes = self.store.get_nodes(ids).await?;
        for node in &nodes {
            self.node_cache.put_node(node).await;
        }
        Ok(nodes)
    }

    /// All root nodes, ordered by path. Cached.
    pub async fn get_root_nodes(&self) -> Result<Vec<Node>, HierarchyError> {
        if let Some(roots) = self.node_cache.get_roots().await {
            return Ok(roots);
        }
        let roots = self.store.get_root_nodes().await?;
        self.node_cache.put_roots(roots.clone()).await;
        Ok(roots)
    }

    /// Direct children of a node, ordered by path. Cached.
    pub async fn get_children(&self, parent_id: &str) -> Result<Vec<Node>, HierarchyError> {
        if let Some(children) = self.node_cache.get_children(parent_id).await {
            return Ok(children);
        }
        let children = self.store.get_children(parent_id).await?;
        self.node_cache
            .put_children(parent_id, children.clone())
            .await;
        Ok(children)
    }

    /// Every node ordered by path. Uncached (unbounded result set).
    pub async fn get_all_nodes(&self) -> Result<Vec<Node>, HierarchyError> {
        Ok(self.store.get_all_nodes().await?)
    }

    /// One page of nodes in path order. `page` is 1-based; values below 1
    /// are treated as 1. Uncached.
    pub async fn get_nodes_page(
        &self,
        page: usize,
        per_page: usize,
    ) -> Result<NodePage, HierarchyError> {
        let page = page.max(1);
        let offset = (page - 1) * per_page;
        let nodes = self.store.get_nodes_page(offset, per_page).await?;
        let total = self.store.count_nodes().await?;
        Ok(NodePage {
            nodes,
            page,
            per_page,
            total,
        })
    }

    /// Nodes whose name contains `term` (case-insensitive), at most `limit`.
    /// Uncached (variable result set).
    pub async fn search_nodes(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<Node>, HierarchyError> {
        Ok(self.store.search_nodes(term, limit).await?)
    }

    /// Every strict descendant of a node, ordered by path ascending
    /// (parents before children).
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when the id does not resolve.
    pub async fn get_descendants(&self, id: &str) -> Result<Vec<Node>, HierarchyError> {
        let node = self
            .get_node(id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(id))?;
        Ok(self.store.get_descendants(&node.path).await?)
    }

    /// Update a node's name, type tag, or metadata.
    ///
    /// The path and parent never change here; renames intentionally do not
    /// rewrite the path label (moves are the only path writers).
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when absent; `Validation` for blank name/node_type.
    pub async fn update_node(
        &self,
        id: &str,
        update: NodeUpdate,
    ) -> Result<Node, HierarchyError> {
        let mut node = self
            .get_node(id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(id))?;

        if let Some(name) = update.name {
            validate_text_field(&name, "name")?;
            node.name = name;
        }
        if let Some(node_type) = update.node_type {
            validate_text_field(&node_type, "node_type")?;
            node.node_type = node_type;
        }
        if let Some(metadata) = update.metadata {
            node.metadata = metadata;
        }
        node.modified_at = chrono::Utc::now();

        let updated = self.store.update_node(node).await?;

        self.node_cache
            .invalidate_node(&updated.id, &updated.path)
            .await;
        self.node_cache
            .invalidate_children(updated.parent_id.as_deref())
            .await;
        // Cached access decisions embed the node's summary (name included)
        self.access_cache.invalidate_path(&updated.path).await;

        Ok(updated)
    }

    /// Move a node (and its whole subtree) under a new parent.
    ///
    /// The state machine, in order:
    ///
    /// 1. `NodeNotFound` / `ParentNotFound` when either id is absent
    /// 2. `CannotBeOwnParent` when the ids are equal
    /// 3. Descendants are computed before any mutation
    /// 4. `WouldCreateCycle` when the new parent sits inside the subtree
    /// 5. Idempotent no-op when the node is already under that parent
    /// 6. The node's new path and every descendant's rewrite (old prefix
    ///    replaced, suffix preserved byte-for-byte) are applied in one
    ///    failure-atomic store call
    /// 7. Cache entries for the node, every descendant, and both parents'
    ///    children lists are invalidated, as are the access decisions for
    ///    every old and new path
    pub async fn move_node(
        &self,
        node_id: &str,
        new_parent_id: &str,
    ) -> Result<Node, HierarchyError> {
        let node = self
            .get_node(node_id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;

        if node_id == new_parent_id {
            return Err(HierarchyError::cannot_be_own_parent(node_id));
        }

        let new_parent = self
            .get_node(new_parent_id)
            .await?
            .ok_or_else(|| HierarchyError::parent_not_found(new_parent_id))?;

        // Cycle safety: the tree is acyclic before the move, so a cycle can
        // only appear if the target parent is already inside the moved
        // subtree. Membership in the pre-computed descendant set is the
        // entire check.
        let descendants = self.store.get_descendants(&node.path).await?;
        if descendants.iter().any(|d| d.id == new_parent_id) {
            return Err(HierarchyError::would_create_cycle(node_id, new_parent_id));
        }

        if node.parent_id.as_deref() == Some(new_parent_id) {
            return Ok(node);
        }

        let old_path = node.path.clone();
        let new_path = paths::build_child_path(&new_parent.path, &node.name);

        let mut path_updates = Vec::with_capacity(descendants.len() + 1);
        path_updates.push((node.id.clone(), new_path.clone()));
        for descendant in &descendants {
            // Replace the old subtree prefix, keeping the tail untouched
            let suffix = &descendant.path[old_path.len()..];
            path_updates.push((descendant.id.clone(), format!("{}{}", new_path, suffix)));
        }

        let moved = self
            .store
            .apply_move(node_id, new_parent_id, path_updates.clone())
            .await
            .map_err(map_duplicate_path)?;

        self.invalidate_after_rewrite(&node, &descendants, &path_updates)
            .await;
        self.node_cache
            .invalidate_children(node.parent_id.as_deref())
            .await;
        self.node_cache.invalidate_children(Some(new_parent_id)).await;

        tracing::info!(
            id = %node_id,
            from = %old_path,
            to = %moved.path,
            descendants = descendants.len(),
            "moved subtree"
        );
        Ok(moved)
    }

    /// Delete a node, cascading to its subtree when `propagate` is true.
    ///
    /// Descendants are removed deepest-first (path descending) so backends
    /// with referential constraints never see a dangling child. Returns the
    /// number of nodes removed.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when absent; `HasChildren` when `propagate` is false
    /// and the node has descendants.
    pub async fn delete_node(
        &self,
        id: &str,
        propagate: bool,
    ) -> Result<DeleteResult, HierarchyError> {
        let node = self
            .get_node(id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(id))?;

        let mut descendants = self.store.get_descendants(&node.path).await?;
        if !propagate && !descendants.is_empty() {
            return Err(HierarchyError::has_children(id));
        }

        // Deepest first
        descendants.sort_by(|a, b| b.path.cmp(&a.path));
        let mut ids: Vec<String> = descendants.iter().map(|d| d.id.clone()).collect();
        ids.push(node.id.clone());

        let deleted_count = self.store.delete_nodes(&ids).await?;

        for gone in descendants.iter().chain(std::iter::once(&node)) {
            self.node_cache.invalidate_node(&gone.id, &gone.path).await;
            self.node_cache.invalidate_children(Some(&gone.id)).await;
            self.access_cache.invalidate_path(&gone.path).await;
        }
        self.node_cache
            .invalidate_children(node.parent_id.as_deref())
            .await;

        tracing::info!(id = %id, path = %node.path, deleted_count, "deleted subtree");
        Ok(DeleteResult { deleted_count })
    }

    /// Create several nodes in order, short-circuiting on the first failure.
    ///
    /// Entries may reference parents created earlier in the same batch. This
    /// is deliberately NOT partial-success: the first error is returned and
    /// later entries are not attempted (partial-success batches live in
    /// `BatchOperations`).
    pub async fn batch_create(
        &self,
        entries: Vec<CreateNodeParams>,
    ) -> Result<Vec<Node>, HierarchyError> {
        let mut created = Vec::with_capacity(entries.len());
        for params in entries {
            created.push(self.create_node(params).await?);
        }
        Ok(created)
    }

    /// Drop node-cache and access-decision entries for a rewritten subtree:
    /// old and new paths for the head node and every descendant.
    async fn invalidate_after_rewrite(
        &self,
        node: &Node,
        descendants: &[Node],
        path_updates: &[(String, String)],
    ) {
        for old in descendants.iter().chain(std::iter::once(node)) {
            self.node_cache.invalidate_node(&old.id, &old.path).await;
            self.node_cache.invalidate_children(Some(&old.id)).await;
            self.access_cache.invalidate_path(&old.path).await;
        }
        for (id, new_path) in path_updates {
            self.node_cache.invalidate_node(id, new_path).await;
            self.access_cache.invalidate_path(new_path).await;
        }
    }
}

/// Store-level duplicate path constraint surfaces as a validation error:
/// the caller picked a name that sanitizes onto an existing sibling label.
fn map_duplicate_path(err: anyhow::Error) -> HierarchyError {
    match err.downcast_ref::<crate::db::DatabaseError>() {
        Some(crate::db::DatabaseError::DuplicatePath { path }) => HierarchyError::validation(
            format!("a node with path '{}' already exists", path),
        ),
        _ => HierarchyError::Store(err),
    }
}
