//! Batch Operations - Partial-Success Orchestration
//!
//! Multi-item grant/revoke/move/delete entry points built entirely on
//! `NodeService` and `AccessService`. Every batch is **best-effort**: items
//! are processed independently and one item's typed failure never blocks its
//! siblings - the caller gets a per-item result list.
//!
//! The single exception is `move_batch`'s target parent: without a valid
//! destination no per-item result is meaningful, so a missing parent fails
//! the whole call up front.

use crate::services::access_service::AccessService;
use crate::services::error::{ErrorKind, HierarchyError};
use crate::services::node_service::NodeService;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-item outcome of a batch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Grant created or re-granted; carries the grant id.
    Granted { grant_id: String },
    /// Grant removed; carries the revoked grant id.
    Revoked { grant_id: String },
    /// Node moved; carries its rewritten path.
    Moved { new_path: String },
    /// Node (and subtree) deleted; carries the removed-node count.
    Deleted { deleted_count: usize },
    /// Nothing to do (move target already the node's parent).
    Skipped,
    /// The item failed; siblings are unaffected.
    Error { kind: ErrorKind, message: String },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }

    fn error(err: HierarchyError) -> Self {
        Self::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// One entry of a batch result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub node_id: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// Orchestrates multi-item mutations with partial-success semantics.
pub struct BatchOperations {
    nodes: Arc<NodeService>,
    access: Arc<AccessService>,
}

impl BatchOperations {
    pub fn new(nodes: Arc<NodeService>, access: Arc<AccessService>) -> Self {
        Self { nodes, access }
    }

    /// Grant one role to one user on many nodes.
    pub async fn grant_batch(
        &self,
        user_id: &str,
        node_ids: &[String],
        role_id: &str,
    ) -> Vec<BatchItemResult> {
        let mut results = Vec::with_capacity(node_ids.len());
        for node_id in node_ids {
            let outcome = match self.access.grant_access(user_id, node_id, role_id).await {
                Ok(grant) => BatchOutcome::Granted { grant_id: grant.id },
                Err(err) => BatchOutcome::error(err),
            };
            results.push(BatchItemResult {
                node_id: node_id.clone(),
                outcome,
            });
        }
        results
    }

    /// Revoke a user's grants on many nodes. Each node's grant is looked up
    /// by the node's current path; a node without one reports
    /// `access_not_found` for that item only.
    pub async fn revoke_batch(&self, user_id: &str, node_ids: &[String]) -> Vec<BatchItemResult> {
        let mut results = Vec::with_capacity(node_ids.len());
        for node_id in node_ids {
            let outcome = match self.find_and_revoke(user_id, node_id).await {
                Ok(grant_id) => BatchOutcome::Revoked { grant_id },
                Err(err) => BatchOutcome::error(err),
            };
            results.push(BatchItemResult {
                node_id: node_id.clone(),
                outcome,
            });
        }
        results
    }

    /// Move many nodes under one parent.
    ///
    /// # Errors
    ///
    /// `ParentNotFound` fails the whole batch before any item runs. Per
    /// item: `Skipped` when the node already sits under the target,
    /// `would_create_cycle` when the target is the node itself or one of
    /// its descendants, otherwise the move runs and reports the new path.
    pub async fn move_batch(
        &self,
        node_ids: &[String],
        new_parent_id: &str,
    ) -> Result<Vec<BatchItemResult>, HierarchyError> {
        // No valid destination, no meaningful per-item results
        self.nodes
            .get_node(new_parent_id)
            .await?
            .ok_or_else(|| HierarchyError::parent_not_found(new_parent_id))?;

        let mut results = Vec::with_capacity(node_ids.len());
        for node_id in node_ids {
            let outcome = match self.move_one(node_id, new_parent_id).await {
                Ok(outcome) => outcome,
                Err(err) => BatchOutcome::error(err),
            };
            results.push(BatchItemResult {
                node_id: node_id.clone(),
                outcome,
            });
        }
        Ok(results)
    }

    /// Delete many nodes, each with subtree propagation.
    pub async fn delete_batch(&self, node_ids: &[String]) -> Vec<BatchItemResult> {
        let mut results = Vec::with_capacity(node_ids.len());
        for node_id in node_ids {
            let outcome = match self.nodes.delete_node(node_id, true).await {
                Ok(result) => BatchOutcome::Deleted {
                    deleted_count: result.deleted_count,
                },
                Err(err) => BatchOutcome::error(err),
            };
            results.push(BatchItemResult {
                node_id: node_id.clone(),
                outcome,
            });
        }
        results
    }

    /// Check a user's access to many nodes in a single pass: the target
    /// paths and the user's grant paths are each fetched once, then matched
    /// ancestor-or-equal in memory - no per-node grant query. An empty input
    /// returns an empty map without touching the store. Node ids that do not
    /// resolve map to `false`.
    pub async fn check_batch_access(
        &self,
        user_id: &str,
        node_ids: &[String],
    ) -> Result<HashMap<String, bool>, HierarchyError> {
        if node_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let targets = self.nodes.get_nodes(node_ids).await?;
        let path_by_id: HashMap<&str, &str> = targets
            .iter()
            .map(|n| (n.id.as_str(), n.path.as_str()))
            .collect();
        let grant_paths = self.access.user_access_paths(user_id).await?;

        let mut decisions = HashMap::with_capacity(node_ids.len());
        for node_id in node_ids {
            let allowed = match path_by_id.get(node_id.as_str()) {
                Some(path) => grant_paths
                    .iter()
                    .any(|g| g.as_str() == *path || crate::paths::is_ancestor(g, path)),
                None => false,
            };
            decisions.insert(node_id.clone(), allowed);
        }
        Ok(decisions)
    }

    async fn find_and_revoke(
        &self,
        user_id: &str,
        node_id: &str,
    ) -> Result<String, HierarchyError> {
        let node = self
            .nodes
            .get_node(node_id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;

        let grant = self
            .access
            .find_grant(user_id, &node.path)
            .await?
            .ok_or_else(|| HierarchyError::access_not_found(&node.path))?;

        self.access.revoke_access(&grant.id).await?;
        Ok(grant.id)
    }

    async fn move_one(
        &self,
        node_id: &str,
        new_parent_id: &str,
    ) -> Result<BatchOutcome, HierarchyError> {
        let node = self
            .nodes
            .get_node(node_id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;

        if node.parent_id.as_deref() == Some(new_parent_id) {
            return Ok(BatchOutcome::Skipped);
        }
        if node_id == new_parent_id {
            return Err(HierarchyError::would_create_cycle(node_id, new_parent_id));
        }

        let moved = self.nodes.move_node(node_id, new_parent_id).await?;
        Ok(BatchOutcome::Moved {
            new_path: moved.path,
        })
    }
}
