//! In-Memory Store
//!
//! Reference implementation of [`NodeStore`] over `tokio::sync::RwLock` maps.
//! Used by the test suite and embeddable as-is for single-process
//! deployments. Enforces the same uniqueness constraints a durable backend
//! must provide: global node-path uniqueness and one grant per
//! `(user_id, access_path)` pair.
//!
//! All mutating methods take the write lock for their whole body, which makes
//! each call a serialized, failure-atomic unit - the closest in-memory
//! analogue to the transactional contract of `NodeStore`.

use crate::db::error::DatabaseError;
use crate::db::node_store::NodeStore;
use crate::models::{AccessGrant, Node};
use crate::paths;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct StoreState {
    /// node id -> node
    nodes: HashMap<String, Node>,
    /// grant id -> grant
    grants: HashMap<String, AccessGrant>,
}

impl StoreState {
    fn path_taken(&self, path: &str, excluding_id: Option<&str>) -> bool {
        self.nodes
            .values()
            .any(|n| n.path == path && Some(n.id.as_str()) != excluding_id)
    }
}

/// In-memory `NodeStore` backend.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_by_path(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| a.path.cmp(&b.path));
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn create_node(&self, node: Node) -> Result<Node> {
        let mut state = self.state.write().await;
        if state.nodes.contains_key(&node.id) {
            return Err(DatabaseError::duplicate_path(&node.path).into());
        }
        if state.path_taken(&node.path, None) {
            return Err(DatabaseError::duplicate_path(&node.path).into());
        }
        state.nodes.insert(node.id.clone(), node.clone());
        Ok(node)
    }

    async fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let state = self.state.read().await;
        Ok(state.nodes.get(id).cloned())
    }

    async fn get_node_by_path(&self, path: &str) -> Result<Option<Node>> {
        let state = self.state.read().await;
        Ok(state.nodes.values().find(|n| n.path == path).cloned())
    }

    async fn get_nodes(&self, ids: &[String]) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let mut nodes: Vec<Node> = ids
            .iter()
            .filter_map(|id| state.nodes.get(id).cloned())
            .collect();
        sort_by_path(&mut nodes);
        Ok(nodes)
    }

    async fn update_node(&self, node: Node) -> Result<Node> {
        let mut state = self.state.write().await;
        if !state.nodes.contains_key(&node.id) {
            return Err(DatabaseError::record_not_found(&node.id).into());
        }
        if state.path_taken(&node.path, Some(&node.id)) {
            return Err(DatabaseError::duplicate_path(&node.path).into());
        }
        state.nodes.insert(node.id.clone(), node.clone());
        Ok(node)
    }

    async fn get_root_nodes(&self) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let mut roots: Vec<Node> = state
            .nodes
            .values()
            .filter(|n| n.parent_id.is_none())
            .cloned()
            .collect();
        sort_by_path(&mut roots);
        Ok(roots)
    }

    async fn get_children(&self, parent_id: &str) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let mut children: Vec<Node> = state
            .nodes
            .values()
            .filter(|n| n.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect();
        sort_by_path(&mut children);
        Ok(children)
    }

    async fn get_all_nodes(&self) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let mut nodes: Vec<Node> = state.nodes.values().cloned().collect();
        sort_by_path(&mut nodes);
        Ok(nodes)
    }

    async fn get_nodes_page(&self, offset: usize, limit: usize) -> Result<Vec<Node>> {
        let nodes = self.get_all_nodes().await?;
        Ok(nodes.into_iter().skip(offset).take(limit).collect())
    }

    async fn search_nodes(&self, term: &str, limit: usize) -> Result<Vec<Node>> {
        let needle = term.to_lowercase();
        let state = self.state.read().await;
        let mut hits: Vec<Node> = state
            .nodes
            .values()
            .filter(|n| n.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        sort_by_path(&mut hits);
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count_nodes(&self) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state.nodes.len())
    }

    async fn get_descendants(&self, path: &str) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let mut descendants: Vec<Node> = state
            .nodes
            .values()
            .filter(|n| paths::is_ancestor(path, &n.path))
            .cloned()
            .collect();
        sort_by_path(&mut descendants);
        Ok(descendants)
    }

    async fn apply_move(
        &self,
        node_id: &str,
        new_parent_id: &str,
        path_updates: Vec<(String, String)>,
    ) -> Result<Node> {
        let mut state = self.state.write().await;

        // Validate the whole unit before touching anything, so a failure
        // leaves the tree exactly as it was.
        if !state.nodes.contains_key(node_id) {
            return Err(DatabaseError::record_not_found(node_id).into());
        }
        if !state.nodes.contains_key(new_parent_id) {
            return Err(DatabaseError::record_not_found(new_parent_id).into());
        }
        let moving: Vec<&String> = path_updates.iter().map(|(id, _)| id).collect();
        for (id, new_path) in &path_updates {
            if !state.nodes.contains_key(id) {
                return Err(DatabaseError::transaction_failed(format!(
                    "move references missing node {}",
                    id
                ))
                .into());
            }
            let collision = state
                .nodes
                .values()
                .any(|n| n.path == *new_path && !moving.contains(&&n.id));
            if collision {
                return Err(DatabaseError::duplicate_path(new_path).into());
            }
        }

        let now = chrono::Utc::now();
        for (id, new_path) in &path_updates {
            if let Some(node) = state.nodes.get_mut(id) {
                node.path = new_path.clone();
                node.modified_at = now;
            }
        }
        let moved = state
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| DatabaseError::record_not_found(node_id))?;
        moved.parent_id = Some(new_parent_id.to_string());
        moved.modified_at = now;
        Ok(moved.clone())
    }

    async fn delete_nodes(&self, ids: &[String]) -> Result<usize> {
        let mut state = self.state.write().await;
        let mut removed = 0;
        for id in ids {
            if state.nodes.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn create_grant(&self, grant: AccessGrant) -> Result<AccessGrant> {
        let mut state = self.state.write().await;
        let duplicate = state
            .grants
            .values()
            .any(|g| g.user_id == grant.user_id && g.access_path == grant.access_path);
        if duplicate {
            return Err(
                DatabaseError::duplicate_grant(&grant.user_id, &grant.access_path).into(),
            );
        }
        state.grants.insert(grant.id.clone(), grant.clone());
        Ok(grant)
    }

    async fn get_grant(&self, id: &str) -> Result<Option<AccessGrant>> {
        let state = self.state.read().await;
        Ok(state.grants.get(id).cloned())
    }

    async fn find_grant(&self, user_id: &str, access_path: &str) -> Result<Option<AccessGrant>> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .values()
            .find(|g| g.user_id == user_id && g.access_path == access_path)
            .cloned())
    }

    async fn get_grants_for_user(&self, user_id: &str) -> Result<Vec<AccessGrant>> {
        let state = self.state.read().await;
        let mut grants: Vec<AccessGrant> = state
            .grants
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        grants.sort_by(|a, b| a.access_path.cmp(&b.access_path));
        Ok(grants)
    }

    async fn get_grants_for_path(&self, access_path: &str) -> Result<Vec<AccessGrant>> {
        let state = self.state.read().await;
        let mut grants: Vec<AccessGrant> = state
            .grants
            .values()
            .filter(|g| g.access_path == access_path)
            .cloned()
            .collect();
        grants.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(grants)
    }

    async fn update_grant(&self, grant: AccessGrant) -> Result<AccessGrant> {
        let mut state = self.state.write().await;
        if !state.grants.contains_key(&grant.id) {
            return Err(DatabaseError::record_not_found(&grant.id).into());
        }
        state.grants.insert(grant.id.clone(), grant.clone());
        Ok(grant)
    }

    async fn delete_grant(&self, id: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.grants.remove(id).is_some())
    }
}
