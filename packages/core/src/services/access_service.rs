//! Access Service - Grant Lifecycle and Authorization Resolution
//!
//! This module owns access grants and answers "can user U act on node N, and
//! with which role?". A grant anchors a role to a path snapshot and, by
//! prefix matching, to every strict descendant of that path - access to a
//! node implies access to its whole subtree.
//!
//! # Resolution Algorithm
//!
//! `check_access_by_path` is the core:
//!
//! 1. Resolve the node at the path; no node means a cached negative result
//!    (not an error - "no access" and "lookup failed" are never conflated)
//! 2. Fetch the user's grants and scan for one whose `access_path` equals or
//!    is an ancestor of the checked path
//! 3. When several grants match, the most specific one (longest
//!    `access_path`) wins
//! 4. The full result - positive or negative, with the resolved role and
//!    whether access was `Direct` or `Inherited` - is cached per
//!    `(user, path)` with a TTL
//!
//! # Staleness Window
//!
//! Structural mutations invalidate the decision entries for every rewritten
//! path, but the per-user accessible-node lists cannot be targeted when the
//! affected users are unknown (a subtree rename does not say who held grants
//! above it). Those lists age out within the cache TTL.

use crate::db::{NodeStore, RoleResolver};
use crate::models::{
    AccessCheckResult, AccessGrant, AccessibleNode, Inheritance, ResolvedGrant,
};
use crate::paths;
use crate::services::cache::AccessCache;
use crate::services::error::HierarchyError;
use crate::services::node_service::NodeService;
use std::collections::HashMap;
use std::sync::Arc;

/// Business logic layer for grants and access checks.
pub struct AccessService {
    store: Arc<dyn NodeStore>,
    nodes: Arc<NodeService>,
    roles: Arc<dyn RoleResolver>,
    cache: Arc<AccessCache>,
}

impl AccessService {
    pub fn new(
        store: Arc<dyn NodeStore>,
        nodes: Arc<NodeService>,
        roles: Arc<dyn RoleResolver>,
        cache: Arc<AccessCache>,
    ) -> Self {
        Self {
            store,
            nodes,
            roles,
            cache,
        }
    }

    /// Grant a role to a user on a node's subtree.
    ///
    /// The grant snapshots the node's current path. Granting again for the
    /// same `(user, path)` pair updates the existing grant's role in place
    /// rather than rejecting - re-granting is how callers change a role.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when the node id does not resolve.
    pub async fn grant_access(
        &self,
        user_id: &str,
        node_id: &str,
        role_id: &str,
    ) -> Result<AccessGrant, HierarchyError> {
        let node = self
            .nodes
            .get_node(node_id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;

        let grant = match self.store.find_grant(user_id, &node.path).await? {
            Some(mut existing) => {
                existing.role_id = role_id.to_string();
                let updated = self.store.update_grant(existing).await?;
                tracing::debug!(
                    user = %user_id,
                    path = %node.path,
                    role = %role_id,
                    "updated role on existing grant"
                );
                updated
            }
            None => {
                let created = self
                    .store
                    .create_grant(AccessGrant::new(
                        user_id.to_string(),
                        role_id.to_string(),
                        node.path.clone(),
                    ))
                    .await?;
                tracing::debug!(user = %user_id, path = %node.path, role = %role_id, "granted access");
                created
            }
        };

        self.cache.invalidate_user(user_id).await;
        self.cache.invalidate_path(&node.path).await;
        Ok(grant)
    }

    /// Revoke a grant by id.
    ///
    /// # Errors
    ///
    /// `AccessNotFound` when no grant with that id exists.
    pub async fn revoke_access(&self, grant_id: &str) -> Result<AccessGrant, HierarchyError> {
        let grant = self
            .store
            .get_grant(grant_id)
            .await?
            .ok_or_else(|| HierarchyError::access_not_found(grant_id))?;

        self.store.delete_grant(grant_id).await?;
        self.cache.invalidate_user(&grant.user_id).await;

        tracing::debug!(user = %grant.user_id, path = %grant.access_path, "revoked access");
        Ok(grant)
    }

    /// All grants belonging to a user, each joined with its resolved role.
    pub async fn list_user_access(
        &self,
        user_id: &str,
    ) -> Result<Vec<ResolvedGrant>, HierarchyError> {
        let grants = self.store.get_grants_for_user(user_id).await?;
        self.resolve_grants(grants).await
    }

    /// All grants anchored at a node's current path, each joined with its
    /// resolved role.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when the node id does not resolve.
    pub async fn list_node_access(
        &self,
        node_id: &str,
    ) -> Result<Vec<ResolvedGrant>, HierarchyError> {
        let node = self
            .nodes
            .get_node(node_id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;
        let grants = self.store.get_grants_for_path(&node.path).await?;
        self.resolve_grants(grants).await
    }

    /// Every node a user can reach through any grant, tagged with the role
    /// of the most specific grant that authorizes it, de-duplicated by node
    /// id and ordered by path. Cached per user with a TTL.
    pub async fn list_accessible_nodes(
        &self,
        user_id: &str,
    ) -> Result<Vec<AccessibleNode>, HierarchyError> {
        if let Some(cached) = self.cache.get_accessible(user_id).await {
            return Ok(cached);
        }

        let mut grants = self.store.get_grants_for_user(user_id).await?;
        // Most specific grant first, so the first insertion per node id wins
        grants.sort_by(|a, b| b.access_path.len().cmp(&a.access_path.len()));

        let mut by_id: HashMap<String, AccessibleNode> = HashMap::new();
        for grant in &grants {
            if let Some(node) = self.nodes.get_node_by_path(&grant.access_path).await? {
                by_id.entry(node.id.clone()).or_insert(AccessibleNode {
                    node: node.summary(),
                    role_id: grant.role_id.clone(),
                });
            }
            for descendant in self.store.get_descendants(&grant.access_path).await? {
                by_id
                    .entry(descendant.id.clone())
                    .or_insert(AccessibleNode {
                        node: descendant.summary(),
                        role_id: grant.role_id.clone(),
                    });
            }
        }

        let mut accessible: Vec<AccessibleNode> = by_id.into_values().collect();
        accessible.sort_by(|a, b| a.node.path.cmp(&b.node.path));

        self.cache.put_accessible(user_id, accessible.clone()).await;
        Ok(accessible)
    }

    /// Check whether a user can act on a node, resolved by id.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when the node id does not resolve. A missing *grant*
    /// is a successful negative result, not an error.
    pub async fn check_access(
        &self,
        user_id: &str,
        node_id: &str,
    ) -> Result<AccessCheckResult, HierarchyError> {
        let node = self
            .nodes
            .get_node(node_id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;
        self.check_access_by_path(user_id, &node.path).await
    }

    /// The authorization algorithm itself (see module docs). A path that
    /// resolves to no node yields a negative result, not an error.
    pub async fn check_access_by_path(
        &self,
        user_id: &str,
        path: &str,
    ) -> Result<AccessCheckResult, HierarchyError> {
        if let Some(cached) = self.cache.get_decision(user_id, path).await {
            return Ok(cached);
        }

        let Some(node) = self.nodes.get_node_by_path(path).await? else {
            let result = AccessCheckResult::denied(None);
            self.cache.put_decision(user_id, path, result.clone()).await;
            return Ok(result);
        };

        let grants = self.store.get_grants_for_user(user_id).await?;
        let best = grants
            .iter()
            .filter(|g| g.access_path == path || paths::is_ancestor(&g.access_path, path))
            .max_by_key(|g| g.access_path.len());

        let result = match best {
            Some(grant) => {
                let role = self.roles.resolve_role(&grant.role_id).await?;
                let inheritance = if grant.access_path == path {
                    Inheritance::Direct
                } else {
                    Inheritance::Inherited
                };
                // A grant whose role no longer resolves still authorizes;
                // the role descriptor is simply absent from the result.
                AccessCheckResult {
                    has_access: true,
                    node: Some(node.summary()),
                    role,
                    inheritance: Some(inheritance),
                }
            }
            None => AccessCheckResult::denied(Some(node.summary())),
        };

        self.cache.put_decision(user_id, path, result.clone()).await;
        Ok(result)
    }

    /// Drop every cached decision and the accessible-node list for a user.
    /// Entry point for callers performing structural changes on the user's
    /// grants outside this service.
    pub async fn invalidate_user_access_cache(&self, user_id: &str) {
        self.cache.invalidate_user(user_id).await;
    }

    /// Drop every user's cached decision for a node's current path. The
    /// per-user accessible lists cannot be targeted from a node id alone and
    /// age out within the TTL.
    pub async fn invalidate_node_access_cache(&self, node_id: &str) -> Result<(), HierarchyError> {
        if let Some(node) = self.nodes.get_node(node_id).await? {
            self.cache.invalidate_path(&node.path).await;
        }
        Ok(())
    }

    /// The unique grant for a `(user, path)` pair, if any. Used by batch
    /// revocation to map a node id back to its grant.
    pub async fn find_grant(
        &self,
        user_id: &str,
        access_path: &str,
    ) -> Result<Option<AccessGrant>, HierarchyError> {
        Ok(self.store.find_grant(user_id, access_path).await?)
    }

    /// Just the access paths of a user's grants, for in-memory matching -
    /// no role resolution, no node fetches.
    pub async fn user_access_paths(&self, user_id: &str) -> Result<Vec<String>, HierarchyError> {
        let grants = self.store.get_grants_for_user(user_id).await?;
        Ok(grants.into_iter().map(|g| g.access_path).collect())
    }

    async fn resolve_grants(
        &self,
        grants: Vec<AccessGrant>,
    ) -> Result<Vec<ResolvedGrant>, HierarchyError> {
        let mut resolved = Vec::with_capacity(grants.len());
        for grant in grants {
            let role = self.roles.resolve_role(&grant.role_id).await?;
            resolved.push(ResolvedGrant { grant, role });
        }
        Ok(resolved)
    }
}
