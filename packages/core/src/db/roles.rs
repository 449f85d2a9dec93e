//! Role Collaborator Contract
//!
//! The engine does not own role definitions or their semantics; it only needs
//! to turn a `role_id` into a descriptor for access-check results and grant
//! listings. [`RoleResolver`] is that boundary. [`StaticRoleResolver`] is a
//! fixed-map implementation for tests and single-process embeddings.

use crate::models::Role;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves role identifiers to role descriptors.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// `Ok(None)` when the id does not resolve (not an error: a grant can
    /// outlive its role definition).
    async fn resolve_role(&self, role_id: &str) -> Result<Option<Role>>;
}

/// Role resolver backed by a fixed in-memory map.
#[derive(Default)]
pub struct StaticRoleResolver {
    roles: HashMap<String, Role>,
}

impl StaticRoleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver from `(id, name)` pairs.
    pub fn with_roles<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let roles = pairs
            .into_iter()
            .map(|(id, name)| {
                let id = id.into();
                (
                    id.clone(),
                    Role {
                        id,
                        name: name.into(),
                    },
                )
            })
            .collect();
        Self { roles }
    }

    /// Register or replace a role.
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        self.roles.insert(
            id.clone(),
            Role {
                id,
                name: name.into(),
            },
        );
    }
}

#[async_trait]
impl RoleResolver for StaticRoleResolver {
    async fn resolve_role(&self, role_id: &str) -> Result<Option<Role>> {
        Ok(self.roles.get(role_id).cloned())
    }
}
