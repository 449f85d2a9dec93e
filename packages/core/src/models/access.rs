//! Access Grant Data Structures
//!
//! Grants tie a user and a role to a subtree of the hierarchy. A grant's
//! `access_path` is a snapshot of the granted node's materialized path at
//! grant time: by prefix matching it authorizes that node and every strict
//! descendant. Grants do not keep a live foreign key to the node, so moving a
//! node detaches the grant's path text from the node's new identity (access
//! stays "frozen" to the subtree as it existed when granted).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A role-scoped access grant on a subtree.
///
/// At most one grant exists per `(user_id, access_path)` pair; re-granting on
/// the same path updates the existing grant's role in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    /// Unique identifier (UUID)
    pub id: String,

    /// The user this grant belongs to (opaque identifier)
    pub user_id: String,

    /// The granted role (opaque identifier; resolved via `RoleResolver`)
    pub role_id: String,

    /// Path snapshot of the granted node at grant time
    pub access_path: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl AccessGrant {
    /// Create a new grant with an auto-generated UUID.
    pub fn new(user_id: String, role_id: String, access_path: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            role_id,
            access_path,
            created_at: Utc::now(),
        }
    }
}

/// Resolved role descriptor from the role collaborator (id + name only; role
/// permission semantics live outside this engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
}

/// How an access check was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Inheritance {
    /// A grant exists on the checked node's own path.
    Direct,
    /// A grant on an ancestor path authorizes the node by prefix matching.
    Inherited,
}

/// Outcome of an access check. Derived, never persisted.
///
/// A negative result (`has_access == false`) is a valid answer, not an error;
/// lookup failures are reported separately through the error channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheckResult {
    pub has_access: bool,

    /// The checked node, sanitized. `None` when the path resolves to nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<crate::models::NodeSummary>,

    /// The role that satisfied the check, when access was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inheritance: Option<Inheritance>,
}

impl AccessCheckResult {
    /// A negative result, optionally carrying the resolved node.
    pub fn denied(node: Option<crate::models::NodeSummary>) -> Self {
        Self {
            has_access: false,
            node,
            role: None,
            inheritance: None,
        }
    }

    /// A positive result.
    pub fn granted(
        node: crate::models::NodeSummary,
        role: Role,
        inheritance: Inheritance,
    ) -> Self {
        Self {
            has_access: true,
            node: Some(node),
            role: Some(role),
            inheritance: Some(inheritance),
        }
    }
}

/// A grant joined with its resolved role descriptor, as returned by the
/// listing operations (raw store rows are never leaked).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedGrant {
    pub grant: AccessGrant,
    /// `None` when the role id no longer resolves.
    pub role: Option<Role>,
}

/// One node a user can reach, tagged with the role of the most specific grant
/// that authorizes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibleNode {
    pub node: crate::models::NodeSummary,
    pub role_id: String,
}
