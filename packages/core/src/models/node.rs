//! Node Data Structures
//!
//! This module defines the core `Node` struct and the request/response shapes
//! used by the node service.
//!
//! # Architecture
//!
//! - **Materialized path**: every node carries its full ancestry as a
//!   dot-separated `path` string, kept consistent by the node service on
//!   every structural mutation
//! - **Free-form taxonomy**: `node_type` is a caller-defined tag
//!   ("organization", "team", "project", ...), not an enum
//! - **Opaque metadata**: entity-specific data lives in the `metadata` JSON
//!   bag; the engine stores and returns it verbatim and never inspects it
//!
//! # Examples
//!
//! ```rust
//! use pathguard_core::models::CreateNodeParams;
//! use serde_json::json;
//!
//! let params = CreateNodeParams {
//!     name: "R&D Team!".to_string(),
//!     node_type: "team".to_string(),
//!     parent_id: Some("org-uuid".to_string()),
//!     metadata: json!({ "cost_center": "cc-42" }),
//! };
//! ```

use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A business entity placed in the hierarchy.
///
/// # Fields
///
/// - `id`: Opaque stable identifier (UUID)
/// - `name`: Display name; the path label is derived from it by sanitization
/// - `node_type`: Free-form type tag (e.g., "organization", "team")
/// - `parent_id`: Optional reference to the parent node; `None` means root
/// - `path`: Materialized path from root to this node (e.g., `"acme.r_d_team"`)
/// - `metadata`: Opaque JSON bag, stored and returned verbatim
/// - `created_at` / `modified_at`: Timestamps maintained by the engine
///
/// # Invariants
///
/// - `path` has exactly as many segments as the node has ancestors plus one
/// - `path` is globally unique
/// - A root node (`parent_id == None`) has a single-segment path; otherwise
///   `path == parent.path + "." + sanitize_name(name)`
///
/// The path is computed at creation time and only ever rewritten by a move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier (UUID)
    pub id: String,

    /// Display name
    pub name: String,

    /// Free-form type tag (caller-defined taxonomy)
    pub node_type: String,

    /// Parent node ID (`None` for roots)
    pub parent_id: Option<String>,

    /// Materialized path, dot-separated sanitized labels
    pub path: String,

    /// Opaque key/value bag
    pub metadata: serde_json::Value,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl Node {
    /// Create a new node with an auto-generated UUID.
    ///
    /// `parent_path` is the parent's materialized path, or `""` for a root;
    /// the node's own path is derived from it and the sanitized name.
    pub fn new(
        name: String,
        node_type: String,
        parent_id: Option<String>,
        parent_path: &str,
        metadata: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        let path = paths::build_child_path(parent_path, &name);
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            node_type,
            parent_id,
            path,
            metadata,
            created_at: now,
            modified_at: now,
        }
    }

    /// True when this node is a root (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Sanitized view of this node: plain fields only, no parent/children
    /// associations. This is the shape leaked to access-check callers.
    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            node_type: self.node_type.clone(),
            path: self.path.clone(),
        }
    }
}

/// Sanitized node view returned in access results and accessible-node lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: String,
    pub name: String,
    pub node_type: String,
    pub path: String,
}

/// Parameters for creating a node.
///
/// A typed request struct: the engine deliberately does not accept loose
/// attribute maps. `name` and `node_type` must be non-blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeParams {
    /// Display name (required, non-blank)
    pub name: String,
    /// Free-form type tag (required, non-blank)
    pub node_type: String,
    /// Optional parent node ID; `None` creates a root
    pub parent_id: Option<String>,
    /// Opaque metadata bag
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
}

fn default_metadata() -> serde_json::Value {
    serde_json::json!({})
}

/// Partial update for a node.
///
/// Only `name`, `node_type`, and `metadata` are mutable this way; `path` and
/// `parent_id` never change here (moves go through `NodeService::move_node`).
/// `None` fields are left untouched.
///
/// Renaming a node does NOT rewrite its path: the path label is frozen at
/// create/move time, which keeps grant path snapshots anchored to stable text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    pub name: Option<String>,
    pub node_type: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl NodeUpdate {
    /// Update containing only a new name.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Update containing only a new metadata bag.
    pub fn metadata(metadata: serde_json::Value) -> Self {
        Self {
            metadata: Some(metadata),
            ..Default::default()
        }
    }
}

/// Result of a (possibly cascading) delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// Number of nodes removed: the target plus every descendant.
    pub deleted_count: usize,
}

/// One page of nodes, ordered by path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePage {
    pub nodes: Vec<Node>,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
    /// Total nodes across all pages
    pub total: usize,
}
