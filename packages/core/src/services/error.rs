//! Service Layer Error Types
//!
//! This module defines the typed error taxonomy for all engine operations.
//! Expected conditions (missing ids, validation failures, rejected moves)
//! are always returned as these variants, never panics; only infrastructure
//! failures travel through the `Store` variant, which callers treat as
//! retryable or fatal per their own policy.
//!
//! A negative access check is NOT an error: "no access" is a successful
//! result carried by `AccessCheckResult`, so callers can always distinguish
//! it from a failed lookup.

use thiserror::Error;

/// Engine operation errors
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// Node not found by ID
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// Referenced parent node does not exist
    #[error("Parent node not found: {parent_id}")]
    ParentNotFound { parent_id: String },

    /// Blank or invalid name/node_type
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Duplicate access grant for a (user, path) pair
    #[error("Access grant already exists for user {user_id} on path {access_path}")]
    AlreadyExists {
        user_id: String,
        access_path: String,
    },

    /// Structural move rejected: the target parent is inside the moved subtree
    #[error("Moving node {node_id} under {parent_id} would create a cycle")]
    WouldCreateCycle { node_id: String, parent_id: String },

    /// A node cannot be its own parent
    #[error("Node {id} cannot be its own parent")]
    CannotBeOwnParent { id: String },

    /// Non-propagating delete blocked by existing children
    #[error("Node {id} has children; delete with propagation to remove the subtree")]
    HasChildren { id: String },

    /// Revoke (or per-item batch revoke) on a missing grant
    #[error("Access grant not found: {id}")]
    AccessNotFound { id: String },

    /// Store/infrastructure failure (connection, aborted transaction)
    #[error("Store operation failed: {0}")]
    Store(#[from] anyhow::Error),
}

/// Stable error discriminant for batch item reporting and RPC error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NodeNotFound,
    ParentNotFound,
    Validation,
    AlreadyExists,
    WouldCreateCycle,
    CannotBeOwnParent,
    HasChildren,
    AccessNotFound,
    Store,
}

impl HierarchyError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a parent not found error
    pub fn parent_not_found(parent_id: impl Into<String>) -> Self {
        Self::ParentNotFound {
            parent_id: parent_id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a duplicate grant error
    pub fn already_exists(user_id: impl Into<String>, access_path: impl Into<String>) -> Self {
        Self::AlreadyExists {
            user_id: user_id.into(),
            access_path: access_path.into(),
        }
    }

    /// Create a cycle rejection error
    pub fn would_create_cycle(node_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::WouldCreateCycle {
            node_id: node_id.into(),
            parent_id: parent_id.into(),
        }
    }

    /// Create a self-parent rejection error
    pub fn cannot_be_own_parent(id: impl Into<String>) -> Self {
        Self::CannotBeOwnParent { id: id.into() }
    }

    /// Create a has-children rejection error
    pub fn has_children(id: impl Into<String>) -> Self {
        Self::HasChildren { id: id.into() }
    }

    /// Create an access grant not found error
    pub fn access_not_found(id: impl Into<String>) -> Self {
        Self::AccessNotFound { id: id.into() }
    }

    /// Stable discriminant for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NodeNotFound { .. } => ErrorKind::NodeNotFound,
            Self::ParentNotFound { .. } => ErrorKind::ParentNotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::WouldCreateCycle { .. } => ErrorKind::WouldCreateCycle,
            Self::CannotBeOwnParent { .. } => ErrorKind::CannotBeOwnParent,
            Self::HasChildren { .. } => ErrorKind::HasChildren,
            Self::AccessNotFound { .. } => ErrorKind::AccessNotFound,
            Self::Store(_) => ErrorKind::Store,
        }
    }
}
