//! Store Error Types
//!
//! This module defines error types for store-level failures: uniqueness
//! violations and referential problems a backend must surface. Service-layer
//! business errors (not-found, validation, cycles) are handled by
//! `services::error` instead.

use thiserror::Error;

/// Store operation errors
///
/// Covers the error cases every `NodeStore` backend is expected to report.
/// Infrastructure failures (connection loss, aborted transactions) travel as
/// `anyhow` context on the trait boundary and are wrapped here only when a
/// backend can classify them.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// A node with this path already exists (paths are globally unique)
    #[error("Duplicate node path: {path}")]
    DuplicatePath { path: String },

    /// A grant for this (user, path) pair already exists
    #[error("Duplicate access grant for user {user_id} on path {access_path}")]
    DuplicateGrant {
        user_id: String,
        access_path: String,
    },

    /// A referenced record is missing (e.g., updating a node that was
    /// deleted by a concurrent transaction)
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    /// A transactional unit could not be applied atomically
    #[error("Transaction failed: {context}")]
    TransactionFailed { context: String },
}

impl DatabaseError {
    /// Create a duplicate path error
    pub fn duplicate_path(path: impl Into<String>) -> Self {
        Self::DuplicatePath { path: path.into() }
    }

    /// Create a duplicate grant error
    pub fn duplicate_grant(user_id: impl Into<String>, access_path: impl Into<String>) -> Self {
        Self::DuplicateGrant {
            user_id: user_id.into(),
            access_path: access_path.into(),
        }
    }

    /// Create a record not found error
    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::RecordNotFound { id: id.into() }
    }

    /// Create a transaction failed error
    pub fn transaction_failed(context: impl Into<String>) -> Self {
        Self::TransactionFailed {
            context: context.into(),
        }
    }
}
