//! Typed error hierarchy for the taskboard client.
//!
//! Three enums cover the three failure surfaces:
//! - `BoardError`: REST calls and authoritative snapshot handling
//! - `MoveError`: local (optimistic) move application
//! - `DragError`: drag gesture misuse

use std::time::Duration;

use thiserror::Error;

/// Errors from the REST client and from committing backend snapshots.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Backend returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Items {item_ids:?} reference lanes that do not exist")]
    OrphanedItems { item_ids: Vec<i64> },

    #[error("Work item {id} not found")]
    ItemNotFound { id: i64 },

    #[error("Lane {id} not found")]
    LaneNotFound { id: i64 },

    #[error("Member {id} not found")]
    MemberNotFound { id: i64 },

    #[error("Role {id} not found")]
    RoleNotFound { id: i64 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoardError {
    /// HTTP status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            BoardError::Status { status, .. } => Some(*status),
            BoardError::Http { source, .. } | BoardError::Decode { source, .. } => {
                source.status().map(|s| s.as_u16())
            }
            _ => None,
        }
    }

    /// Worth retrying: transport failures, timeouts and 5xx responses.
    /// Definitive answers such as 404 or 409 are not.
    pub fn is_transient(&self) -> bool {
        match self {
            BoardError::Http { .. } | BoardError::Timeout { .. } => true,
            BoardError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Errors from applying a move to local board state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("Work item {id} is not on the board")]
    ItemNotFound { id: i64 },

    #[error("Lane {id} does not exist on this board")]
    UnknownLane { id: i64 },

    #[error("Sprint {id} does not exist in this project")]
    UnknownSprint { id: i64 },
}

/// Errors from the drag interaction adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    #[error("A drag of item {active} is already in progress")]
    AlreadyDragging { active: i64 },

    #[error("Work item {id} is not on the board")]
    UnknownItem { id: i64 },

    #[error("No drag in progress")]
    NotDragging,

    #[error("Drag of item {id} has no drop target")]
    NoDropTarget { id: i64 },
}

pub type BoardResult<T> = std::result::Result<T, BoardError>;
