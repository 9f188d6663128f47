//! Error types shared by the catalog model.

use crate::applications::ApplicationStatus;

/// Failures raised by structural changes to the directory forest.
///
/// A failed operation never hands back a partially modified forest; the
/// caller keeps the value it passed in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("directory '{0}' not found")]
    NodeNotFound(String),
    #[error("directory id '{0}' already exists")]
    DuplicateId(String),
    #[error("cannot move directory '{dragged}' next to its own descendant '{target}'")]
    CyclicMove { dragged: String, target: String },
    #[error("directory id '{0}' is reserved")]
    ReservedId(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplicationError {
    #[error("application '{0}' not found")]
    NotFound(String),
    #[error("application '{id}' was already {status}")]
    AlreadyDecided { id: String, status: ApplicationStatus },
    #[error("custom duration must be at least one day")]
    InvalidDuration,
    #[error("could not allocate a fresh application id, last tried '{0}'")]
    IdCollision(String),
}
