//! Error types for the dispatch layer.

use thiserror::Error;

/// Errors raised while building the registry or queueing work.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The queue already holds `max_pending` items.
    #[error("Dispatch queue is full")]
    QueueFull,

    /// Two handlers were registered under the same name.
    #[error("Action already registered: {0}")]
    DuplicateAction(String),

    /// Action names must be non-empty and free of surrounding whitespace.
    #[error("Invalid action name: {0:?}")]
    InvalidActionName(String),
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
