//! Error types for configuration and tree rewrites

use thiserror::Error;

/// Fatal setup errors. Raised when the engine is configured, never during a pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PageError {
    #[error("invalid page configuration: `{field}` must be a positive finite number, got {value}")]
    InvalidConfig { field: &'static str, value: f32 },

    #[error("measurement cache capacity must be at least 1")]
    ZeroCacheCapacity,

    #[error("failed to parse document: {0}")]
    Parse(String),
}

/// Failures of a structural rewrite on the document tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("position {pos} is outside the document (size {size})")]
    OutOfRange { pos: usize, size: usize },

    #[error("no node starts at position {0}")]
    NoNodeAt(usize),

    #[error("cannot split {depth} levels at position {pos}")]
    InvalidDepth { pos: usize, depth: usize },

    #[error("nodes around position {0} cannot be joined")]
    NotJoinable(usize),
}

impl From<serde_json::Error> for PageError {
    fn from(err: serde_json::Error) -> Self {
        PageError::Parse(err.to_string())
    }
}
