use thiserror::Error;

use crate::net::Shape;

/// Everything that can go wrong in the rig.
///
/// Collisions, dead snakes and underfull replay buffers are normal control
/// flow and never show up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: expected a vector of {expected} values, got {got}")]
    InvalidInput { expected: usize, got: usize },
    #[error("action index {action} out of range (network has {actions} outputs)")]
    ActionOutOfRange { action: usize, actions: usize },
    #[error("network architecture mismatch: expected {expected}, found {found}")]
    ArchitectureMismatch { expected: Shape, found: Shape },
    #[error("invalid weight file: {0}")]
    Format(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
