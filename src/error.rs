//! Error types for the like engine.

use crate::types::ItemId;
use thiserror::Error;

/// Main error type for engine and store operations.
///
/// Every variant is recoverable and scoped to a single item or call;
/// nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Item not tracked: {0}")]
    ItemNotTracked(ItemId),

    #[error("Item not found on server: {0}")]
    ItemNotFound(ItemId),

    #[error("Viewer is not authenticated")]
    Unauthenticated,

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Toggle rejected by server: {0}")]
    Rejected(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
