//! Runtime error types.

use glossa_core::{AdapterError, StoreError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop the runtime from starting or keep it from running.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The knowledge base could not be opened.
    #[error("Knowledge base error: {0}")]
    Store(#[from] StoreError),

    /// An adapter failed to connect or stopped with an error.
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// `run` was called before any adapter was registered.
    #[error("No adapters registered")]
    NoAdapters,

    /// A runtime task panicked or was aborted.
    #[error("Runtime task failed: {0}")]
    TaskFailed(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
