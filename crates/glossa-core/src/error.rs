//! Unified error types for the Glossa core.
//!
//! Only two classes of failure exist at this layer: the knowledge store
//! cannot serve (fatal at startup), and an outbound send fails (logged,
//! never surfaced to the user). Empty or unmatched queries are not errors;
//! they are [`MatchOutcome`](crate::matcher::MatchOutcome) variants.

use thiserror::Error;

// =============================================================================
// Store Errors
// =============================================================================

/// Errors raised by a [`KnowledgeStore`](crate::store::KnowledgeStore).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backing source could not be opened or read.
    #[error("knowledge store unavailable: {0}")]
    Unavailable(String),

    /// The source was readable but held no entries.
    #[error("knowledge base is empty")]
    Empty,

    /// A query against a live store failed.
    #[error("knowledge query failed: {0}")]
    Query(String),
}

impl StoreError {
    /// Creates an unavailable-store error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Creates a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur while talking to the messaging platform.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Message send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The platform answered but rejected the call.
    #[error("platform API error ({code}): {description}")]
    Api {
        /// Platform error code.
        code: i64,
        /// Human-readable description returned by the platform.
        description: String,
    },

    /// The platform returned something we could not decode.
    #[error("invalid platform response: {0}")]
    InvalidResponse(String),

    /// The adapter is not connected.
    #[error("adapter is not connected")]
    NotConnected,
}

// =============================================================================
// Adapter Errors
// =============================================================================

/// Errors that can occur in adapter operations.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// Startup verification (credentials, reachability) failed.
    #[error("adapter startup failed: {0}")]
    Startup(String),

    /// Internal adapter error.
    #[error("adapter error: {0}")]
    Internal(String),

    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl AdapterError {
    /// Creates an internal adapter error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
