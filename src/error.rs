//! Error types for the Nebula SOM engine.

use thiserror::Error;

/// The main error type for Nebula operations.
#[derive(Error, Debug)]
pub enum NebulaError {
    /// A data file does not match the expected binary format.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid setup parameter (sigma, rotations, dimensions, ...).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Runtime tensor shape conflict.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The expected element count or extent.
        expected: usize,
        /// The actual element count or extent.
        actual: usize,
    },

    /// Cooperative cancellation; the map is left in its last consistent state.
    #[error("Training cancelled")]
    Cancelled,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Nebula operations.
pub type Result<T> = std::result::Result<T, NebulaError>;

impl From<bincode::Error> for NebulaError {
    fn from(err: bincode::Error) -> Self {
        NebulaError::Serialization(err.to_string())
    }
}
