// datatree/src/error.rs

use thiserror::Error;

/// Custom error type for the datatree library.
#[derive(Error, Debug)]
pub enum DataTreeError {
    /// A node id, constant pool id or subtree head does not fit the 28-bit payload
    /// (or the lower limit set in `TreeConfig`).
    #[error("Capacity exceeded: {what} is limited to {limit}")]
    CapacityExceeded { what: &'static str, limit: u32 },

    /// Node id <= 1 on encode; 0 or >= item count on decode.
    #[error("Invalid node id ({0})")]
    InvalidNodeId(u32),

    #[error("Node ({0}) is not a table")]
    NotATable(u32),

    /// Scalar kind the encoder cannot represent.
    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Invalid datatree format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Result type alias for datatree operations.
pub type Result<T> = std::result::Result<T, DataTreeError>;
