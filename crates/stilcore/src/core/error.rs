use thiserror::Error;

/// Error types for the persistence layer
///
/// Only snapshot I/O and (de)serialization can fail; every table operation
/// either succeeds in memory or reports invalid input via `None`. Write
/// failures are logged and swallowed by the store itself, so these errors
/// rarely cross the public API.
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO errors (snapshot read/write, directory creation)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encode/decode errors
    #[error("Snapshot codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
