//! Unified error types for Lantern operations.
use crate::common::CharacterId;
use thiserror::Error;

/// Main error type for Lantern operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed tag stream, propagated up from the parser
    #[error("Parse error: {0}")]
    Parse(String),

    /// Structural violation detected during shape or timeline construction
    #[error("Invalid data: {0}")]
    ProcessingInvalidData(String),

    /// Re-entrant sprite timeline materialization
    #[error("Circular reference through character {0}")]
    CircularReference(CharacterId),

    /// Exported-name lookup miss
    #[error("Name not exported: {0}")]
    NameNotExported(String),

    /// Operation not valid in the current state
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Result type for Lantern operations.
pub type Result<T> = std::result::Result<T, Error>;
