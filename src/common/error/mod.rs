//! Unified error types for Lantern.
//!
//! This module provides the error type shared by the extractor and every
//! processor, plus the [`ErrorMask`] that selects which recoverable error
//! classes raise versus downgrade to sentinel values.

// Submodule declarations
pub mod mask;
pub mod types;

// Re-exports
pub use mask::ErrorMask;
pub use types::{Error, Result};
