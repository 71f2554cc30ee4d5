//! Result type alias for ferrobatch operations

use crate::Error;

/// Result type alias for ferrobatch operations
pub type Result<T> = std::result::Result<T, Error>;
