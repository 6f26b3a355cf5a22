//! Result type alias for mtpcopy operations

use crate::Error;

/// Result type alias for mtpcopy operations
pub type Result<T> = std::result::Result<T, Error>;
