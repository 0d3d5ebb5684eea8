//! Parameter system error types.

use thiserror::Error;

/// Errors that can occur while resolving or synchronizing GPU program parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// A strict named lookup was made on a parameter set that has no named
    /// constant table (the program never compiled, or is a low-level program).
    #[error("named constants not initialized, cannot resolve '{name}'")]
    NotInitialized {
        /// The name that was looked up.
        name: String,
    },
    /// A strict lookup for a name that does not exist.
    #[error("parameter '{name}' not found")]
    NotFound {
        /// The name that was looked up.
        name: String,
    },
    /// A configuration or argument value is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The requested operation has no valid representation for this data.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// A definition with the same name already exists.
    #[error("constant definition '{name}' already exists")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },
    /// Encoding or decoding a named constant table failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Convenience alias for results produced by this crate.
pub type ParamsResult<T> = Result<T, ParamsError>;
