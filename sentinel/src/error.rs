use sentinel_core::{ErrorKind, SentinelError};

/// Error surfaced to foreign callers.
///
/// One case per [`ErrorKind`], each carrying the rendered message of the
/// underlying [`SentinelError`].
#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum SentinelFfiError {
    /// A vault already exists for the caller.
    #[error("{0}")]
    AlreadyExists(String),
    /// No vault exists for the account.
    #[error("{0}")]
    NotFound(String),
    /// The caller may not perform the action.
    #[error("{0}")]
    Unauthorized(String),
    /// An argument failed validation.
    #[error("{0}")]
    InvalidArgument(String),
    /// The vault phase forbids the action.
    #[error("{0}")]
    InvalidState(String),
    /// The registry could not be read or written.
    #[error("{0}")]
    Storage(String),
}

impl From<SentinelError> for SentinelFfiError {
    fn from(err: SentinelError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::AlreadyExists => Self::AlreadyExists(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Unauthorized => Self::Unauthorized(message),
            ErrorKind::InvalidArgument => Self::InvalidArgument(message),
            ErrorKind::InvalidState => Self::InvalidState(message),
            ErrorKind::Storage => Self::Storage(message),
        }
    }
}

/// Result type for exported functions.
pub type SentinelFfiResult<T> = Result<T, SentinelFfiError>;
