//! Error types for the vault protocol.

use strum::{Display, EnumString};
use thiserror::Error;

use crate::types::AccountId;

/// Result type alias for vault protocol operations.
pub type SentinelResult<T> = Result<T, SentinelError>;

/// Coarse classification of a [`SentinelError`].
///
/// Lets callers branch on the failure without matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A vault is already registered for the owner.
    AlreadyExists,
    /// No vault is registered for the owner.
    NotFound,
    /// The caller may not perform the action on this vault.
    Unauthorized,
    /// A supplied argument is malformed or out of range.
    InvalidArgument,
    /// The vault is not in a phase that permits the action.
    InvalidState,
    /// The backing store failed.
    Storage,
}

/// Errors raised by vault protocol operations.
///
/// Every variant aborts the call it came from with no state change.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// A vault already exists for this owner.
    #[error("vault already exists for {owner}; reset it first")]
    AlreadyExists {
        /// Owner of the existing vault.
        owner: AccountId,
    },

    /// No vault exists for this owner.
    #[error("vault not found for {owner}")]
    NotFound {
        /// Owner that was looked up.
        owner: AccountId,
    },

    /// Caller is not allowed to act on the vault.
    #[error("{caller} is not authorized to {action} for {owner}")]
    Unauthorized {
        /// Account that made the call.
        caller: AccountId,
        /// Vault owner the call targeted.
        owner: AccountId,
        /// Short name of the attempted action.
        action: &'static str,
    },

    /// An argument failed validation.
    #[error("invalid argument '{parameter}': {reason}")]
    InvalidArgument {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The vault phase forbids the action.
    #[error("invalid state for {owner}: {reason}")]
    InvalidState {
        /// Owner of the vault.
        owner: AccountId,
        /// Description of the conflicting phase.
        reason: String,
    },

    /// The vault store could not complete the operation.
    #[error("storage error: {0}")]
    Storage(String),
}

impl SentinelError {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument<R: Into<String>>(parameter: &'static str, reason: R) -> Self {
        Self::InvalidArgument {
            parameter,
            reason: reason.into(),
        }
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state<R: Into<String>>(owner: &AccountId, reason: R) -> Self {
        Self::InvalidState {
            owner: owner.clone(),
            reason: reason.into(),
        }
    }

    /// Creates a storage error.
    #[must_use]
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage(message.into())
    }
}
