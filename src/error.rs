//! Service-level error taxonomy, handled at the reconciliation boundary.

use thiserror::Error;

use crate::{dao::storage::StorageError, transport::TransportError};

/// Errors that can occur in reconciliation entry points. None of these
/// propagate past the command dispatch boundary; each maps to a user-facing
/// reply or a logged no-op there.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend failed mid-operation.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// User-referenced channel does not exist.
    #[error("channel `{0}` does not exist")]
    ChannelNotFound(String),
    /// Stop requested while no live session exists.
    #[error("no trivia session is in progress")]
    NoActiveSession,
    /// A reply could not be delivered.
    #[error("transport failure")]
    Transport(#[source] TransportError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<TransportError> for ServiceError {
    fn from(err: TransportError) -> Self {
        ServiceError::Transport(err)
    }
}
