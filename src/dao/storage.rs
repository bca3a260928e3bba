//! Errors raised by storage backends regardless of the underlying database.

use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by session store backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable failure description.
        message: String,
        /// Underlying backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored record could not be encoded or decoded.
    #[error("corrupt session record for `{key}`")]
    Corrupt {
        /// Store key of the offending record.
        key: String,
        /// Underlying codec failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a corrupt-record error for the given store key.
    pub fn corrupt(key: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Corrupt {
            key,
            source: Box::new(source),
        }
    }
}
