use std::error::Error;
use thiserror::Error;

/// Result alias for remote storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by remote store backends regardless of the underlying transport.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend answered with a payload that could not be decoded.
    #[error("malformed document `{document}`")]
    Malformed {
        document: String,
        #[source]
        source: serde_json::Error,
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

    /// Construct a decoding error for the named document.
    pub fn malformed(document: impl Into<String>, source: serde_json::Error) -> Self {
        StorageError::Malformed {
            document: document.into(),
            source,
        }
    }
}
