//! Error types and result types for record store operations.
//!
//! Two layers of errors exist:
//!
//! - [`BackendError`] is what a [`StoreBackend`](crate::backend::StoreBackend) reports about
//!   the external document store.
//! - [`StoreError`] is what callers of the [`RecordStore`](crate::store::RecordStore) see.
//!   Backend failures are normalized into it: a missing record becomes
//!   [`StoreError::NotFound`], everything else is wrapped into [`StoreError::Transport`] with the
//!   collection and id the operation was working on.
//!
//! Use [`StoreError::kind`] when only the category of a failure matters.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Errors reported by a storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The addressed record does not exist.
    #[error("record not found")]
    NotFound,
    /// The call was cancelled through its [`Context`](crate::context::Context).
    #[error("operation cancelled")]
    Cancelled,
    /// The deadline of the call's [`Context`](crate::context::Context) expired.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store rejected or failed the request.
    #[error("store error: {0}")]
    Internal(String),
    /// A record could not be converted to or from its stored representation.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

impl From<BsonError> for BackendError {
    fn from(err: BsonError) -> Self {
        BackendError::Serialization(err.to_string())
    }
}

/// Represents all errors a caller of the record store can observe.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A caller supplied argument was rejected before reaching the store.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// No record exists at the requested id.
    #[error("data not found: {collection}/{id}")]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Id that was requested.
        id: String,
    },
    /// The record exists but cannot be converted into the requested type.
    #[error("data in {collection} for id {id} is in an incorrect format")]
    Decode {
        /// Collection the record was read from.
        collection: String,
        /// Id of the offending record.
        id: String,
        /// The underlying conversion failure.
        #[source]
        source: BsonError,
    },
    /// A batch exceeded the maximum number of items a single commit accepts.
    #[error("batch size {size} exceeds max batch size {max}")]
    LimitExceeded {
        /// Number of items that were submitted.
        size: usize,
        /// Maximum number of items allowed.
        max: usize,
    },
    /// Any other failure of the underlying store.
    #[error("{context}")]
    Transport {
        /// What the layer was doing when the store failed.
        context: String,
        /// The failure reported by the backend.
        #[source]
        source: BackendError,
    },
}

/// Category of a [`StoreError`], comparable with `==`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty collection name or id, or malformed criteria.
    InvalidArgument,
    /// The addressed record does not exist.
    NotFound,
    /// A stored record could not be decoded into the requested type.
    Decode,
    /// A batch larger than the store accepts.
    LimitExceeded,
    /// Any other backend failure, including cancellation and deadlines.
    Transport,
}

impl StoreError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Decode { .. } => ErrorKind::Decode,
            StoreError::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            StoreError::Transport { .. } => ErrorKind::Transport,
        }
    }

    /// Returns `true` if the requested record does not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        StoreError::InvalidArgument(message.into())
    }

    pub(crate) fn transport(context: impl Into<String>, source: BackendError) -> Self {
        StoreError::Transport { context: context.into(), source }
    }
}

/// A specialized `Result` type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinguishable() {
        let missing = StoreError::NotFound { collection: "books".into(), id: "id-1".into() };
        assert!(missing.is_not_found());
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let transport = StoreError::transport("error getting books record with id id-1", BackendError::Cancelled);
        assert_eq!(transport.kind(), ErrorKind::Transport);
        assert!(!transport.is_not_found());
    }

    #[test]
    fn every_variant_has_a_kind() {
        let invalid = StoreError::InvalidArgument("collection name is required".into());
        let oversized = StoreError::LimitExceeded { size: 501, max: 500 };

        assert_eq!(invalid.kind(), ErrorKind::InvalidArgument);
        assert_eq!(oversized.kind(), ErrorKind::LimitExceeded);
        assert_ne!(invalid.kind(), oversized.kind());
    }

    #[test]
    fn transport_keeps_backend_source() {
        use std::error::Error;

        let err = StoreError::transport(
            "error saving books record with id id-1",
            BackendError::Unavailable("connection refused".into()),
        );

        assert_eq!(err.to_string(), "error saving books record with id id-1");
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("store unavailable: connection refused".to_string()),
        );
    }
}
