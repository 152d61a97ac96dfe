//! Error types for backend operations.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for backend operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors a backend surfaces to its caller.
///
/// Every variant maps onto one [`ErrorKind`] through [`StorageError::kind`].
/// Running out of data is never an error: readers report it by returning
/// `Ok(0)`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be reached or initialized.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// No storage location exists: it was never created or has been removed.
    #[error("storage location not found")]
    NotFound,

    /// The location was created but its write handle has not been closed.
    #[error("storage location not ready: write handle still open")]
    NotReady,

    /// The caller lacks rights to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A quota, disk space or connection limit was exceeded.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// An offset or seek target is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `create` was called again on a backend that rejects re-creation.
    #[error("storage location already exists")]
    AlreadyExists,

    /// An I/O error from the underlying medium.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Conceptual classification of a [`StorageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Backend cannot be reached or initialized.
    Unavailable,
    /// Location missing, or removed.
    NotFound,
    /// Location exists but is still being written.
    NotReady,
    /// Caller lacks rights.
    PermissionDenied,
    /// Quota, space or connection limit exceeded.
    ResourceExhausted,
    /// Negative offsets and out-of-range seek targets.
    InvalidArgument,
    /// Re-creation rejected by the backend's policy.
    AlreadyExists,
    /// An I/O failure that does not fit any other kind.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unavailable => "unavailable",
            Self::NotFound => "not-found",
            Self::NotReady => "not-ready",
            Self::PermissionDenied => "permission-denied",
            Self::ResourceExhausted => "resource-exhausted",
            Self::InvalidArgument => "invalid-argument",
            Self::AlreadyExists => "already-exists",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

impl StorageError {
    /// Returns the taxonomy kind of this error.
    ///
    /// I/O errors are classified by their [`io::ErrorKind`], so a backend that
    /// simply propagates `std::fs` failures still reports the right kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::NotFound => ErrorKind::NotFound,
            Self::NotReady => ErrorKind::NotReady,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::AlreadyExists => ErrorKind::AlreadyExists,
            Self::Io(e) => classify_io(e),
        }
    }

    /// Builds the error a backend returns for a given taxonomy kind.
    ///
    /// Test doubles use this to inject failures of a chosen kind.
    #[must_use]
    pub fn from_kind(kind: ErrorKind, context: impl Into<String>) -> Self {
        let context = context.into();
        match kind {
            ErrorKind::Unavailable => Self::Unavailable(context),
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::NotReady => Self::NotReady,
            ErrorKind::PermissionDenied => Self::PermissionDenied(context),
            ErrorKind::ResourceExhausted => Self::ResourceExhausted(context),
            ErrorKind::InvalidArgument => Self::InvalidArgument(context),
            ErrorKind::AlreadyExists => Self::AlreadyExists,
            ErrorKind::Other => Self::Io(io::Error::new(io::ErrorKind::Other, context)),
        }
    }

    /// Builds an [`StorageError::InvalidArgument`] for a negative offset.
    #[must_use]
    pub fn negative_offset(offset: i64) -> Self {
        Self::InvalidArgument(format!("negative offset {offset}"))
    }
}

fn classify_io(err: &io::Error) -> ErrorKind {
    // Contract errors tunnelled through `io::Error` keep their kind.
    if let Some(inner) = err.get_ref().and_then(|e| e.downcast_ref::<StorageError>()) {
        return inner.kind();
    }
    match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
        io::ErrorKind::InvalidInput => ErrorKind::InvalidArgument,
        io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::TimedOut => ErrorKind::Unavailable,
        io::ErrorKind::OutOfMemory => ErrorKind::ResourceExhausted,
        _ => ErrorKind::Other,
    }
}

impl From<StorageError> for io::Error {
    fn from(err: StorageError) -> Self {
        let kind = match err.kind() {
            ErrorKind::NotFound => io::ErrorKind::NotFound,
            ErrorKind::PermissionDenied => io::ErrorKind::PermissionDenied,
            ErrorKind::InvalidArgument => io::ErrorKind::InvalidInput,
            ErrorKind::AlreadyExists => io::ErrorKind::AlreadyExists,
            ErrorKind::ResourceExhausted => io::ErrorKind::OutOfMemory,
            _ => io::ErrorKind::Other,
        };
        match err {
            StorageError::Io(inner) => inner,
            other => io::Error::new(kind, other),
        }
    }
}
