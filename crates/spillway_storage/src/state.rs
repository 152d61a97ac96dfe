//! Lifecycle of a single storage location.
//!
//! ```text
//! Uncreated --create--> Writing --close--> Readable
//!                          |                  |
//!                          +------remove------+--> Removed (terminal)
//! ```
//!
//! Backends embed a [`LocationState`] to get the transition checks and the
//! matching error kinds without re-deriving them.

use crate::error::{StorageError, StorageResult};

/// What a backend does when `create` is called on a location that exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecreatePolicy {
    /// The previous content is discarded and a new write begins.
    Overwrite,
    /// The second `create` fails with [`StorageError::AlreadyExists`].
    Reject,
}

/// What a backend does when `remove` is called with nothing to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovePolicy {
    /// Removing a missing location succeeds.
    Idempotent,
    /// Removing a missing location fails with [`StorageError::NotFound`].
    NotFoundOnRepeat,
}

/// State of the storage location owned by one backend instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationState {
    /// Nothing has been created yet.
    #[default]
    Uncreated,
    /// A write handle is open; the location is not readable.
    Writing,
    /// The write handle was closed; reads are allowed.
    Readable,
    /// The location was removed. No further transition is possible.
    Removed,
}

impl LocationState {
    /// Transition for `create`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::AlreadyExists`] when the location exists and the
    ///   policy is [`RecreatePolicy::Reject`]
    /// - [`StorageError::NotFound`] once the location has been removed
    pub fn begin_create(&mut self, policy: RecreatePolicy) -> StorageResult<()> {
        match (*self, policy) {
            (Self::Uncreated, _) | (Self::Writing | Self::Readable, RecreatePolicy::Overwrite) => {
                *self = Self::Writing;
                Ok(())
            }
            (Self::Writing | Self::Readable, RecreatePolicy::Reject) => {
                Err(StorageError::AlreadyExists)
            }
            (Self::Removed, _) => Err(StorageError::NotFound),
        }
    }

    /// Transition for a successful write handle `close`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] if the location was removed mid-write
    /// - [`StorageError::InvalidArgument`] if no write is in progress
    pub fn finish_write(&mut self) -> StorageResult<()> {
        match *self {
            Self::Writing => {
                *self = Self::Readable;
                Ok(())
            }
            Self::Removed => Err(StorageError::NotFound),
            Self::Uncreated | Self::Readable => Err(StorageError::InvalidArgument(
                "no write in progress".to_string(),
            )),
        }
    }

    /// Precondition shared by every read-side open.
    ///
    /// # Errors
    ///
    /// - [`StorageError::NotFound`] before any create, or after remove
    /// - [`StorageError::NotReady`] while the write handle is still open
    pub fn check_readable(&self) -> StorageResult<()> {
        match self {
            Self::Readable => Ok(()),
            Self::Writing => Err(StorageError::NotReady),
            Self::Uncreated | Self::Removed => Err(StorageError::NotFound),
        }
    }

    /// Transition for `remove`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] when there is nothing to remove and
    /// the policy is [`RemovePolicy::NotFoundOnRepeat`].
    pub fn remove(&mut self, policy: RemovePolicy) -> StorageResult<()> {
        match (*self, policy) {
            (Self::Writing | Self::Readable, _) => {
                *self = Self::Removed;
                Ok(())
            }
            (Self::Uncreated | Self::Removed, RemovePolicy::Idempotent) => Ok(()),
            (Self::Uncreated | Self::Removed, RemovePolicy::NotFoundOnRepeat) => {
                Err(StorageError::NotFound)
            }
        }
    }

    /// Returns true if reads are currently allowed.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        matches!(self, Self::Readable)
    }
}
