//! Base capability every spill target provides.

use crate::capability::{RandomAccessBackend, SeekableBackend};
use crate::error::StorageResult;
use crate::state::{RecreatePolicy, RemovePolicy};
use std::io::{Read, Write};
use std::sync::Arc;

/// Sequential output sink bound to one storage location.
///
/// Bytes written through the handle become visible to `open` once
/// [`close`](WriteHandle::close) returns `Ok`. Flushing is the backend's job:
/// `close` must not return before the data is durably associated with the
/// location.
///
/// Dropping a handle without closing it abandons the write. The location
/// stays unreadable until a later `create` and `close` succeed.
pub trait WriteHandle: Write + Send {
    /// Flushes and closes the handle.
    ///
    /// Taking `self` by box means a handle can be closed at most once.
    ///
    /// # Errors
    ///
    /// Returns an error if the data could not be committed. The location is
    /// not readable after a failed close.
    fn close(self: Box<Self>) -> StorageResult<()>;
}

/// Sequential input source over a fully written location.
///
/// Reads start at offset zero. `Ok(0)` signals end-of-data. The handle is
/// released when dropped.
pub trait ReadHandle: Read + Send {}

impl<T: Read + Send + ?Sized> ReadHandle for T {}

/// A storage provider scoped to exactly one storage location.
///
/// # Invariants
///
/// - `open` and the extension opens succeed only after `create` returned a
///   handle and that handle was closed without error
/// - every read handle observes the full byte sequence in write order
/// - after `remove`, every open fails with `NotFound`
/// - any number of read handles may be used concurrently
///
/// Backends are `Send + Sync` so a location can be shared across reader
/// threads. No operation is required to be safe against concurrent `create`
/// or `remove`: that discipline belongs to the caller.
///
/// # Optional capabilities
///
/// Random access and seeking are separate traits. A backend that implements
/// one overrides the matching probe ([`Backend::as_random_access`] or
/// [`Backend::as_seekable`]) to return `Some(self)`. Callers must probe
/// before relying on either capability.
pub trait Backend: Send + Sync {
    /// Creates the storage location and returns a write handle.
    ///
    /// Calling `create` on a location that already exists follows
    /// [`Backend::recreate_policy`].
    ///
    /// # Errors
    ///
    /// - `Unavailable`, `PermissionDenied` or `ResourceExhausted` verbatim
    ///   from the medium
    /// - `AlreadyExists` under [`RecreatePolicy::Reject`]
    /// - `NotFound` once the location has been removed, since removal is
    ///   terminal
    fn create(&self) -> StorageResult<Box<dyn WriteHandle>>;

    /// Opens the location for sequential reading from offset zero.
    ///
    /// # Errors
    ///
    /// - `NotFound` before any create, or after remove
    /// - `NotReady` while the write handle is still open
    fn open(&self) -> StorageResult<Box<dyn ReadHandle>>;

    /// Deletes the storage location.
    ///
    /// Removing a missing location follows [`Backend::remove_policy`].
    ///
    /// # Errors
    ///
    /// Returns an error if the medium refuses the deletion, or `NotFound`
    /// under [`RemovePolicy::NotFoundOnRepeat`].
    fn remove(&self) -> StorageResult<()>;

    /// Declares how a second `create` behaves.
    fn recreate_policy(&self) -> RecreatePolicy;

    /// Declares how `remove` behaves when nothing exists.
    fn remove_policy(&self) -> RemovePolicy;

    /// Probes for the random-access capability.
    fn as_random_access(&self) -> Option<&dyn RandomAccessBackend> {
        None
    }

    /// Probes for the seeking capability.
    fn as_seekable(&self) -> Option<&dyn SeekableBackend> {
        None
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn create(&self) -> StorageResult<Box<dyn WriteHandle>> {
        (**self).create()
    }

    fn open(&self) -> StorageResult<Box<dyn ReadHandle>> {
        (**self).open()
    }

    fn remove(&self) -> StorageResult<()> {
        (**self).remove()
    }

    fn recreate_policy(&self) -> RecreatePolicy {
        (**self).recreate_policy()
    }

    fn remove_policy(&self) -> RemovePolicy {
        (**self).remove_policy()
    }

    fn as_random_access(&self) -> Option<&dyn RandomAccessBackend> {
        (**self).as_random_access()
    }

    fn as_seekable(&self) -> Option<&dyn SeekableBackend> {
        (**self).as_seekable()
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn create(&self) -> StorageResult<Box<dyn WriteHandle>> {
        (**self).create()
    }

    fn open(&self) -> StorageResult<Box<dyn ReadHandle>> {
        (**self).open()
    }

    fn remove(&self) -> StorageResult<()> {
        (**self).remove()
    }

    fn recreate_policy(&self) -> RecreatePolicy {
        (**self).recreate_policy()
    }

    fn remove_policy(&self) -> RemovePolicy {
        (**self).remove_policy()
    }

    fn as_random_access(&self) -> Option<&dyn RandomAccessBackend> {
        (**self).as_random_access()
    }

    fn as_seekable(&self) -> Option<&dyn SeekableBackend> {
        (**self).as_seekable()
    }
}
