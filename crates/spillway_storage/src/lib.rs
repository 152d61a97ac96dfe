//! # Spillway Storage
//!
//! Capability contract for the storage backends a hybrid memory/disk buffer
//! spills into.
//!
//! A backend instance owns exactly **one** opaque storage location. It can
//! create it, open it for reading and remove it. Backends do not interpret
//! the bytes they store and do not retry, log or swallow errors.
//!
//! ## Capabilities
//!
//! - [`Backend`] - base capability: `create`, `open`, `remove`
//! - [`RandomAccessBackend`] - optional: reads addressed by byte offset
//! - [`SeekableBackend`] - optional: a stream with a movable cursor
//!
//! The extensions are probed at runtime through [`Backend::as_random_access`]
//! and [`Backend::as_seekable`]; [`ReadAccess`] wraps the usual fallback.
//!
//! ## Lifecycle
//!
//! `Uncreated -> Writing -> Readable -> Removed`, modelled by
//! [`LocationState`].
//!
//! ## Example
//!
//! ```rust
//! use spillway_storage::{Backend, ReadAccess};
//! use std::io::{Read, Write};
//!
//! fn spill(backend: &dyn Backend, bytes: &[u8]) -> spillway_storage::StorageResult<Vec<u8>> {
//!     let mut writer = backend.create()?;
//!     writer.write_all(bytes)?;
//!     writer.close()?;
//!
//!     let mut out = Vec::new();
//!     ReadAccess::open(backend)?.into_read().read_to_end(&mut out)?;
//!     Ok(out)
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod capability;
mod error;
mod state;

pub use backend::{Backend, ReadHandle, WriteHandle};
pub use capability::{
    capabilities, supports_random_access, supports_seeking, Capability, RandomAccessBackend,
    ReadAccess, ReaderAt, ReaderAtStream, SeekHandle, SeekableBackend,
};
pub use error::{ErrorKind, StorageError, StorageResult};
pub use state::{LocationState, RecreatePolicy, RemovePolicy};
