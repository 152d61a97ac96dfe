//! Optional read capabilities and runtime probing.

use crate::backend::{Backend, ReadHandle};
use crate::error::{StorageError, StorageResult};
use std::io::{self, Read, Seek};

/// Largest single `read_at` issued by [`ReaderAt::read_range`].
const READ_RANGE_CHUNK: usize = 64 * 1024;

/// Reader addressed by absolute byte offset.
///
/// Implementations hold no cursor, so one reader may serve many threads at
/// once.
pub trait ReaderAt: Send + Sync {
    /// Reads up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes read. `Ok(0)` for a non-empty `buf` means
    /// `offset` is at or beyond the end of data. A short count is only
    /// returned when the read reaches the end of data.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidArgument`] for a negative `offset`, or
    /// any error from the medium.
    fn read_at(&self, buf: &mut [u8], offset: i64) -> StorageResult<usize>;

    /// Reads up to `len` bytes starting at `offset` into a new buffer.
    ///
    /// The result is shorter than `len` only when it reaches the end of data,
    /// and empty when `offset` is at or beyond it.
    ///
    /// # Errors
    ///
    /// Same as [`ReaderAt::read_at`].
    fn read_range(&self, offset: i64, len: usize) -> StorageResult<Vec<u8>> {
        if offset < 0 {
            return Err(StorageError::negative_offset(offset));
        }
        // `len` is only an upper bound; grow with the data actually present.
        let mut out = Vec::with_capacity(len.min(READ_RANGE_CHUNK));
        let mut scratch = vec![0u8; len.min(READ_RANGE_CHUNK)];
        while out.len() < len {
            let at = i64::try_from(out.len())
                .ok()
                .and_then(|f| offset.checked_add(f))
                .ok_or_else(|| StorageError::InvalidArgument("offset overflow".to_string()))?;
            let want = (len - out.len()).min(scratch.len());
            let n = self.read_at(&mut scratch[..want], at)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&scratch[..n]);
        }
        Ok(out)
    }
}

/// Sequential reader that can reposition its cursor.
///
/// Seeking past the end is allowed and makes the next read return `Ok(0)`.
/// Seeking to a negative position fails with [`io::ErrorKind::InvalidInput`].
pub trait SeekHandle: Read + Seek + Send {}

impl<T: Read + Seek + Send + ?Sized> SeekHandle for T {}

/// Backend that can serve arbitrary byte ranges.
pub trait RandomAccessBackend: Backend {
    /// Opens a random-access reader over the location.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Backend::open`].
    fn open_reader_at(&self) -> StorageResult<Box<dyn ReaderAt>>;
}

/// Backend that can serve a repositionable stream.
pub trait SeekableBackend: Backend {
    /// Opens a seekable reader positioned at offset zero.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`Backend::open`].
    fn open_seeker(&self) -> StorageResult<Box<dyn SeekHandle>>;
}

/// A read capability a backend may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Base sequential reads. Always present.
    Sequential,
    /// [`RandomAccessBackend`].
    RandomAccess,
    /// [`SeekableBackend`].
    Seeking,
}

/// Returns true if `backend` advertises random access.
pub fn supports_random_access<B: Backend + ?Sized>(backend: &B) -> bool {
    backend.as_random_access().is_some()
}

/// Returns true if `backend` advertises seeking.
pub fn supports_seeking<B: Backend + ?Sized>(backend: &B) -> bool {
    backend.as_seekable().is_some()
}

/// Lists every capability `backend` advertises, base first.
pub fn capabilities<B: Backend + ?Sized>(backend: &B) -> Vec<Capability> {
    let mut caps = vec![Capability::Sequential];
    if supports_random_access(backend) {
        caps.push(Capability::RandomAccess);
    }
    if supports_seeking(backend) {
        caps.push(Capability::Seeking);
    }
    caps
}

/// The richest read handle a backend could provide.
///
/// This is how a buffering caller falls back: seeking if advertised, then
/// random access, then plain sequential reads.
pub enum ReadAccess {
    /// Repositionable stream.
    Seekable(Box<dyn SeekHandle>),
    /// Offset-addressed reader.
    RandomAccess(Box<dyn ReaderAt>),
    /// Plain sequential stream.
    Sequential(Box<dyn ReadHandle>),
}

impl ReadAccess {
    /// Probes `backend` and opens the richest handle it supports.
    ///
    /// # Errors
    ///
    /// Propagates the open error from the chosen capability unchanged.
    pub fn open<B: Backend + ?Sized>(backend: &B) -> StorageResult<Self> {
        if let Some(seekable) = backend.as_seekable() {
            return seekable.open_seeker().map(Self::Seekable);
        }
        if let Some(random) = backend.as_random_access() {
            return random.open_reader_at().map(Self::RandomAccess);
        }
        backend.open().map(Self::Sequential)
    }

    /// The capability this handle was opened through.
    #[must_use]
    pub fn capability(&self) -> Capability {
        match self {
            Self::Seekable(_) => Capability::Seeking,
            Self::RandomAccess(_) => Capability::RandomAccess,
            Self::Sequential(_) => Capability::Sequential,
        }
    }

    /// Converts the handle into a sequential reader starting at offset zero.
    #[must_use]
    pub fn into_read(self) -> Box<dyn ReadHandle> {
        match self {
            Self::Seekable(handle) => Box::new(handle),
            Self::RandomAccess(reader) => Box::new(ReaderAtStream::new(reader)),
            Self::Sequential(handle) => handle,
        }
    }
}

impl std::fmt::Debug for ReadAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ReadAccess").field(&self.capability()).finish()
    }
}

/// Sequential [`Read`] adapter over a [`ReaderAt`].
pub struct ReaderAtStream {
    inner: Box<dyn ReaderAt>,
    pos: i64,
}

impl ReaderAtStream {
    /// Wraps `inner`, starting at offset zero.
    #[must_use]
    pub fn new(inner: Box<dyn ReaderAt>) -> Self {
        Self { inner, pos: 0 }
    }

    /// Current read offset.
    #[must_use]
    pub fn position(&self) -> i64 {
        self.pos
    }
}

impl Read for ReaderAtStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read_at(buf, self.pos)?;
        self.pos += n as i64;
        Ok(n)
    }
}
