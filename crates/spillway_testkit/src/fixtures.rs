//! Test-double backends and helpers.
//!
//! These backends exist to exercise the conformance suite and the capability
//! probing in callers. They are not meant to spill real data.

use parking_lot::RwLock;
use spillway_storage::{
    Backend, ErrorKind, LocationState, RandomAccessBackend, ReadHandle, ReaderAt, RecreatePolicy,
    RemovePolicy, SeekHandle, SeekableBackend, StorageError, StorageResult, WriteHandle,
};
use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

#[derive(Debug)]
struct Location {
    state: LocationState,
    data: Arc<[u8]>,
    generation: u64,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            state: LocationState::Uncreated,
            data: Arc::from(Vec::new()),
            generation: 0,
        }
    }
}

/// An in-memory backend advertising every capability.
///
/// Written bytes are buffered in the write handle and published on `close`.
/// Read handles share the published bytes, so any number of them can run
/// concurrently with independent cursors.
///
/// # Example
///
/// ```rust
/// use spillway_storage::Backend;
/// use spillway_testkit::{read_all, write_payload, MemoryBackend};
///
/// let backend = MemoryBackend::new();
/// write_payload(&backend, b"spilled").unwrap();
/// assert_eq!(read_all(backend.open().unwrap()).unwrap(), b"spilled");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    location: Arc<RwLock<Location>>,
    recreate: RecreatePolicy,
    remove: RemovePolicy,
    capacity: Option<usize>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            location: Arc::default(),
            recreate: RecreatePolicy::Overwrite,
            remove: RemovePolicy::Idempotent,
            capacity: None,
        }
    }
}

impl MemoryBackend {
    /// Creates an empty backend that overwrites on re-create and removes
    /// idempotently.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the declared re-create policy.
    #[must_use]
    pub const fn with_recreate_policy(mut self, policy: RecreatePolicy) -> Self {
        self.recreate = policy;
        self
    }

    /// Sets the declared remove policy.
    #[must_use]
    pub const fn with_remove_policy(mut self, policy: RemovePolicy) -> Self {
        self.remove = policy;
        self
    }

    /// Caps the number of bytes one write handle accepts.
    ///
    /// Writes past the cap fail with `ResourceExhausted`.
    #[must_use]
    pub const fn with_capacity_limit(mut self, bytes: usize) -> Self {
        self.capacity = Some(bytes);
        self
    }

    /// Current lifecycle state of the location.
    #[must_use]
    pub fn state(&self) -> LocationState {
        self.location.read().state
    }

    fn published(&self) -> StorageResult<Arc<[u8]>> {
        let location = self.location.read();
        location.state.check_readable()?;
        Ok(Arc::clone(&location.data))
    }
}

impl Backend for MemoryBackend {
    fn create(&self) -> StorageResult<Box<dyn WriteHandle>> {
        let mut location = self.location.write();
        location.state.begin_create(self.recreate)?;
        location.generation += 1;
        location.data = Arc::from(Vec::new());

        Ok(Box::new(MemoryWriter {
            location: Arc::clone(&self.location),
            generation: location.generation,
            buf: Vec::new(),
            capacity: self.capacity,
        }))
    }

    fn open(&self) -> StorageResult<Box<dyn ReadHandle>> {
        Ok(Box::new(Cursor::new(self.published()?)))
    }

    fn remove(&self) -> StorageResult<()> {
        let mut location = self.location.write();
        location.state.remove(self.remove)?;
        location.data = Arc::from(Vec::new());
        Ok(())
    }

    fn recreate_policy(&self) -> RecreatePolicy {
        self.recreate
    }

    fn remove_policy(&self) -> RemovePolicy {
        self.remove
    }

    fn as_random_access(&self) -> Option<&dyn RandomAccessBackend> {
        Some(self)
    }

    fn as_seekable(&self) -> Option<&dyn SeekableBackend> {
        Some(self)
    }
}

impl RandomAccessBackend for MemoryBackend {
    fn open_reader_at(&self) -> StorageResult<Box<dyn ReaderAt>> {
        Ok(Box::new(MemoryReaderAt {
            data: self.published()?,
        }))
    }
}

impl SeekableBackend for MemoryBackend {
    fn open_seeker(&self) -> StorageResult<Box<dyn SeekHandle>> {
        Ok(Box::new(Cursor::new(self.published()?)))
    }
}

struct MemoryWriter {
    location: Arc<RwLock<Location>>,
    generation: u64,
    buf: Vec<u8>,
    capacity: Option<usize>,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(capacity) = self.capacity {
            if self.buf.len() + buf.len() > capacity {
                return Err(StorageError::ResourceExhausted(format!(
                    "write of {} bytes exceeds capacity {capacity}",
                    self.buf.len() + buf.len()
                ))
                .into());
            }
        }
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteHandle for MemoryWriter {
    fn close(self: Box<Self>) -> StorageResult<()> {
        let this = *self;
        let mut location = this.location.write();
        if location.generation != this.generation {
            return Err(StorageError::InvalidArgument(
                "write handle superseded by a later create".to_string(),
            ));
        }
        location.state.finish_write()?;
        location.data = Arc::from(this.buf);
        Ok(())
    }
}

struct MemoryReaderAt {
    data: Arc<[u8]>,
}

impl ReaderAt for MemoryReaderAt {
    fn read_at(&self, buf: &mut [u8], offset: i64) -> StorageResult<usize> {
        let start =
            usize::try_from(offset).map_err(|_| StorageError::negative_offset(offset))?;
        if start >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }
}

/// Wraps a backend and hides its optional capabilities.
///
/// Lets tests drive the sequential-only fallback path of a caller against a
/// backend that would otherwise advertise random access or seeking.
#[derive(Debug, Clone, Default)]
pub struct SequentialOnly<B> {
    inner: B,
}

impl<B: Backend> SequentialOnly<B> {
    /// Wraps `inner`.
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    /// Returns the wrapped backend.
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: Backend> Backend for SequentialOnly<B> {
    fn create(&self) -> StorageResult<Box<dyn WriteHandle>> {
        self.inner.create()
    }

    fn open(&self) -> StorageResult<Box<dyn ReadHandle>> {
        self.inner.open()
    }

    fn remove(&self) -> StorageResult<()> {
        self.inner.remove()
    }

    fn recreate_policy(&self) -> RecreatePolicy {
        self.inner.recreate_policy()
    }

    fn remove_policy(&self) -> RemovePolicy {
        self.inner.remove_policy()
    }
}

/// A backend whose every operation fails with one error kind.
///
/// Used to check that callers surface backend errors unchanged.
#[derive(Debug, Clone, Copy)]
pub struct FaultyBackend {
    kind: ErrorKind,
}

impl FaultyBackend {
    /// Creates a backend failing with `kind`.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    fn fail<T>(&self, op: &str) -> StorageResult<T> {
        Err(StorageError::from_kind(self.kind, format!("injected {op} failure")))
    }
}

impl Backend for FaultyBackend {
    fn create(&self) -> StorageResult<Box<dyn WriteHandle>> {
        self.fail("create")
    }

    fn open(&self) -> StorageResult<Box<dyn ReadHandle>> {
        self.fail("open")
    }

    fn remove(&self) -> StorageResult<()> {
        self.fail("remove")
    }

    fn recreate_policy(&self) -> RecreatePolicy {
        RecreatePolicy::Reject
    }

    fn remove_policy(&self) -> RemovePolicy {
        RemovePolicy::NotFoundOnRepeat
    }
}

/// Creates the location, writes `payload` and closes the handle.
///
/// # Errors
///
/// Propagates any error from `create`, the writes, or `close`.
pub fn write_payload<B: Backend + ?Sized>(backend: &B, payload: &[u8]) -> StorageResult<()> {
    let mut writer = backend.create()?;
    writer.write_all(payload)?;
    writer.close()
}

/// Drains a read handle to the end.
///
/// # Errors
///
/// Propagates the first read error.
pub fn read_all<R: Read>(mut reader: R) -> StorageResult<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

/// Returns the error kind of a failed result, or `None` on success.
///
/// Handy for results whose `Ok` type has no `Debug` impl.
pub fn err_kind<T>(result: StorageResult<T>) -> Option<ErrorKind> {
    result.err().map(|e| e.kind())
}

/// Runs `f` against a fresh [`MemoryBackend`] holding `payload`.
pub fn with_memory_backend<F, R>(payload: &[u8], f: F) -> R
where
    F: FnOnce(&MemoryBackend) -> R,
{
    let backend = MemoryBackend::new();
    write_payload(&backend, payload).expect("Failed to write payload");
    f(&backend)
}
