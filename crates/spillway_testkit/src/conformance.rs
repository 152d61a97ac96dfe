//! Conformance suite runnable against any [`Backend`].
//!
//! Every check builds fresh backend instances from a factory, since one
//! instance owns exactly one storage location. Checks for optional
//! capabilities are skipped by [`ConformanceSuite::run_all`] when the backend
//! does not advertise them.
//!
//! ```rust
//! use spillway_testkit::{ConformanceConfig, ConformanceSuite, MemoryBackend};
//!
//! let suite = ConformanceSuite::with_config(MemoryBackend::new, ConformanceConfig::quick());
//! let report = suite.run_all();
//! assert!(report.is_conformant(), "{report}");
//! ```

use crate::config::ConformanceConfig;
use crate::fixtures::{read_all, write_payload};
use crate::generators::{pseudo_random_payload, range_probes};
use crate::report::{CheckOutcome, ConformanceReport};
use spillway_storage::{
    supports_random_access, supports_seeking, Backend, Capability, ErrorKind, ReaderAtStream,
    RecreatePolicy, RemovePolicy, StorageError, StorageResult,
};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

/// Result type for conformance checks.
pub type ConformanceResult<T> = Result<T, ConformanceError>;

/// A property the backend under test violated.
#[derive(Debug, Error)]
pub enum ConformanceError {
    /// An operation that should succeed failed.
    #[error("{check}: backend error during {step}: {source}")]
    Backend {
        /// Check name.
        check: &'static str,
        /// Operation that failed.
        step: &'static str,
        /// The backend's error.
        #[source]
        source: StorageError,
    },

    /// Read bytes differ from written bytes.
    #[error("{check}: content mismatch at byte {offset} (expected {expected_len} bytes, got {actual_len})")]
    Mismatch {
        /// Check name.
        check: &'static str,
        /// Absolute offset of the first differing byte.
        offset: usize,
        /// Expected length of the compared range.
        expected_len: usize,
        /// Actual length of the compared range.
        actual_len: usize,
    },

    /// An operation failed with the wrong kind of error.
    #[error("{check}: {step} should fail with one of {expected:?}, got {actual}")]
    WrongErrorKind {
        /// Check name.
        check: &'static str,
        /// Operation that failed.
        step: &'static str,
        /// Acceptable kinds.
        expected: &'static [ErrorKind],
        /// Kind actually returned.
        actual: ErrorKind,
    },

    /// An operation that should fail succeeded.
    #[error("{check}: {step} succeeded but should fail with one of {expected:?}")]
    UnexpectedSuccess {
        /// Check name.
        check: &'static str,
        /// Operation that succeeded.
        step: &'static str,
        /// Kinds it should have failed with.
        expected: &'static [ErrorKind],
    },

    /// Any other broken invariant.
    #[error("{check}: {message}")]
    Violation {
        /// Check name.
        check: &'static str,
        /// What went wrong.
        message: String,
    },

    /// The check needs a capability the backend does not advertise.
    #[error("{check}: capability not advertised")]
    Unsupported {
        /// Check name.
        check: &'static str,
    },

    /// A reader thread panicked.
    #[error("{check}: reader {reader} panicked")]
    ReaderPanicked {
        /// Check name.
        check: &'static str,
        /// Index of the reader.
        reader: usize,
    },
}

const NOT_READABLE: &[ErrorKind] = &[ErrorKind::NotFound, ErrorKind::NotReady];
const NOT_FOUND: &[ErrorKind] = &[ErrorKind::NotFound];
const INVALID_ARGUMENT: &[ErrorKind] = &[ErrorKind::InvalidArgument];
const ALREADY_EXISTS: &[ErrorKind] = &[ErrorKind::AlreadyExists];

type Check<S> = fn(&S) -> ConformanceResult<()>;

fn step<T, E: Into<StorageError>>(
    check: &'static str,
    step: &'static str,
    result: Result<T, E>,
) -> ConformanceResult<T> {
    result.map_err(|e| ConformanceError::Backend {
        check,
        step,
        source: e.into(),
    })
}

fn expect_failure<T>(
    check: &'static str,
    step: &'static str,
    result: StorageResult<T>,
    expected: &'static [ErrorKind],
) -> ConformanceResult<()> {
    match result {
        Ok(_) => Err(ConformanceError::UnexpectedSuccess {
            check,
            step,
            expected,
        }),
        Err(e) if expected.contains(&e.kind()) => Ok(()),
        Err(e) => Err(ConformanceError::WrongErrorKind {
            check,
            step,
            expected,
            actual: e.kind(),
        }),
    }
}

/// Compares `actual` against `expected`, both starting at absolute `base`.
fn compare_at(
    check: &'static str,
    base: usize,
    expected: &[u8],
    actual: &[u8],
) -> ConformanceResult<()> {
    if expected == actual {
        return Ok(());
    }
    let first_diff = expected
        .iter()
        .zip(actual)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| expected.len().min(actual.len()));
    Err(ConformanceError::Mismatch {
        check,
        offset: base + first_diff,
        expected_len: expected.len(),
        actual_len: actual.len(),
    })
}

fn violation(check: &'static str, message: String) -> ConformanceError {
    ConformanceError::Violation { check, message }
}

/// Reads to the end with a fixed buffer size.
fn read_chunked<R: Read + ?Sized>(reader: &mut R, chunk: usize) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; chunk.max(1)];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(out),
            Ok(n) => out.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Conformance checks over backends produced by a factory.
pub struct ConformanceSuite<F> {
    factory: F,
    config: ConformanceConfig,
}

impl<F, B> ConformanceSuite<F>
where
    F: Fn() -> B,
    B: Backend,
{
    /// Creates a suite with the default configuration.
    pub fn new(factory: F) -> Self {
        Self::with_config(factory, ConformanceConfig::default())
    }

    /// Creates a suite with an explicit configuration.
    pub fn with_config(factory: F, config: ConformanceConfig) -> Self {
        Self { factory, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ConformanceConfig {
        &self.config
    }

    fn payload(&self, len: usize, salt: u64) -> Vec<u8> {
        pseudo_random_payload(len, self.config.seed ^ salt)
    }

    fn written(&self, check: &'static str, payload: &[u8]) -> ConformanceResult<B> {
        let backend = (self.factory)();
        step(check, "create+write+close", write_payload(&backend, payload))?;
        Ok(backend)
    }

    /// Create, write, close, then open and read back, for every configured
    /// payload length including empty.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn round_trip(&self) -> ConformanceResult<()> {
        const CHECK: &str = "round_trip";
        for (i, &len) in self.config.payload_sizes.iter().enumerate() {
            debug!(len, "round trip");
            let payload = self.payload(len, i as u64);
            let backend = self.written(CHECK, &payload)?;
            let handle = step(CHECK, "open", backend.open())?;
            let actual = step(CHECK, "read", read_all(handle))?;
            compare_at(CHECK, 0, &payload, &actual)?;
        }
        Ok(())
    }

    /// Sequential reads in small chunks never skip or repeat bytes, and
    /// end-of-data arrives exactly at the payload length and stays.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn sequential_exactness(&self) -> ConformanceResult<()> {
        const CHECK: &str = "sequential_exactness";
        let payload = self.payload(self.config.payload_len, 0x51);
        let backend = self.written(CHECK, &payload)?;
        let mut handle = step(CHECK, "open", backend.open())?;

        let mut buf = vec![0u8; self.config.read_chunk.max(1)];
        let mut pos = 0usize;
        loop {
            let n = match handle.read(&mut buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => step(CHECK, "read", other)?,
            };
            if n == 0 {
                break;
            }
            if pos + n > payload.len() {
                return Err(violation(
                    CHECK,
                    format!("read {n} bytes at {pos}, past length {}", payload.len()),
                ));
            }
            compare_at(CHECK, pos, &payload[pos..pos + n], &buf[..n])?;
            pos += n;
        }

        if pos != payload.len() {
            return Err(violation(
                CHECK,
                format!("end-of-data after {pos} of {} bytes", payload.len()),
            ));
        }
        let n = step(CHECK, "read after end", handle.read(&mut buf))?;
        if n != 0 {
            return Err(violation(CHECK, format!("{n} bytes after end-of-data")));
        }
        Ok(())
    }

    /// Every open fails with not-found or not-ready before any create.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn open_before_create(&self) -> ConformanceResult<()> {
        const CHECK: &str = "open_before_create";
        let backend = (self.factory)();
        self.expect_unreadable(CHECK, &backend, NOT_READABLE)
    }

    /// Every open fails while the write handle is still open, and succeeds
    /// with the full content once it is closed.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn open_while_writing(&self) -> ConformanceResult<()> {
        const CHECK: &str = "open_while_writing";
        let payload = self.payload(self.config.payload_len, 0x0B);
        let backend = (self.factory)();

        let mut writer = step(CHECK, "create", backend.create())?;
        step(CHECK, "write", writer.write_all(&payload))?;
        self.expect_unreadable(CHECK, &backend, NOT_READABLE)?;
        step(CHECK, "close", writer.close())?;

        let actual = step(CHECK, "read", read_all(step(CHECK, "open", backend.open())?))?;
        compare_at(CHECK, 0, &payload, &actual)
    }

    /// After remove, every open fails with not-found.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn remove_hides_location(&self) -> ConformanceResult<()> {
        const CHECK: &str = "remove_hides_location";
        let payload = self.payload(self.config.payload_len, 0x4E);
        let backend = self.written(CHECK, &payload)?;
        step(CHECK, "remove", backend.remove())?;
        self.expect_unreadable(CHECK, &backend, NOT_FOUND)
    }

    /// Remove is accepted while the write handle is open. Closing that
    /// handle afterwards must not bring the location back.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn remove_while_writing(&self) -> ConformanceResult<()> {
        const CHECK: &str = "remove_while_writing";
        let payload = self.payload(self.config.payload_len, 0x57);
        let backend = (self.factory)();

        let mut writer = step(CHECK, "create", backend.create())?;
        step(CHECK, "write", writer.write_all(&payload))?;
        step(CHECK, "remove", backend.remove())?;
        self.expect_unreadable(CHECK, &backend, NOT_FOUND)?;

        match writer.close() {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConformanceError::WrongErrorKind {
                    check: CHECK,
                    step: "close after remove",
                    expected: NOT_FOUND,
                    actual: e.kind(),
                })
            }
        }
        self.expect_unreadable(CHECK, &backend, NOT_FOUND)
    }

    fn expect_unreadable(
        &self,
        check: &'static str,
        backend: &B,
        expected: &'static [ErrorKind],
    ) -> ConformanceResult<()> {
        expect_failure(check, "open", backend.open(), expected)?;
        if let Some(random) = backend.as_random_access() {
            expect_failure(check, "open_reader_at", random.open_reader_at(), expected)?;
        }
        if let Some(seekable) = backend.as_seekable() {
            expect_failure(check, "open_seeker", seekable.open_seeker(), expected)?;
        }
        Ok(())
    }

    /// Offset-addressed reads return exactly the stored range, end-of-data at
    /// or past the end, and invalid-argument for negative offsets. One reader
    /// is also shared by several threads.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::Unsupported`] if the backend does not
    /// advertise random access, otherwise the first violation found.
    pub fn random_access(&self) -> ConformanceResult<()> {
        const CHECK: &str = "random_access";
        let payload = self.payload(self.config.payload_len, 0x4A);
        let len = payload.len();
        let backend = self.written(CHECK, &payload)?;
        let random = backend
            .as_random_access()
            .ok_or(ConformanceError::Unsupported { check: CHECK })?;
        let reader = step(CHECK, "open_reader_at", random.open_reader_at())?;

        let probes = range_probes(len, self.config.random_access_probes, self.config.seed);
        for &(offset, n) in &probes {
            let actual = step(CHECK, "read_at", reader.read_range(offset as i64, n))?;
            compare_at(CHECK, offset, &payload[offset..offset + n], &actual)?;
        }

        if len > 0 {
            let tail = step(CHECK, "read_at straddling end", reader.read_range(len as i64 - 1, 16))?;
            compare_at(CHECK, len - 1, &payload[len - 1..], &tail)?;
        }

        let mut buf = [0u8; 16];
        for offset in [len, len + 1, len + 4096] {
            let n = step(CHECK, "read_at past end", reader.read_at(&mut buf, offset as i64))?;
            if n != 0 {
                return Err(violation(
                    CHECK,
                    format!("read_at({offset}) returned {n} bytes past length {len}"),
                ));
            }
        }

        for offset in [-1, i64::MIN] {
            expect_failure(
                CHECK,
                "read_at negative offset",
                reader.read_at(&mut buf, offset),
                INVALID_ARGUMENT,
            )?;
        }

        debug!(probes = probes.len(), "sharing one reader across threads");
        let reader = &reader;
        let payload = &payload;
        let probes = &probes;
        thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    s.spawn(move || -> ConformanceResult<()> {
                        for &(offset, n) in probes.iter().skip(t).step_by(4) {
                            let actual = step(CHECK, "read_at", reader.read_range(offset as i64, n))?;
                            compare_at(CHECK, offset, &payload[offset..offset + n], &actual)?;
                        }
                        Ok(())
                    })
                })
                .collect();
            for (t, handle) in handles.into_iter().enumerate() {
                handle
                    .join()
                    .map_err(|_| ConformanceError::ReaderPanicked { check: CHECK, reader: t })??;
            }
            Ok(())
        })
    }

    /// Seeking in all three modes lands where asked; seeking past the end
    /// yields end-of-data; seeking to a negative position is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::Unsupported`] if the backend does not
    /// advertise seeking, otherwise the first violation found.
    pub fn seeking(&self) -> ConformanceResult<()> {
        const CHECK: &str = "seeking";
        let payload = self.payload(self.config.payload_len, 0x5E);
        let len = payload.len();
        let backend = self.written(CHECK, &payload)?;
        let seekable = backend
            .as_seekable()
            .ok_or(ConformanceError::Unsupported { check: CHECK })?;
        let mut seeker = step(CHECK, "open_seeker", seekable.open_seeker())?;

        let all = step(CHECK, "read", read_all(&mut seeker))?;
        compare_at(CHECK, 0, &payload, &all)?;

        let seek_to = |seeker: &mut dyn spillway_storage::SeekHandle,
                       target: SeekFrom,
                       expected: usize|
         -> ConformanceResult<()> {
            let pos = step(CHECK, "seek", seeker.seek(target))?;
            if pos != expected as u64 {
                return Err(violation(
                    CHECK,
                    format!("seek {target:?} landed at {pos}, expected {expected}"),
                ));
            }
            let rest = step(CHECK, "read after seek", read_all(&mut *seeker))?;
            compare_at(CHECK, expected, payload.get(expected..).unwrap_or(&[]), &rest)
        };

        for (offset, _) in range_probes(len, self.config.random_access_probes.min(16), self.config.seed) {
            seek_to(seeker.as_mut(), SeekFrom::Start(offset as u64), offset)?;
        }

        let quarter = len / 4;
        step(CHECK, "seek", seeker.seek(SeekFrom::Start(quarter as u64)))?;
        seek_to(seeker.as_mut(), SeekFrom::Current(quarter as i64), 2 * quarter)?;
        // The previous read left the cursor at the end.
        seek_to(seeker.as_mut(), SeekFrom::Current(-(quarter as i64)), len - quarter)?;
        seek_to(seeker.as_mut(), SeekFrom::End(-(quarter as i64)), len - quarter)?;
        seek_to(seeker.as_mut(), SeekFrom::End(0), len)?;

        for target in [SeekFrom::Start(len as u64 + 100), SeekFrom::End(100)] {
            step(CHECK, "seek past end", seeker.seek(target))?;
            let mut buf = [0u8; 16];
            let n = step(CHECK, "read past end", seeker.read(&mut buf))?;
            if n != 0 {
                return Err(violation(
                    CHECK,
                    format!("read after seek {target:?} returned {n} bytes"),
                ));
            }
        }

        step(CHECK, "seek", seeker.seek(SeekFrom::Start(0)))?;
        expect_failure(
            CHECK,
            "seek to negative position",
            seeker.seek(SeekFrom::Current(-1)).map_err(StorageError::from),
            INVALID_ARGUMENT,
        )?;
        expect_failure(
            CHECK,
            "seek before start",
            seeker
                .seek(SeekFrom::End(-(len as i64) - 1))
                .map_err(StorageError::from),
            INVALID_ARGUMENT,
        )
    }

    /// Several readers, using every advertised handle shape, read the same
    /// location at once and each reproduce it exactly. A reader that panics,
    /// including inside `open`, is reported as
    /// [`ConformanceError::ReaderPanicked`].
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn concurrent_reads(&self) -> ConformanceResult<()> {
        const CHECK: &str = "concurrent_reads";
        let readers = self.config.concurrent_readers.max(1);
        let payload = self.payload(self.config.concurrent_payload_len, 0xCC);
        let backend = self.written(CHECK, &payload)?;

        let mut shapes = vec![Capability::Sequential];
        if supports_random_access(&backend) {
            shapes.push(Capability::RandomAccess);
        }
        if supports_seeking(&backend) {
            shapes.push(Capability::Seeking);
        }
        debug!(readers, shapes = ?shapes, len = payload.len(), "starting concurrent readers");

        let barrier = Barrier::new(readers);
        let backend = &backend;
        let payload = &payload;
        let barrier = &barrier;
        let shapes = &shapes;
        let base_chunk = self.config.read_chunk.max(1);
        thread::scope(|s| {
            let handles: Vec<_> = (0..readers)
                .map(|i| {
                    let shape = shapes[i % shapes.len()];
                    // Different chunk sizes keep readers out of lockstep.
                    let chunk = 4096 + base_chunk * 131 * i;
                    s.spawn(move || -> ConformanceResult<()> {
                        // Every reader reaches the barrier, even one whose
                        // open panicked.
                        let opened = panic::catch_unwind(AssertUnwindSafe(|| {
                            open_shape(CHECK, backend, shape)
                        }));
                        barrier.wait();
                        let opened = opened
                            .map_err(|_| ConformanceError::ReaderPanicked { check: CHECK, reader: i })?;
                        read_shape(CHECK, opened?, chunk, payload)
                    })
                })
                .collect();
            for (i, handle) in handles.into_iter().enumerate() {
                handle
                    .join()
                    .map_err(|_| ConformanceError::ReaderPanicked { check: CHECK, reader: i })??;
            }
            Ok(())
        })
    }

    /// A second remove behaves as the backend's declared [`RemovePolicy`].
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn repeat_remove(&self) -> ConformanceResult<()> {
        const CHECK: &str = "repeat_remove";
        let payload = self.payload(self.config.payload_len, 0x77);
        let backend = self.written(CHECK, &payload)?;
        step(CHECK, "first remove", backend.remove())?;

        match backend.remove_policy() {
            RemovePolicy::Idempotent => step(CHECK, "second remove", backend.remove())?,
            RemovePolicy::NotFoundOnRepeat => {
                expect_failure(CHECK, "second remove", backend.remove(), NOT_FOUND)?
            }
        }
        expect_failure(CHECK, "open after remove", backend.open(), NOT_FOUND)
    }

    /// A second create behaves as the backend's declared [`RecreatePolicy`].
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn recreate(&self) -> ConformanceResult<()> {
        const CHECK: &str = "recreate";
        let first = self.payload(self.config.payload_len, 0x81);
        let second = self.payload(self.config.payload_len / 2 + 1, 0x82);
        let backend = self.written(CHECK, &first)?;

        let expected = match backend.recreate_policy() {
            RecreatePolicy::Overwrite => {
                step(CHECK, "second create+write+close", write_payload(&backend, &second))?;
                &second
            }
            RecreatePolicy::Reject => {
                expect_failure(CHECK, "second create", backend.create(), ALREADY_EXISTS)?;
                &first
            }
        };
        let actual = step(CHECK, "read", read_all(step(CHECK, "open", backend.open())?))?;
        compare_at(CHECK, 0, expected, &actual)
    }

    /// Runs every check and records the outcomes.
    ///
    /// Extension checks are skipped when a probe instance from the factory
    /// does not advertise the capability.
    pub fn run_all(&self) -> ConformanceReport {
        let probe = (self.factory)();
        let random = supports_random_access(&probe);
        let seeking = supports_seeking(&probe);
        drop(probe);
        info!(random_access = random, seeking, "running conformance suite");

        let checks: [(&'static str, Option<&'static str>, Check<Self>); 11] = [
            ("round_trip", None, Self::round_trip as Check<Self>),
            ("sequential_exactness", None, Self::sequential_exactness as Check<Self>),
            ("open_before_create", None, Self::open_before_create as Check<Self>),
            ("open_while_writing", None, Self::open_while_writing as Check<Self>),
            ("remove_hides_location", None, Self::remove_hides_location as Check<Self>),
            ("remove_while_writing", None, Self::remove_while_writing as Check<Self>),
            (
                "random_access",
                (!random).then_some("random access not advertised"),
                Self::random_access as Check<Self>,
            ),
            (
                "seeking",
                (!seeking).then_some("seeking not advertised"),
                Self::seeking as Check<Self>,
            ),
            ("concurrent_reads", None, Self::concurrent_reads as Check<Self>),
            ("repeat_remove", None, Self::repeat_remove as Check<Self>),
            ("recreate", None, Self::recreate as Check<Self>),
        ];

        let mut report = ConformanceReport::new();
        for (name, skip, check) in checks {
            let _span = info_span!("conformance_check", check = name).entered();
            if let Some(reason) = skip {
                debug!(reason, "skipped");
                report.record(name, CheckOutcome::Skipped(reason), Duration::ZERO);
                continue;
            }
            let start = Instant::now();
            let outcome = match check(self) {
                Ok(()) => {
                    debug!("passed");
                    CheckOutcome::Passed
                }
                Err(e) => {
                    warn!(error = %e, "conformance check failed");
                    CheckOutcome::Failed(e.to_string())
                }
            };
            report.record(name, outcome, start.elapsed());
        }

        info!(
            passed = report.passed(),
            skipped = report.skipped(),
            failed = report.failed(),
            "conformance suite finished"
        );
        report
    }

    /// Runs every check and panics with the report if any failed.
    ///
    /// # Panics
    ///
    /// Panics when the backend is not conformant.
    pub fn assert_conformant(&self) -> ConformanceReport {
        let report = self.run_all();
        assert!(report.is_conformant(), "backend is not conformant:\n{report}");
        report
    }
}

enum Opened {
    Sequential(Box<dyn spillway_storage::ReadHandle>),
    RandomAccess(ReaderAtStream),
    Seeking(Box<dyn spillway_storage::SeekHandle>),
}

fn open_shape<B: Backend + ?Sized>(
    check: &'static str,
    backend: &B,
    shape: Capability,
) -> ConformanceResult<Opened> {
    let unsupported = || ConformanceError::Unsupported { check };
    Ok(match shape {
        Capability::Sequential => Opened::Sequential(step(check, "open", backend.open())?),
        Capability::RandomAccess => {
            let random = backend.as_random_access().ok_or_else(unsupported)?;
            let reader = step(check, "open_reader_at", random.open_reader_at())?;
            Opened::RandomAccess(ReaderAtStream::new(reader))
        }
        Capability::Seeking => {
            let seekable = backend.as_seekable().ok_or_else(unsupported)?;
            Opened::Seeking(step(check, "open_seeker", seekable.open_seeker())?)
        }
    })
}

fn read_shape(
    check: &'static str,
    opened: Opened,
    chunk: usize,
    payload: &[u8],
) -> ConformanceResult<()> {
    match opened {
        Opened::Sequential(mut handle) => {
            let actual = step(check, "read", read_chunked(&mut handle, chunk))?;
            compare_at(check, 0, payload, &actual)
        }
        Opened::RandomAccess(mut stream) => {
            let actual = step(check, "read_at", read_chunked(&mut stream, chunk))?;
            compare_at(check, 0, payload, &actual)
        }
        Opened::Seeking(mut seeker) => {
            // Second half first, then rewind for the first half.
            let mid = payload.len() / 2;
            step(check, "seek", seeker.seek(SeekFrom::Start(mid as u64)))?;
            let tail = step(check, "read", read_chunked(&mut seeker, chunk))?;
            compare_at(check, mid, &payload[mid..], &tail)?;

            step(check, "seek", seeker.seek(SeekFrom::Start(0)))?;
            let mut head = vec![0u8; mid];
            step(check, "read", seeker.read_exact(&mut head))?;
            compare_at(check, 0, &payload[..mid], &head)
        }
    }
}
