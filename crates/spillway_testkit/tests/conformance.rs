//! Conformance runs against the test-double backends, plus backends with
//! deliberate defects that the suite must catch.

use proptest::prelude::*;
use spillway_storage::{
    Backend, ErrorKind, LocationState, ReadAccess, ReadHandle, RecreatePolicy, RemovePolicy,
    StorageError, StorageResult, WriteHandle,
};
use spillway_testkit::prelude::*;
use std::io::{self, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn memory_backend_is_conformant_with_default_config() {
    init_test_logging();
    let report = ConformanceSuite::new(MemoryBackend::new).assert_conformant();
    report.print_summary("memory backend");
    assert_eq!(report.outcome("concurrent_reads"), Some(&CheckOutcome::Passed));
}

#[test]
fn every_policy_combination_is_conformant() {
    init_test_logging();
    for recreate in [RecreatePolicy::Overwrite, RecreatePolicy::Reject] {
        for remove in [RemovePolicy::Idempotent, RemovePolicy::NotFoundOnRepeat] {
            let suite = ConformanceSuite::with_config(
                move || {
                    MemoryBackend::new()
                        .with_recreate_policy(recreate)
                        .with_remove_policy(remove)
                },
                ConformanceConfig::quick(),
            );
            let report = suite.run_all();
            assert!(
                report.is_conformant(),
                "{recreate:?}/{remove:?} failed:\n{report}"
            );
        }
    }
}

#[test]
fn eight_readers_reproduce_one_mebibyte() {
    let config = ConformanceConfig::new()
        .concurrent_readers(8)
        .concurrent_payload_len(1 << 20)
        .seed(99);
    let suite = ConformanceSuite::with_config(MemoryBackend::new, config);
    suite.concurrent_reads().unwrap();

    let sequential = ConformanceSuite::with_config(
        || SequentialOnly::new(MemoryBackend::new()),
        ConformanceConfig::new().concurrent_readers(8),
    );
    sequential.concurrent_reads().unwrap();
}

#[test]
fn faulty_backend_errors_surface_unchanged() {
    let suite = ConformanceSuite::with_config(
        || FaultyBackend::new(ErrorKind::Unavailable),
        ConformanceConfig::quick(),
    );
    match suite.round_trip() {
        Err(ConformanceError::Backend { source, .. }) => {
            assert_eq!(source.kind(), ErrorKind::Unavailable);
        }
        other => panic!("expected backend error, got {other:?}"),
    }

    let report = suite.run_all();
    assert!(!report.is_conformant());
    assert!(report
        .failures()
        .any(|(name, msg)| name == "round_trip" && msg.contains("unavailable")));
}

#[test]
fn read_access_falls_back_when_extensions_are_hidden() {
    let backend = SequentialOnly::new(MemoryBackend::new());
    write_payload(&backend, b"fallback").unwrap();
    let access = ReadAccess::open(&backend).unwrap();
    assert_eq!(access.capability(), spillway_storage::Capability::Sequential);
    assert_eq!(read_all(access.into_read()).unwrap(), b"fallback");
}

#[test]
fn read_access_surfaces_faults_verbatim() {
    let backend = FaultyBackend::new(ErrorKind::PermissionDenied);
    assert_eq!(
        ReadAccess::open(&backend).unwrap_err().kind(),
        ErrorKind::PermissionDenied
    );
}

/// Publishes bytes as they are written, so reads succeed before close.
struct EagerBackend {
    inner: MemoryBackend,
}

struct EagerWriter {
    inner: MemoryBackend,
    written: Vec<u8>,
}

impl Write for EagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        write_payload(&self.inner, &self.written)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteHandle for EagerWriter {
    fn close(self: Box<Self>) -> StorageResult<()> {
        if self.written.is_empty() {
            write_payload(&self.inner, &[])?;
        }
        Ok(())
    }
}

impl Backend for EagerBackend {
    fn create(&self) -> StorageResult<Box<dyn WriteHandle>> {
        Ok(Box::new(EagerWriter {
            inner: self.inner.clone(),
            written: Vec::new(),
        }))
    }

    fn open(&self) -> StorageResult<Box<dyn ReadHandle>> {
        self.inner.open()
    }

    fn remove(&self) -> StorageResult<()> {
        self.inner.remove()
    }

    fn recreate_policy(&self) -> RecreatePolicy {
        RecreatePolicy::Overwrite
    }

    fn remove_policy(&self) -> RemovePolicy {
        RemovePolicy::Idempotent
    }
}

#[test]
fn suite_catches_reads_before_close() {
    let suite = ConformanceSuite::with_config(
        || EagerBackend {
            inner: MemoryBackend::new(),
        },
        ConformanceConfig::quick(),
    );
    assert!(matches!(
        suite.open_while_writing(),
        Err(ConformanceError::UnexpectedSuccess { .. })
    ));
}

/// Drops the last byte of every payload.
struct TruncatingBackend {
    inner: MemoryBackend,
}

struct TruncatingWriter {
    target: MemoryBackend,
    buf: Vec<u8>,
}

impl Write for TruncatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteHandle for TruncatingWriter {
    fn close(self: Box<Self>) -> StorageResult<()> {
        let mut buf = self.buf;
        buf.pop();
        write_payload(&self.target, &buf)
    }
}

impl Backend for TruncatingBackend {
    fn create(&self) -> StorageResult<Box<dyn WriteHandle>> {
        Ok(Box::new(TruncatingWriter {
            target: self.inner.clone(),
            buf: Vec::new(),
        }))
    }

    fn open(&self) -> StorageResult<Box<dyn ReadHandle>> {
        self.inner.open()
    }

    fn remove(&self) -> StorageResult<()> {
        self.inner.remove()
    }

    fn recreate_policy(&self) -> RecreatePolicy {
        RecreatePolicy::Overwrite
    }

    fn remove_policy(&self) -> RemovePolicy {
        RemovePolicy::Idempotent
    }
}

#[test]
fn suite_catches_lost_bytes() {
    let suite = ConformanceSuite::with_config(
        || TruncatingBackend {
            inner: MemoryBackend::new(),
        },
        ConformanceConfig::quick(),
    );
    assert!(matches!(
        suite.round_trip(),
        Err(ConformanceError::Mismatch { .. })
    ));
    assert!(!suite.run_all().is_conformant());
}

/// Declares a remove policy it does not follow.
struct MisdeclaredRemove {
    inner: MemoryBackend,
}

impl Backend for MisdeclaredRemove {
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
        RemovePolicy::NotFoundOnRepeat
    }
}

#[test]
fn suite_checks_declared_remove_policy() {
    let suite = ConformanceSuite::with_config(
        || MisdeclaredRemove {
            inner: MemoryBackend::new().with_remove_policy(RemovePolicy::Idempotent),
        },
        ConformanceConfig::quick(),
    );
    assert!(matches!(
        suite.repeat_remove(),
        Err(ConformanceError::UnexpectedSuccess { .. })
    ));
    let report = suite.run_all();
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcome("repeat_remove"),
        Some(CheckOutcome::Failed(_))
    ));
}

/// Refuses to remove a location while its writer is open.
struct BusyWhileWriting {
    inner: MemoryBackend,
}

impl Backend for BusyWhileWriting {
    fn create(&self) -> StorageResult<Box<dyn WriteHandle>> {
        self.inner.create()
    }

    fn open(&self) -> StorageResult<Box<dyn ReadHandle>> {
        self.inner.open()
    }

    fn remove(&self) -> StorageResult<()> {
        if self.inner.state() == LocationState::Writing {
            return Err(StorageError::NotReady);
        }
        self.inner.remove()
    }

    fn recreate_policy(&self) -> RecreatePolicy {
        self.inner.recreate_policy()
    }

    fn remove_policy(&self) -> RemovePolicy {
        self.inner.remove_policy()
    }
}

#[test]
fn suite_requires_remove_during_write() {
    let suite = ConformanceSuite::with_config(
        || BusyWhileWriting {
            inner: MemoryBackend::new(),
        },
        ConformanceConfig::quick(),
    );
    match suite.remove_while_writing() {
        Err(ConformanceError::Backend { step, source, .. }) => {
            assert_eq!(step, "remove");
            assert_eq!(source.kind(), ErrorKind::NotReady);
        }
        other => panic!("expected remove to be rejected, got {other:?}"),
    }

    let report = suite.run_all();
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        report.outcome("remove_while_writing"),
        Some(CheckOutcome::Failed(_))
    ));
}

#[test]
fn suite_catches_writer_republishing_after_remove() {
    let suite = ConformanceSuite::with_config(
        || TruncatingBackend {
            inner: MemoryBackend::new(),
        },
        ConformanceConfig::quick(),
    );
    assert!(matches!(
        suite.remove_while_writing(),
        Err(ConformanceError::UnexpectedSuccess { .. })
    ));
}

/// Panics on its second `open`.
struct PanicOnSecondOpen {
    inner: MemoryBackend,
    opens: AtomicUsize,
}

impl Backend for PanicOnSecondOpen {
    fn create(&self) -> StorageResult<Box<dyn WriteHandle>> {
        self.inner.create()
    }

    fn open(&self) -> StorageResult<Box<dyn ReadHandle>> {
        if self.opens.fetch_add(1, Ordering::SeqCst) == 1 {
            panic!("open failed hard");
        }
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

#[test]
fn panicking_open_is_reported_not_hung() {
    let suite = ConformanceSuite::with_config(
        || PanicOnSecondOpen {
            inner: MemoryBackend::new(),
            opens: AtomicUsize::new(0),
        },
        ConformanceConfig::quick().concurrent_readers(4),
    );
    assert!(matches!(
        suite.concurrent_reads(),
        Err(ConformanceError::ReaderPanicked { .. })
    ));
}

proptest! {
    #![proptest_config(PropTestConfig::from_env().to_proptest_config())]

    #[test]
    fn reader_at_matches_slice((payload, offset, n) in payload_and_range_strategy(256)) {
        let backend = MemoryBackend::new();
        write_payload(&backend, &payload).unwrap();
        let reader = backend.as_random_access().unwrap().open_reader_at().unwrap();

        match reader.read_range(offset, n) {
            Ok(actual) => {
                prop_assert!(offset >= 0);
                let start = (offset as usize).min(payload.len());
                let end = (start + n).min(payload.len());
                prop_assert_eq!(actual, payload[start..end].to_vec());
            }
            Err(e) => {
                prop_assert!(offset < 0);
                prop_assert_eq!(e.kind(), ErrorKind::InvalidArgument);
            }
        }
    }

    #[test]
    fn seeker_matches_model((payload, target) in payload_and_seek_strategy(256)) {
        let backend = MemoryBackend::new();
        write_payload(&backend, &payload).unwrap();
        let mut seeker = backend.as_seekable().unwrap().open_seeker().unwrap();

        let len = payload.len() as i64;
        let expected = match target {
            SeekFrom::Start(o) => o as i64,
            SeekFrom::End(d) => len + d,
            SeekFrom::Current(d) => d,
        };

        match seeker.seek(target) {
            Ok(pos) => {
                prop_assert!(expected >= 0);
                prop_assert_eq!(pos as i64, expected);
                let rest = read_all(&mut seeker).unwrap();
                let start = (pos as usize).min(payload.len());
                prop_assert_eq!(rest, payload[start..].to_vec());
            }
            Err(e) => {
                prop_assert!(expected < 0);
                prop_assert_eq!(e.kind(), io::ErrorKind::InvalidInput);
            }
        }
    }

    #[test]
    fn round_trip_any_payload(payload in payload_strategy(2048)) {
        let backend = MemoryBackend::new();
        write_payload(&backend, &payload).unwrap();
        prop_assert_eq!(read_all(backend.open().unwrap()).unwrap(), payload);
    }
}
