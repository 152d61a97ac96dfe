//! Conformance suite configuration.

/// Configuration for a conformance run.
#[derive(Debug, Clone)]
pub struct ConformanceConfig {
    /// Payload lengths used by the round-trip check. Include 0 to cover the
    /// empty location.
    pub payload_sizes: Vec<usize>,

    /// Payload length used by the single-payload checks.
    pub payload_len: usize,

    /// Buffer size for chunked sequential reads.
    pub read_chunk: usize,

    /// Number of reader threads in the concurrent read check.
    pub concurrent_readers: usize,

    /// Payload length for the concurrent read check.
    pub concurrent_payload_len: usize,

    /// Number of random (offset, length) pairs in the random-access check.
    pub random_access_probes: usize,

    /// Seed for payload contents and probe positions.
    pub seed: u64,
}

impl Default for ConformanceConfig {
    fn default() -> Self {
        Self {
            payload_sizes: vec![0, 1, 17, 4096, 65_537],
            payload_len: 10_000,
            read_chunk: 7,
            concurrent_readers: 8,
            concurrent_payload_len: 1024 * 1024, // 1 MiB
            random_access_probes: 64,
            seed: 0x5EED_5EED,
        }
    }
}

impl ConformanceConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for fast runs against slow backends.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            payload_sizes: vec![0, 1, 513],
            payload_len: 1024,
            concurrent_readers: 4,
            concurrent_payload_len: 64 * 1024,
            random_access_probes: 16,
            ..Self::default()
        }
    }

    /// Sets the round-trip payload lengths.
    #[must_use]
    pub fn payload_sizes(mut self, sizes: impl Into<Vec<usize>>) -> Self {
        self.payload_sizes = sizes.into();
        self
    }

    /// Sets the single-payload length.
    #[must_use]
    pub fn payload_len(mut self, len: usize) -> Self {
        self.payload_len = len;
        self
    }

    /// Sets the chunk size for sequential reads. Zero is raised to one.
    #[must_use]
    pub fn read_chunk(mut self, chunk: usize) -> Self {
        self.read_chunk = if chunk == 0 { 1 } else { chunk };
        self
    }

    /// Sets the number of concurrent readers.
    #[must_use]
    pub fn concurrent_readers(mut self, readers: usize) -> Self {
        self.concurrent_readers = readers;
        self
    }

    /// Sets the concurrent read payload length.
    #[must_use]
    pub fn concurrent_payload_len(mut self, len: usize) -> Self {
        self.concurrent_payload_len = len;
        self
    }

    /// Sets the number of random-access probes.
    #[must_use]
    pub fn random_access_probes(mut self, probes: usize) -> Self {
        self.random_access_probes = probes;
        self
    }

    /// Sets the seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
