//! Payload generators.
//!
//! Deterministic payloads for the conformance suite and proptest strategies
//! for property tests against any backend.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::io::SeekFrom;

/// Returns `len` pseudo-random bytes determined by `seed`.
pub fn pseudo_random_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut payload = vec![0u8; len];
    rng.fill_bytes(&mut payload);
    payload
}

/// Returns `count` (offset, length) pairs inside a payload of `len` bytes.
///
/// Always includes the first and last byte so short runs still touch both
/// edges. Empty payloads produce no probes.
pub fn range_probes(len: usize, count: usize, seed: u64) -> Vec<(usize, usize)> {
    if len == 0 {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut probes = vec![(0, len), (len - 1, 1), (len / 2, len - len / 2)];
    for _ in 0..count {
        let offset = rng.gen_range(0..len);
        let max = len - offset;
        probes.push((offset, rng.gen_range(1..=max)));
    }
    probes
}

/// Strategy for generating payloads up to `max_len` bytes, empty included.
pub fn payload_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Strategy for a payload plus a read offset and length.
///
/// Offsets range from slightly negative to slightly past the end so every
/// edge case comes up.
pub fn payload_and_range_strategy(max_len: usize) -> impl Strategy<Value = (Vec<u8>, i64, usize)> {
    payload_strategy(max_len).prop_flat_map(|payload| {
        let len = payload.len() as i64;
        (Just(payload), -8i64..=len + 8, 0usize..64)
    })
}

/// Strategy for a payload plus a seek target.
pub fn payload_and_seek_strategy(max_len: usize) -> impl Strategy<Value = (Vec<u8>, SeekFrom)> {
    payload_strategy(max_len).prop_flat_map(|payload| {
        let len = payload.len() as i64;
        let target = prop_oneof![
            (0u64..=(len as u64) + 8).prop_map(SeekFrom::Start),
            (-len - 8..=8i64).prop_map(SeekFrom::End),
            (-8i64..=len + 8).prop_map(SeekFrom::Current),
        ];
        (Just(payload), target)
    })
}

/// Environment variable that overrides the property test case count.
pub const PROPTEST_CASES_ENV: &str = "SPILLWAY_PROPTEST_CASES";

/// Case budget for the property tests run against a backend.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Small budget for backends that are cheap to build.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// [`PropTestConfig::quick`], with the case count taken from
    /// [`PROPTEST_CASES_ENV`] when it is set to a positive number.
    #[must_use]
    pub fn from_env() -> Self {
        Self::quick().with_cases_override(std::env::var(PROPTEST_CASES_ENV).ok().as_deref())
    }

    fn with_cases_override(mut self, raw: Option<&str>) -> Self {
        match raw.map(str::trim).map(str::parse::<u32>) {
            Some(Ok(cases)) if cases > 0 => self.cases = cases,
            _ => {}
        }
        self
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_deterministic() {
        assert_eq!(pseudo_random_payload(64, 7), pseudo_random_payload(64, 7));
        assert_ne!(pseudo_random_payload(64, 7), pseudo_random_payload(64, 8));
        assert!(pseudo_random_payload(0, 1).is_empty());
    }

    #[test]
    fn probes_cover_edges() {
        let probes = range_probes(100, 10, 3);
        assert!(probes.contains(&(0, 100)));
        assert!(probes.contains(&(99, 1)));
        assert_eq!(probes.len(), 13);
        assert!(range_probes(0, 10, 3).is_empty());
    }

    #[test]
    fn cases_override_ignores_garbage() {
        let quick = PropTestConfig::quick().cases;
        assert_eq!(PropTestConfig::quick().with_cases_override(None).cases, quick);
        assert_eq!(PropTestConfig::quick().with_cases_override(Some("0")).cases, quick);
        assert_eq!(PropTestConfig::quick().with_cases_override(Some("many")).cases, quick);
        assert_eq!(PropTestConfig::quick().with_cases_override(Some(" 500 ")).cases, 500);
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn probes_stay_in_bounds(len in 1usize..500, seed in any::<u64>()) {
            for (offset, n) in range_probes(len, 8, seed) {
                prop_assert!(n >= 1);
                prop_assert!(offset + n <= len);
            }
        }

        #[test]
        fn range_strategy_offsets_near_payload((payload, offset, _n) in payload_and_range_strategy(32)) {
            prop_assert!(offset >= -8);
            prop_assert!(offset <= payload.len() as i64 + 8);
        }
    }
}
