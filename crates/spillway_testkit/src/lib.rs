//! # Spillway Testkit
//!
//! Conformance suite and test doubles for spillway storage backends.
//!
//! This crate provides:
//! - [`ConformanceSuite`], runnable against any [`spillway_storage::Backend`]
//! - Test-double backends ([`MemoryBackend`], [`SequentialOnly`], [`FaultyBackend`])
//! - Deterministic payloads and proptest strategies
//! - Test logging setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spillway_testkit::prelude::*;
//!
//! #[test]
//! fn my_backend_conforms() {
//!     init_test_logging();
//!     ConformanceSuite::new(MyBackend::new).assert_conformant();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod conformance;
pub mod fixtures;
pub mod generators;
pub mod logging;
pub mod report;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::conformance::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use crate::report::*;
}

pub use config::*;
pub use conformance::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
pub use report::*;
