//! Test logging setup.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that writes through the test harness.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. Calling this more
/// than once is harmless.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::info!("logging initialized twice");
    }
}
