//! Common test utilities for integration tests
//!
//! Provides shared helpers used across multiple integration test files.

/// Setup test logging
///
/// Initializes a tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
