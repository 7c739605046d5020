//! Process-wide tracing setup shared by the API binary and client tooling.

/// Initialize tracing/logging.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filter, output format).
pub mod tracing;

pub use tracing::LogFormat;
