//! Process-wide tracing setup shared by engine binaries.

/// Tracing subscriber configuration.
pub mod tracing;

/// Initialize process-wide logging.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init();
}
