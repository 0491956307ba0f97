// ==========================================
// Logging initialization
// ==========================================
// Uses tracing and tracing-subscriber
// Log level configurable via environment variable
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging system
///
/// # Environment variables
/// - RUST_LOG: log level filter (default: info)
///   e.g. RUST_LOG=debug or RUST_LOG=delivery_backoffice=trace
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Initialize logging for tests
///
/// More verbose level, output routed through the test writer
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
