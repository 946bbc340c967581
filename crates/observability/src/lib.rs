//! Tracing/logging setup shared by splitledger binaries.

/// Environment variable selecting the log format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "SPLITLEDGER_LOG_FORMAT";

/// Initialize process-wide logging, JSON unless `SPLITLEDGER_LOG_FORMAT` says otherwise.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    let format = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|raw| tracing::LogFormat::parse(&raw))
        .unwrap_or_default();
    tracing::init(format);
}

/// Subscriber configuration (filters, formats).
pub mod tracing;
