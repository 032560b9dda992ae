//! Tracing and logging (shared setup).

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LOG_FORMAT_ENV, LogFormat, ParseLogFormatError};

/// Initialize process-wide observability (tracing/logging).
///
/// The output format comes from `MILLERP_LOG_FORMAT` (JSON when unset). This is
/// safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize with an explicit output format.
pub fn init_with(format: LogFormat) {
    tracing::init_with(format);
}
