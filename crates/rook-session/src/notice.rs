//! Notice sink: where human-readable failures go.

use tracing::warn;

/// Receives user-facing failure messages.
pub trait NoticeSink {
    /// Show `message` to the user.
    fn notify(&self, message: &str);
}

/// Logs every notice at `warn` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNoticeSink;

impl NoticeSink for TracingNoticeSink {
    fn notify(&self, message: &str) {
        warn!(target: "rook::notice", "{message}");
    }
}

impl<F: Fn(&str)> NoticeSink for F {
    fn notify(&self, message: &str) {
        self(message)
    }
}
