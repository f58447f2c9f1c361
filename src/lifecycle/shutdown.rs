//! Flush-on-exit for the log files.

use crate::logging;

/// Flushes the process-wide registry's file sinks when dropped.
///
/// Hold one in `main` so the flush also happens on `?` returns and while
/// unwinding from a panic.
#[must_use = "dropping the guard immediately flushes and detaches the file writers"]
#[derive(Debug, Default)]
pub struct SyncOnDrop {
    _private: (),
}

impl SyncOnDrop {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Drop for SyncOnDrop {
    fn drop(&mut self) {
        let _ = logging::sync_logger();
    }
}
