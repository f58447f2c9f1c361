//! Record severity and its mapping onto tracing levels.

use std::fmt;

use tracing::{Level, Metadata};

/// Target carried by Fatal records. tracing has no level above ERROR, so
/// Fatal is an ERROR event under this target.
pub const FATAL_TARGET: &str = "service_log::fatal";

/// Totally ordered record severity. Thresholds compare with `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Severity of an event given its metadata. TRACE folds into Debug.
    pub fn of(meta: &Metadata<'_>) -> Self {
        match *meta.level() {
            Level::TRACE | Level::DEBUG => Severity::Debug,
            Level::INFO => Severity::Info,
            Level::WARN => Severity::Warn,
            Level::ERROR if meta.target() == FATAL_TARGET => Severity::Fatal,
            Level::ERROR => Severity::Error,
        }
    }

    /// Capitalized name as written by the encoder.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Whether a record at `self` clears a sink threshold of `min`.
    pub fn passes(&self, min: Severity) -> bool {
        *self >= min
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    #[test]
    fn thresholds_follow_total_order() {
        for (i, min) in ALL.iter().enumerate() {
            for (j, record) in ALL.iter().enumerate() {
                assert_eq!(record.passes(*min), j >= i, "{record} against {min}");
            }
        }
    }

    #[test]
    fn names_are_capitalized() {
        assert_eq!(Severity::Warn.to_string(), "WARN");
        assert_eq!(Severity::Fatal.as_str(), "FATAL");
    }
}
