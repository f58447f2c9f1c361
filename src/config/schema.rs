//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::rolling::FilePattern;

/// Environment the service runs in. Decides which sinks each core gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    /// `"prod"`: console plus file@Info (general) and file@Error (error).
    Production,
    /// `"test"`: console plus file@Debug (general) and file@Error (error).
    Test,
    /// Anything else: console only.
    #[default]
    Development,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Production => "prod",
            Mode::Test => "test",
            Mode::Development => "dev",
        }
    }
}

impl From<&str> for Mode {
    fn from(value: &str) -> Self {
        match value {
            "prod" => Mode::Production,
            "test" => Mode::Test,
            _ => Mode::Development,
        }
    }
}

impl From<String> for Mode {
    fn from(value: String) -> Self {
        Mode::from(value.as_str())
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often the file collaborator starts a new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Minutely,
    Hourly,
    Daily,
    Never,
}

impl RotationPolicy {
    /// Length of one rotation period, `None` for a single unrotated file.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            RotationPolicy::Minutely => Some(Duration::from_secs(60)),
            RotationPolicy::Hourly => Some(Duration::from_secs(60 * 60)),
            RotationPolicy::Daily => Some(Duration::from_secs(24 * 60 * 60)),
            RotationPolicy::Never => None,
        }
    }
}

/// Root logging configuration.
///
/// Both file streams live in `directory`. With the defaults the general
/// stream writes `zap-<YYYYMMDDHHMM>.log` behind the link `zap.log`, and the
/// error stream writes `zap-<YYYYMMDDHHMM>-error.log` behind `zap-error.log`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Environment mode (`"prod"`, `"test"`, anything else).
    pub mode: Mode,

    /// Directory holding both file streams.
    pub directory: PathBuf,

    /// File name prefix shared by both streams.
    pub file_prefix: String,

    /// Tag that sets error-stream file names apart.
    pub error_tag: String,

    /// Rotation interval.
    pub rotation: RotationPolicy,

    /// Files whose period began longer ago than this are removed.
    pub max_age_days: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            directory: PathBuf::from("./log"),
            file_prefix: "zap".to_string(),
            error_tag: "error".to_string(),
            rotation: RotationPolicy::default(),
            max_age_days: 7,
        }
    }
}

impl LogConfig {
    /// Defaults with the given environment mode string.
    pub fn for_mode(mode: &str) -> Self {
        Self {
            mode: Mode::from(mode),
            ..Self::default()
        }
    }

    /// Retention window as a duration.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(u64::from(self.max_age_days) * 24 * 60 * 60)
    }

    pub fn general_pattern(&self) -> FilePattern {
        FilePattern::new(self.file_prefix.as_str())
    }

    pub fn error_pattern(&self) -> FilePattern {
        FilePattern::tagged(self.file_prefix.as_str(), self.error_tag.as_str())
    }
}
