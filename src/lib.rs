//! Leveled logging for a web service: general and error streams, console
//! and rotating-file sinks, plus access-log and panic-recovery middleware.
//!
//! ```text
//! init_logger("prod")
//!     general core: console@Debug + file@Info
//!     error core:   console@Debug + file@Error
//!
//! request → access_middleware → recovery_middleware → handler
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod logging;

pub use config::{LogConfig, Mode};
pub use error::LogError;
pub use http::{access_middleware, recovery_middleware, HttpServer};
pub use logging::{
    error_logger, init_logger, init_logger_from_file, init_logger_with, logger, sugar_error_logger, sugar_logger,
    sync_logger, Logger, LoggerRegistry, Severity, SugaredLogger,
};
