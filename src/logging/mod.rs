//! Structured, leveled logging with separate general and error streams.
//!
//! # Data Flow
//! ```text
//! LogConfig
//!     → registry.rs (decide sinks per mode)
//!     → sink.rs (encoder + destination + threshold, one fmt layer each)
//!     → rolling.rs (rotating file destination with a stable link)
//!     → logger.rs (tee the sinks into one core, wrap in handles)
//!
//! log call
//!     → Logger::in_scope / SugaredLogger
//!     → every sink whose threshold the record clears
//!     → encoder.rs renders one line → console or rotating file
//! ```
//!
//! # Design Decisions
//! - Built on tracing: a core is a `Dispatch`, a sink is a filtered layer
//! - File writes are synchronous, so a flush never has to tear a sink down
//! - A file sink that cannot be opened is dropped, never fatal

pub mod capture;
pub mod encoder;
pub mod logger;
pub mod registry;
pub mod rolling;
pub mod severity;
pub mod sink;

pub use logger::{Logger, LoggerCore, SugaredLogger};
pub use registry::{
    error_logger, init_logger, init_logger_from_file, init_logger_with, install, logger, registry, sugar_error_logger,
    sugar_logger, sync_logger, LoggerRegistry, LoggerSource, RegistryBuilder,
};
pub use rolling::{FilePattern, RollingFile};
pub use severity::Severity;
pub use sink::{Destination, DestinationKind, Sink, SinkInfo};
