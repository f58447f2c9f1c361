//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → init_logger → build server → serve
//!
//! Shutdown:
//!     signals.rs: SIGTERM/SIGINT → stop accepting, drain
//!     shutdown.rs: SyncOnDrop flushes buffered log files on the way out
//! ```
//!
//! # Design Decisions
//! - Flushing is tied to a guard so early returns and unwinding still flush

pub mod shutdown;
pub mod signals;

pub use shutdown::SyncOnDrop;
pub use signals::shutdown_signal;
