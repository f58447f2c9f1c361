//! Request-cycle middleware.
//!
//! # Ordering
//! ```text
//! access_middleware            (outer: times the cycle, logs one Info record)
//!     → recovery_middleware    (inner: turns a panic into a log record + response)
//!         → handler
//! ```
//! With axum, `.layer(recovery).layer(access)` yields this order, since the
//! last layer added is the outermost.

pub mod access;
pub mod recovery;

pub use access::{access_middleware, access_middleware_with, AccessMiddleware};
pub use recovery::{
    classify, describe, recovery_middleware, recovery_middleware_with, PanicClass, RecoveryConfig, RecoveryMiddleware,
};
