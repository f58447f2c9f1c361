//! HTTP request-cycle subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, routes)
//!     → middleware/access.rs (start timer, attach RequestErrors)
//!     → middleware/recovery.rs (snapshot head, guard the handler)
//!     → handler
//!     → response.rs (500 or aborted marker on fault)
//!     → access record emitted with the final status
//! ```

pub mod context;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use context::{ErrorKind, RequestError, RequestErrors};
pub use middleware::{
    access_middleware, access_middleware_with, recovery_middleware, recovery_middleware_with, AccessMiddleware,
    RecoveryMiddleware,
};
pub use request::RequestSnapshot;
pub use response::ConnectionAborted;
pub use server::HttpServer;
