//! Response markers and constructors used by the recovery layer.

use axum::http::{Response, StatusCode};

/// Set on the response when the peer connection was already gone. No status
/// was chosen for it and nothing useful can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionAborted;

/// Empty-bodied response with the given status.
pub fn empty<B: Default>(status: StatusCode) -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = status;
    response
}

/// Placeholder returned for a dead connection.
pub fn aborted<B: Default>() -> Response<B> {
    let mut response = Response::new(B::default());
    response.extensions_mut().insert(ConnectionAborted);
    response
}
