//! Panic recovery middleware.
//!
//! # Responsibilities
//! - Run the rest of the chain under `catch_unwind`
//! - Classify the fault: dead connection or application panic
//! - Log one Error record on the error logger with the request head
//! - Terminate: no response for a dead connection, 500 otherwise
//!
//! # Design Decisions
//! - Stack traces are captured by a panic hook at the point of fault, since
//!   the stack is gone once unwinding reaches this layer
//! - Request bodies are never part of the dump

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::error::Error as StdError;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{from_fn_with_state, FromFnLayer, Next};
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::http::context::{ErrorKind, RequestErrors};
use crate::http::request::RequestSnapshot;
use crate::http::response;
use crate::logging::{Logger, LoggerSource};

/// How a caught fault is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanicClass {
    /// The peer closed the connection (broken pipe, connection reset).
    BrokenConnection,
    /// Anything else.
    Generic,
}

/// Classify a panic payload.
///
/// Only I/O errors count as dead connections, and only when their kind or
/// text says so. A plain `panic!("broken pipe")` is a generic fault.
pub fn classify(payload: &(dyn Any + Send)) -> PanicClass {
    let io_error = payload.downcast_ref::<io::Error>().or_else(|| {
        payload
            .downcast_ref::<Box<dyn StdError + Send + Sync>>()
            .and_then(|err| err.downcast_ref::<io::Error>())
    });

    match io_error {
        Some(err) if is_broken_connection(err) => PanicClass::BrokenConnection,
        _ => PanicClass::Generic,
    }
}

fn is_broken_connection(err: &io::Error) -> bool {
    if matches!(err.kind(), io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset) {
        return true;
    }
    let text = err.to_string().to_lowercase();
    text.contains("broken pipe") || text.contains("connection reset by peer")
}

/// Human-readable rendering of a panic payload.
pub fn describe(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(err) = payload.downcast_ref::<io::Error>() {
        err.to_string()
    } else if let Some(err) = payload.downcast_ref::<Box<dyn StdError + Send + Sync>>() {
        err.to_string()
    } else {
        "Box<dyn Any>".to_string()
    }
}

thread_local! {
    static FAULT_STACK: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static STACK_HOOK: Once = Once::new();

/// Chain a hook that records the stack of every panic on its thread, then
/// defers to whatever hook was installed before.
fn install_stack_hook() {
    STACK_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            FAULT_STACK.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

fn take_fault_stack() -> Option<Backtrace> {
    FAULT_STACK.with(|slot| slot.borrow_mut().take())
}

/// Per-instance settings of the recovery middleware.
#[derive(Clone, Debug)]
pub struct RecoveryConfig {
    logger: LoggerSource,
    capture_stack: bool,
}

impl RecoveryConfig {
    fn new(logger: LoggerSource, capture_stack: bool) -> Self {
        if capture_stack {
            install_stack_hook();
        }
        Self { logger, capture_stack }
    }
}

type RecoveryFn = fn(State<RecoveryConfig>, Request, Next) -> BoxFuture<'static, Response>;

/// Layer produced by [`recovery_middleware`] and [`recovery_middleware_with`].
pub type RecoveryMiddleware = FromFnLayer<RecoveryFn, RecoveryConfig, (State<RecoveryConfig>, Request)>;

/// Recovery against the process-wide error logger, resolved when a fault is
/// handled so initialization order does not matter.
pub fn recovery_middleware(capture_stack: bool) -> RecoveryMiddleware {
    from_fn_with_state(RecoveryConfig::new(LoggerSource::Error, capture_stack), guard as RecoveryFn)
}

/// Recovery against a specific logger.
pub fn recovery_middleware_with(logger: Logger, capture_stack: bool) -> RecoveryMiddleware {
    from_fn_with_state(RecoveryConfig::new(LoggerSource::Fixed(logger), capture_stack), guard as RecoveryFn)
}

fn guard(State(config): State<RecoveryConfig>, request: Request, next: Next) -> BoxFuture<'static, Response> {
    Box::pin(run_guarded(config, request, next))
}

async fn run_guarded(config: RecoveryConfig, request: Request, next: Next) -> Response {
    let snapshot = RequestSnapshot::capture(&request);
    let errors = request.extensions().get::<RequestErrors>().cloned();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => config.recover(payload, &snapshot, errors.as_ref()),
    }
}

impl RecoveryConfig {
    fn recover(
        &self,
        payload: Box<dyn Any + Send>,
        snapshot: &RequestSnapshot,
        errors: Option<&RequestErrors>,
    ) -> Response {
        let stack = take_fault_stack();
        let error = describe(&*payload);
        let request = snapshot.dump();
        let logger = self.logger.resolve();

        match classify(&*payload) {
            PanicClass::BrokenConnection => {
                logger.in_scope(|| {
                    tracing::error!(
                        error = %error,
                        request = request.as_str(),
                        "{}",
                        snapshot.path()
                    )
                });
                if let Some(errors) = errors {
                    errors.push(ErrorKind::Private, &error);
                }
                response::aborted()
            }
            PanicClass::Generic => {
                if self.capture_stack {
                    let stack = stack.unwrap_or_else(Backtrace::force_capture).to_string();
                    logger.in_scope(|| {
                        tracing::error!(
                            error = %error,
                            request = request.as_str(),
                            stack = stack.as_str(),
                            "[Recovery from panic]"
                        )
                    });
                } else {
                    logger.in_scope(|| {
                        tracing::error!(
                            error = %error,
                            request = request.as_str(),
                            "[Recovery from panic]"
                        )
                    });
                }
                response::empty(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
