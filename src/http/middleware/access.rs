//! Access log middleware.
//!
//! Emits exactly one Info record on the general logger per request, after
//! the inner chain returns. Place it outside the recovery middleware so the
//! timed region and the recorded status include recovered faults.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::{from_fn_with_state, FromFnLayer, Next};
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::http::context::{ErrorKind, RequestErrors};
use crate::http::request::{client_ip, query_param, user_agent};
use crate::logging::{Logger, LoggerSource};

type AccessFn = fn(State<LoggerSource>, Request, Next) -> BoxFuture<'static, Response>;

/// Layer produced by [`access_middleware`] and [`access_middleware_with`].
pub type AccessMiddleware = FromFnLayer<AccessFn, LoggerSource, (State<LoggerSource>, Request)>;

/// Access logging against the process-wide general logger, resolved on
/// every request so initialization order does not matter.
pub fn access_middleware() -> AccessMiddleware {
    from_fn_with_state(LoggerSource::General, access_log as AccessFn)
}

/// Access logging against a specific logger.
pub fn access_middleware_with(logger: Logger) -> AccessMiddleware {
    from_fn_with_state(LoggerSource::Fixed(logger), access_log as AccessFn)
}

fn access_log(State(source): State<LoggerSource>, request: Request, next: Next) -> BoxFuture<'static, Response> {
    Box::pin(log_access(source, request, next))
}

async fn log_access(source: LoggerSource, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or_default().to_string();
    let reference = query_param(&query, "ref").unwrap_or_default();
    let method = request.method().clone();
    let ip = client_ip(&request);
    let agent = user_agent(&request);

    let errors = request
        .extensions()
        .get::<RequestErrors>()
        .cloned()
        .unwrap_or_default();
    request.extensions_mut().insert(errors.clone());

    let start = Instant::now();
    let response = next.run(request).await;
    let cost = start.elapsed();

    let status = response.status().as_u16();
    let errors = errors.summary(ErrorKind::Private);

    source.resolve().in_scope(|| {
        tracing::info!(
            status,
            method = %method,
            path = %path,
            query = %query,
            ip = %ip,
            "user-agent" = %agent,
            errors = %errors,
            cost = ?cost,
            "ref" = %reference,
            "{}",
            path
        )
    });

    response
}
