//! Request inspection helpers shared by the middleware.
//!
//! # Responsibilities
//! - Resolve the client IP the way proxies report it
//! - Read single query parameters
//! - Snapshot the request head before the handler consumes the request
//!
//! # Design Decisions
//! - Snapshots copy method, URI, version and headers only; the body is
//!   never read, so the handler still sees the full stream

use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, Uri, Version};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Best-effort client address: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the connection peer. Empty when none is known.
pub fn client_ip<B>(request: &Request<B>) -> String {
    let headers = request.headers();

    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get(X_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

/// First value of `key` in a raw query string.
pub fn query_param(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

pub fn user_agent<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(header::USER_AGENT)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// Copy of a request head taken before the handler runs.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
}

impl RequestSnapshot {
    pub fn capture<B>(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            version: request.version(),
            headers: request.headers().clone(),
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Render as an HTTP/1.x request head, without the body.
    pub fn dump(&self) -> String {
        let target = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let mut out = format!("{} {} {:?}\r\n", self.method, target, self.version);

        if !self.headers.contains_key(header::HOST) {
            if let Some(authority) = self.uri.authority() {
                let _ = write!(out, "Host: {authority}\r\n");
            }
        }
        for (name, value) in &self.headers {
            let _ = write!(out, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()));
        }
        out.push_str("\r\n");
        out
    }
}
