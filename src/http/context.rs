//! Request-scoped error list.
//!
//! The access middleware places a [`RequestErrors`] in the request
//! extensions; handlers and inner middleware append to it, and the access
//! record summarises the private entries once the chain returns.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Who an attached error is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Internal detail, logged but never shown to the client.
    Private,
    /// Safe to surface to the client.
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Shared, append-only error list for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestErrors(Arc<Mutex<Vec<RequestError>>>);

impl RequestErrors {
    fn entries(&self) -> MutexGuard<'_, Vec<RequestError>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, kind: ErrorKind, error: impl fmt::Display) {
        self.entries().push(RequestError {
            kind,
            message: error.to_string(),
        });
    }

    pub fn private(&self, error: impl fmt::Display) {
        self.push(ErrorKind::Private, error);
    }

    pub fn public(&self, error: impl fmt::Display) {
        self.push(ErrorKind::Public, error);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn by_kind(&self, kind: ErrorKind) -> Vec<RequestError> {
        self.entries()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// `Error #01: first; Error #02: second`, empty when there are none.
    pub fn summary(&self, kind: ErrorKind) -> String {
        self.by_kind(kind)
            .iter()
            .enumerate()
            .map(|(i, e)| format!("Error #{:02}: {}", i + 1, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
