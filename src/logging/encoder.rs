//! Single-line record encoder shared by every sink.
//!
//! Layout: `<timestamp> <LEVEL> <caller> <message> <k=v ...>`, timestamp in
//! local time with second precision and no offset.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::logging::severity::Severity;

/// Field that overrides the event's own file:line. Set by the sugared logger,
/// whose macro call site would otherwise be this crate.
pub const CALLER_FIELD: &str = "caller";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Console-style encoder used for console and file destinations alike.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineEncoder;

impl LineEncoder {
    /// Render one record, including the trailing newline.
    pub fn encode(
        &self,
        time: DateTime<Local>,
        severity: Severity,
        caller: &str,
        message: &str,
        fields: &[(&str, String)],
    ) -> String {
        let mut line = String::with_capacity(64 + message.len());
        let _ = write!(
            line,
            "{} {} {} {}",
            time.format(TIME_FORMAT),
            severity,
            short_caller(caller),
            message
        );
        for (key, value) in fields {
            let _ = write!(line, " {key}={value}");
        }
        line.push('\n');
        line
    }
}

impl<S, N> FormatEvent<S, N> for LineEncoder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let mut record = RecordVisitor::default();
        event.record(&mut record);

        let caller = match record.caller.take() {
            Some(caller) => caller,
            None => match (meta.file(), meta.line()) {
                (Some(file), Some(line)) => format!("{file}:{line}"),
                _ => meta.target().to_string(),
            },
        };

        let line = self.encode(
            Local::now(),
            Severity::of(meta),
            &caller,
            &record.message,
            &record.fields,
        );
        writer.write_str(&line)
    }
}

/// Collects message, caller override and the remaining fields in
/// registration order.
#[derive(Default)]
struct RecordVisitor {
    message: String,
    caller: Option<String>,
    fields: Vec<(&'static str, String)>,
}

impl RecordVisitor {
    fn push(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = value,
            CALLER_FIELD => self.caller = Some(value),
            name => self.fields.push((name, quote_if_needed(value))),
        }
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }
}

/// Quote values that would otherwise break `k=v` tokenization.
fn quote_if_needed(value: String) -> String {
    let already_quoted = value.len() >= 2 && value.starts_with('"') && value.ends_with('"');
    if already_quoted {
        return value;
    }
    if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '"') {
        format!("{value:?}")
    } else {
        value
    }
}

/// Trim a `path/to/file.rs:line` caller to its last directory and file name.
pub fn short_caller(caller: &str) -> String {
    let (path, line) = match caller.rsplit_once(':') {
        Some((path, line)) if line.chars().all(|c| c.is_ascii_digit()) => (path, Some(line)),
        _ => (caller, None),
    };

    let mut parts = path.rsplitn(3, |c| c == '/' || c == '\\');
    let file = parts.next().unwrap_or(path);
    let short = match parts.next() {
        Some(dir) => format!("{dir}/{file}"),
        None => file.to_string(),
    };

    match line {
        Some(line) => format!("{short}:{line}"),
        None => short,
    }
}
