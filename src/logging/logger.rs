//! Logger cores and the two handle flavours built on them.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use tracing::{dispatcher, Dispatch};
use tracing_subscriber::layer::SubscriberExt;

use crate::logging::severity::{Severity, FATAL_TARGET};
use crate::logging::sink::{BoxedLayer, Sink, SinkInfo};

/// Fan-out over an ordered set of sinks.
///
/// Every sink sees every record that clears its own threshold; sinks do not
/// shadow each other.
pub struct LoggerCore {
    dispatch: Dispatch,
    sinks: Vec<SinkInfo>,
}

impl LoggerCore {
    /// Combine sinks in registration order.
    pub fn tee(sinks: Vec<Sink>) -> Self {
        let infos = sinks.iter().map(Sink::info).collect();
        let layers: Vec<BoxedLayer> = sinks.into_iter().map(Sink::into_layer).collect();
        let subscriber = tracing_subscriber::registry().with(layers);
        Self {
            dispatch: Dispatch::new(subscriber),
            sinks: infos,
        }
    }

    fn none() -> Self {
        Self {
            dispatch: Dispatch::none(),
            sinks: Vec::new(),
        }
    }

    pub fn sinks(&self) -> &[SinkInfo] {
        &self.sinks
    }
}

/// Strongly-typed logger: tracing macros run against one core.
///
/// ```ignore
/// logger.in_scope(|| tracing::info!(status = 200, "done"));
/// ```
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
}

impl Logger {
    pub fn new(core: LoggerCore) -> Self {
        Self {
            core: Arc::new(core),
        }
    }

    /// Handle returned before initialization. Records go nowhere.
    pub fn disabled() -> Self {
        Self::new(LoggerCore::none())
    }

    pub fn is_disabled(&self) -> bool {
        self.core.sinks.is_empty()
    }

    pub fn sinks(&self) -> &[SinkInfo] {
        self.core.sinks()
    }

    /// Whether any sink would accept a record at `severity`.
    pub fn enabled(&self, severity: Severity) -> bool {
        self.core
            .sinks
            .iter()
            .any(|sink| severity.passes(sink.min_severity))
    }

    /// Run `f` with this logger's core as the current dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.core.dispatch, f)
    }

    pub fn sugar(&self) -> SugaredLogger {
        SugaredLogger {
            logger: self.clone(),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("sinks", &self.core.sinks)
            .finish()
    }
}

/// Loosely-typed convenience logger.
///
/// Messages come from `format_args!` or a message plus key/value pairs of
/// anything `Display`. The caller recorded is the statement calling into
/// this type.
#[derive(Clone, Debug)]
pub struct SugaredLogger {
    logger: Logger,
}

struct Caller(&'static Location<'static>);

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.file(), self.0.line())
    }
}

impl SugaredLogger {
    pub fn desugar(&self) -> &Logger {
        &self.logger
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Debug, args, Location::caller());
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Info, args, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Warn, args, Location::caller());
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Severity::Error, args, Location::caller());
    }

    /// Log at Fatal, flush the file sinks, exit with status 1.
    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        self.emit(Severity::Fatal, args, Location::caller());
        let _ = crate::logging::registry::sync_logger();
        std::process::exit(1)
    }

    #[track_caller]
    pub fn debug_kv(&self, msg: &str, kvs: &[(&str, &dyn fmt::Display)]) {
        self.emit(Severity::Debug, format_args!("{}", with_pairs(msg, kvs)), Location::caller());
    }

    #[track_caller]
    pub fn info_kv(&self, msg: &str, kvs: &[(&str, &dyn fmt::Display)]) {
        self.emit(Severity::Info, format_args!("{}", with_pairs(msg, kvs)), Location::caller());
    }

    #[track_caller]
    pub fn warn_kv(&self, msg: &str, kvs: &[(&str, &dyn fmt::Display)]) {
        self.emit(Severity::Warn, format_args!("{}", with_pairs(msg, kvs)), Location::caller());
    }

    #[track_caller]
    pub fn error_kv(&self, msg: &str, kvs: &[(&str, &dyn fmt::Display)]) {
        self.emit(Severity::Error, format_args!("{}", with_pairs(msg, kvs)), Location::caller());
    }

    fn emit(&self, severity: Severity, message: fmt::Arguments<'_>, at: &'static Location<'static>) {
        let caller = Caller(at);
        self.logger.in_scope(|| match severity {
            Severity::Debug => tracing::debug!(caller = %caller, "{}", message),
            Severity::Info => tracing::info!(caller = %caller, "{}", message),
            Severity::Warn => tracing::warn!(caller = %caller, "{}", message),
            Severity::Error => tracing::error!(caller = %caller, "{}", message),
            Severity::Fatal => tracing::error!(target: FATAL_TARGET, caller = %caller, "{}", message),
        });
    }
}

fn with_pairs(msg: &str, kvs: &[(&str, &dyn fmt::Display)]) -> String {
    let mut out = msg.to_string();
    for (key, value) in kvs {
        out.push_str(&format!(" {key}={value}"));
    }
    out
}
