//! Sinks: an encoder, a destination and a minimum severity.
//!
//! Each sink becomes one `tracing_subscriber::fmt` layer with its own
//! per-layer filter, so delivery to one sink never depends on another.

use std::io;
use std::sync::Mutex;

use tracing::Metadata;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::{Context, Filter};
use tracing_subscriber::{Layer, Registry};

use crate::logging::encoder::LineEncoder;
use crate::logging::rolling::RollingFile;
use crate::logging::severity::Severity;

pub(crate) type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Kind of destination, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    Console,
    RollingFile,
}

/// Where encoded records go.
pub enum Destination {
    /// Standard output (or a substitute writer), one guarded write per record.
    Console(BoxMakeWriter),
    /// Shared handle onto a rotating file.
    RollingFile(RollingFile),
}

impl Destination {
    /// Standard output behind a mutex.
    pub fn stdout() -> Self {
        Destination::Console(BoxMakeWriter::new(Mutex::new(io::stdout())))
    }

    pub fn kind(&self) -> DestinationKind {
        match self {
            Destination::Console(_) => DestinationKind::Console,
            Destination::RollingFile(_) => DestinationKind::RollingFile,
        }
    }
}

/// Description of an attached sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkInfo {
    pub kind: DestinationKind,
    pub min_severity: Severity,
}

/// (encoder, destination, minimum severity).
pub struct Sink {
    pub encoder: LineEncoder,
    pub destination: Destination,
    pub min_severity: Severity,
}

impl Sink {
    pub fn new(destination: Destination, min_severity: Severity) -> Self {
        Self {
            encoder: LineEncoder,
            destination,
            min_severity,
        }
    }

    pub fn info(&self) -> SinkInfo {
        SinkInfo {
            kind: self.destination.kind(),
            min_severity: self.min_severity,
        }
    }

    pub(crate) fn into_layer(self) -> BoxedLayer {
        let filter = SeverityFilter(self.min_severity);
        let fmt = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .event_format(self.encoder);
        match self.destination {
            Destination::Console(writer) => fmt.with_writer(writer).with_filter(filter).boxed(),
            Destination::RollingFile(file) => fmt.with_writer(file).with_filter(filter).boxed(),
        }
    }
}

/// Per-sink threshold: a record is delivered iff its severity >= the minimum.
#[derive(Debug, Clone, Copy)]
pub struct SeverityFilter(pub Severity);

impl<S> Filter<S> for SeverityFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        Severity::of(meta).passes(self.0)
    }
}
