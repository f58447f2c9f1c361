//! Logger registry: the general and error loggers plus their sugared forms.
//!
//! A registry is built once from a [`LogConfig`] and shared by `Arc`. The
//! process-wide slot behind [`init_logger`] and the accessor functions holds
//! the most recently installed registry; installing another replaces it
//! wholesale.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};

use crate::config::loader::load_config;
use crate::config::schema::{LogConfig, Mode};
use crate::config::validation::validate_config;
use crate::error::LogError;
use crate::logging::logger::{Logger, LoggerCore, SugaredLogger};
use crate::logging::rolling::RollingFile;
use crate::logging::severity::Severity;
use crate::logging::sink::{Destination, Sink};

type ConsoleFactory = Box<dyn Fn() -> BoxMakeWriter + Send + Sync>;

/// The four logger handles and the files behind them.
pub struct LoggerRegistry {
    mode: Mode,
    logger: Logger,
    sugar: SugaredLogger,
    error_logger: Logger,
    error_sugar: SugaredLogger,
    files: Vec<RollingFile>,
}

impl LoggerRegistry {
    pub fn builder(config: LogConfig) -> RegistryBuilder {
        RegistryBuilder {
            config,
            console: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn sugar(&self) -> &SugaredLogger {
        &self.sugar
    }

    pub fn error_logger(&self) -> &Logger {
        &self.error_logger
    }

    pub fn error_sugar(&self) -> &SugaredLogger {
        &self.error_sugar
    }

    /// Flush every file sink to disk. Logging continues normally afterwards.
    ///
    /// All files are attempted; the first failure is returned.
    pub fn sync(&self) -> io::Result<()> {
        self.files
            .iter()
            .map(RollingFile::sync)
            .fold(Ok(()), |first, next| first.and(next))
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("mode", &self.mode)
            .field("logger", &self.logger)
            .field("error_logger", &self.error_logger)
            .finish()
    }
}

pub struct RegistryBuilder {
    config: LogConfig,
    console: Option<ConsoleFactory>,
}

impl RegistryBuilder {
    /// Replace standard output as the console destination.
    pub fn console_writer<M>(mut self, make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
    {
        self.console = Some(Box::new(move || BoxMakeWriter::new(make_writer.clone())));
        self
    }

    fn console(&self) -> Destination {
        match &self.console {
            Some(factory) => Destination::Console(factory()),
            None => Destination::stdout(),
        }
    }

    /// Build the cores. File sinks that cannot be opened are left out.
    pub fn build(self) -> Arc<LoggerRegistry> {
        let config = &self.config;
        let mut general = vec![Sink::new(self.console(), Severity::Debug)];
        let mut errors = vec![Sink::new(self.console(), Severity::Debug)];
        let mut files = Vec::new();
        let mut omitted = Vec::new();

        let file_thresholds = match config.mode {
            Mode::Production => Some((Severity::Info, Severity::Error)),
            Mode::Test => Some((Severity::Debug, Severity::Error)),
            Mode::Development => None,
        };

        if let Some((general_min, error_min)) = file_thresholds {
            let streams = [
                (config.general_pattern(), general_min, &mut general),
                (config.error_pattern(), error_min, &mut errors),
            ];
            for (pattern, min, sinks) in streams {
                match RollingFile::open(&config.directory, pattern, config.rotation, config.max_age()) {
                    Ok(file) => {
                        files.push(file.clone());
                        sinks.push(Sink::new(Destination::RollingFile(file), min));
                    }
                    Err(source) => omitted.push(LogError::FileSink {
                        directory: config.directory.clone(),
                        source,
                    }),
                }
            }
        }

        let logger = Logger::new(LoggerCore::tee(general));
        let error_logger = Logger::new(LoggerCore::tee(errors));

        for err in &omitted {
            logger.in_scope(|| tracing::warn!(error = %err, "file sink unavailable, continuing without it"));
        }

        Arc::new(LoggerRegistry {
            mode: config.mode,
            sugar: logger.sugar(),
            error_sugar: error_logger.sugar(),
            logger,
            error_logger,
            files,
        })
    }
}

static REGISTRY: ArcSwapOption<LoggerRegistry> = ArcSwapOption::const_empty();

/// Initialize the process-wide registry for an environment mode string.
///
/// `"prod"` and `"test"` add rotating file sinks under `./log`; anything
/// else logs to the console only. Calling again replaces every handle.
pub fn init_logger(mode: &str) -> Result<(), LogError> {
    init_logger_with(LogConfig::for_mode(mode))
}

/// Initialize the process-wide registry from a full configuration.
pub fn init_logger_with(config: LogConfig) -> Result<(), LogError> {
    validate_config(&config).map_err(LogError::InvalidConfig)?;
    install(LoggerRegistry::builder(config).build());
    Ok(())
}

/// Initialize the process-wide registry from a TOML file.
pub fn init_logger_from_file(path: &Path) -> Result<(), LogError> {
    let config = load_config(path)?;
    install(LoggerRegistry::builder(config).build());
    Ok(())
}

/// Make `registry` the process-wide registry. The previous one is flushed
/// and abandoned; its files close once the last handle onto them is gone.
pub fn install(registry: Arc<LoggerRegistry>) {
    if let Some(previous) = REGISTRY.swap(Some(registry)) {
        let _ = previous.sync();
    }
}

/// The current registry, if initialized.
pub fn registry() -> Option<Arc<LoggerRegistry>> {
    REGISTRY.load_full()
}

fn current<T>(pick: impl FnOnce(&LoggerRegistry) -> T, fallback: impl FnOnce() -> T) -> T {
    match REGISTRY.load().as_deref() {
        Some(registry) => pick(registry),
        None => fallback(),
    }
}

/// General logger. Disabled before initialization.
pub fn logger() -> Logger {
    current(|r| r.logger.clone(), Logger::disabled)
}

pub fn sugar_logger() -> SugaredLogger {
    current(|r| r.sugar.clone(), || Logger::disabled().sugar())
}

/// Error logger. Disabled before initialization.
pub fn error_logger() -> Logger {
    current(|r| r.error_logger.clone(), Logger::disabled)
}

pub fn sugar_error_logger() -> SugaredLogger {
    current(|r| r.error_sugar.clone(), || Logger::disabled().sugar())
}

/// Flush the file sinks of the current registry.
pub fn sync_logger() -> io::Result<()> {
    match registry() {
        Some(registry) => registry.sync(),
        None => Ok(()),
    }
}

/// Where a middleware finds its logger.
#[derive(Clone, Debug)]
pub enum LoggerSource {
    /// The process-wide general logger, looked up on every use.
    General,
    /// The process-wide error logger, looked up on every use.
    Error,
    /// A specific logger, independent of the process-wide registry.
    Fixed(Logger),
}

impl LoggerSource {
    pub fn resolve(&self) -> Logger {
        match self {
            LoggerSource::General => logger(),
            LoggerSource::Error => error_logger(),
            LoggerSource::Fixed(logger) => logger.clone(),
        }
    }
}
