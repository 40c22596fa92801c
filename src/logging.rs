//! Logging setup on top of `tracing`.
//!
//! A [`Logger`] is an explicit value: build it with [`configure_logging`]
//! (or one of its variants), then either [`install`](Logger::install) it as
//! the process-wide subscriber or scope it with
//! [`in_scope`](Logger::in_scope). Until then, [`Logger::noop`] discards
//! everything.

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use confique::Config;
use tracing::{Dispatch, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

use crate::error::SoilError;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}

impl LogLevel {
    pub const NAMES: [&'static str; 7] = [
        "trace", "debug", "info", "warn", "error", "fatal", "panic",
    ];

    /// Parse a level name, falling back to [`LogLevel::Warn`] for anything
    /// unrecognised.
    pub fn parse_or_warn(text: &str) -> Self {
        text.parse().unwrap_or(LogLevel::Warn)
    }

    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
            LogLevel::Panic => "panic",
        }
    }

    /// The tracing level records must reach. Fatal and panic have no
    /// tracing counterpart and map onto ERROR.
    pub fn as_tracing(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error | LogLevel::Fatal | LogLevel::Panic => Level::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            "panic" => Ok(LogLevel::Panic),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    /// Human-readable lines.
    Text,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "console" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{other}' (expected json or text)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => f.write_str("json"),
            LogFormat::Text => f.write_str("text"),
        }
    }
}

/// Where records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    File(PathBuf),
}

impl LogSink {
    /// `-` (or nothing) means stderr; anything else is a file path.
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "" | "-" => LogSink::Stderr,
            path => LogSink::File(PathBuf::from(path)),
        }
    }
}

/// Everything needed to build a [`Logger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub sink: LogSink,
    /// `None` picks text for stderr and json for files.
    pub format: Option<LogFormat>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            sink: LogSink::Stderr,
            format: None,
        }
    }
}

/// Logging keys as bound by the common log flags.
#[derive(Config, Debug)]
pub struct LogSettings {
    /// Minimum level for log messages.
    #[config(default = "warn")]
    pub loglevel: String,

    /// Log destination, `-` for stderr.
    #[config(default = "-")]
    pub logfile: String,

    /// Record format; automatic when unset.
    pub logformat: Option<String>,
}

impl LogSettings {
    pub fn to_config(&self) -> Result<LogConfig, SoilError> {
        let format = self
            .logformat
            .as_deref()
            .map(|text| {
                text.parse::<LogFormat>().map_err(|reason| SoilError::InvalidValue {
                    key: "logformat".into(),
                    reason,
                })
            })
            .transpose()?;
        Ok(LogConfig {
            level: LogLevel::parse_or_warn(&self.loglevel),
            sink: LogSink::parse(&self.logfile),
            format,
        })
    }
}

/// A configured tracing dispatcher.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
    filter: LevelFilter,
    config: Option<LogConfig>,
}

impl Logger {
    /// A logger that drops every record.
    pub fn noop() -> Self {
        Self {
            dispatch: Dispatch::none(),
            filter: LevelFilter::OFF,
            config: None,
        }
    }

    /// The configuration this logger was built from; `None` for the no-op
    /// logger.
    pub fn config(&self) -> Option<&LogConfig> {
        self.config.as_ref()
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.filter >= level.as_tracing()
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Run `f` with this logger as the current thread's subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Make this logger the process-wide default. Fails if any global
    /// subscriber is already set.
    pub fn install(&self) -> Result<(), SoilError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| SoilError::LoggerInstalled)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("filter", &self.filter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Build a logger at `level` writing to `file` (`-` for stderr).
///
/// Unknown levels fall back to warn. Text goes to stderr, json to files.
pub fn configure_logging(level: &str, file: &str) -> Result<Logger, SoilError> {
    configure_logging_with(LogConfig {
        level: LogLevel::parse_or_warn(level),
        sink: LogSink::parse(file),
        format: None,
    })
}

/// Build a logger from `loglevel`, `logfile` and `logformat` in `settings`.
///
/// A resolved `logformat` always wins, including the `json` default that
/// [`flag_log_format`](crate::flag_log_format) binds, so a tree built with
/// [`defaults`](crate::defaults) logs json to stderr unless `--logformat
/// text` is given. The automatic choice applies only when the key is absent.
pub fn configure_default_logging(settings: &Settings) -> Result<Logger, SoilError> {
    let log: LogSettings = settings.extract()?;
    configure_logging_with(log.to_config()?)
}

pub fn configure_logging_with(config: LogConfig) -> Result<Logger, SoilError> {
    let format = config.format.unwrap_or(match config.sink {
        LogSink::Stderr => LogFormat::Text,
        LogSink::File(_) => LogFormat::Json,
    });
    let (writer, ansi) = match &config.sink {
        LogSink::Stderr => (BoxMakeWriter::new(io::stderr), true),
        LogSink::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| SoilError::LogSink {
                    path: path.clone(),
                    source,
                })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };
    let filter = LevelFilter::from_level(config.level.as_tracing());

    let dispatch = match format {
        LogFormat::Json => Dispatch::new(
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer)),
        ),
        LogFormat::Text => Dispatch::new(
            tracing_subscriber::registry().with(filter).with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(ansi)
                    .with_writer(writer),
            ),
        ),
    };

    Ok(Logger {
        dispatch,
        filter,
        config: Some(LogConfig { format: Some(format), ..config }),
    })
}
