use std::path::PathBuf;
use thiserror::Error;

use crate::args::ArgsError;

/// Error returned by a run callback.
pub type RunError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum SoilError {
    #[error("Duplicate flag '--{flag}' on command '{command}' (call .shadow() to replace it)")]
    DuplicateFlag { command: String, flag: String },

    #[error("Duplicate subcommand '{name}' under '{command}'")]
    DuplicateCommand { command: String, name: String },

    #[error("Environment variable {var} is bound to both '{first}' and '{second}'")]
    EnvCollision {
        var: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Parse(#[from] clap::Error),

    #[error("{source}")]
    Args {
        command: String,
        #[source]
        source: ArgsError,
    },

    #[error("Required flag '--{flag}' not set for '{command}'")]
    MissingFlag { command: String, flag: String },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Failed to open log file {path}: {source}")]
    LogSink {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("A global logger is already installed")]
    LoggerInstalled,

    #[error("Command '{command}' failed: {source}")]
    Run {
        command: String,
        #[source]
        source: RunError,
    },

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_flag_formats_correctly() {
        let err = SoilError::DuplicateFlag {
            command: "app serve".into(),
            flag: "port".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("--port"));
        assert!(msg.contains("app serve"));
        assert!(msg.contains("shadow"));
    }

    #[test]
    fn env_collision_names_both_keys() {
        let err = SoilError::EnvCollision {
            var: "LOG_LEVEL".into(),
            first: "log-level".into(),
            second: "log_level".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("LOG_LEVEL"));
        assert!(msg.contains("log-level"));
        assert!(msg.contains("log_level"));
    }

    #[test]
    fn args_error_is_passed_through() {
        let err = SoilError::Args {
            command: "app completion".into(),
            source: ArgsError::TooFew { min: 1, actual: 0 },
        };
        assert_eq!(
            err.to_string(),
            "too few arguments (expected at least 1, got 0)"
        );
    }

    #[test]
    fn log_sink_includes_path() {
        let err = SoilError::LogSink {
            path: "/nope/x.log".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/nope/x.log"));
    }
}
