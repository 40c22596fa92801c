//! Declarative command trees for clap. Describe the commands, their flags
//! and callbacks as plain values, compile once, and run.
//!
//! ```ignore
//! use clapsoil::*;
//!
//! let cli = Command::new(
//!     "myapp",
//!     [
//!         short("Does useful things"),
//!         defaults(env!("CARGO_PKG_VERSION"), "abc1234"),
//!         sub(
//!             "serve",
//!             [
//!                 short("Start the server"),
//!                 flag("port", int(8080)).abbr('p').env().into(),
//!                 run(|inv| {
//!                     let logger = configure_default_logging(inv.settings())?;
//!                     let port = inv.settings().get_int("port").unwrap_or(8080);
//!                     logger.in_scope(|| tracing::info!(port, "listening"));
//!                     Ok(())
//!                 }),
//!             ],
//!         ),
//!     ],
//! )
//! .compile()?;
//!
//! cli.execute();
//! ```
//!
//! That tree gives `myapp serve --port`, a `PORT` environment fallback,
//! `myapp version`, `myapp completion <shell>`, and the persistent
//! `--loglevel/-l`, `--logfile` and `--logformat` flags.
//!
//! # Applicants
//!
//! Everything you attach to a [`Command`] is an [`Applicant`]: a command
//! option ([`short`], [`long`], [`aliases`], [`valid_args`], [`hidden`],
//! [`deprecated`], [`args()`], [`run`]), a flag ([`FlagSpec`] via `.into()`),
//! a child command ([`sub`]) or a bundle of applicants ([`group`]).
//! Applicants are data, so a tree can be inspected before it is compiled and
//! reusable pieces such as [`defaults`] are ordinary functions returning an
//! `Applicant`.
//!
//! Options on the same command are applied in declaration order; a later
//! `short` replaces an earlier one. Children are attached in declaration
//! order too, which is also the order they appear in help.
//!
//! # Compilation
//!
//! [`Command::compile`] lowers the tree depth-first into a `clap::Command`
//! and returns a [`Cli`]. Structural mistakes are caught here, not at run
//! time:
//!
//! - two flags with the same name on one command fail with
//!   [`SoilError::DuplicateFlag`] unless the later one calls
//!   [`shadow()`](FlagSpec::shadow);
//! - two children with the same name fail with
//!   [`SoilError::DuplicateCommand`];
//! - two different settings keys that would read the same environment
//!   variable fail with [`SoilError::EnvCollision`].
//!
//! # Flags and settings
//!
//! [`flag`] takes a name and a typed default ([`string`], [`boolean`],
//! [`int`], [`float`], [`duration`]). Persistent flags are visible to every
//! descendant. Flags bound with [`env()`](FlagSpec::env) are resolved into
//! the invocation's [`Settings`]:
//!
//! ```text
//! Declared default     flag("port", int(8080))
//!        ↑ overridden by
//! Environment var      PORT, or MYAPP__PORT with .env_prefix("MYAPP")
//!        ↑ overridden by
//! Command line         --port 9000
//! ```
//!
//! Variable names are derived from the key: segments in SHOUTY_SNAKE_CASE,
//! dots become `__` (`server.max-conn` → `SERVER__MAX_CONN`).
//! [`env_var()`](FlagSpec::env_var) names the variable exactly instead.
//! [`Settings::extract`] deserializes the store into a confique config
//! struct, filling in its defaults.
//!
//! # Positional arguments
//!
//! A command accepts positionals when it has no children or declares an
//! [`args()`] rule or [`valid_args`]. [`PositionalArgs`] rules are checked
//! before the run callback executes; [`PositionalArgs::All`] runs its rules
//! in order and stops at the first failure.
//!
//! # Logging
//!
//! [`configure_logging`] builds a [`Logger`] from a level name and a
//! destination (`-` for stderr). Nothing global happens until
//! [`Logger::install`]; until then [`Logger::noop`] is the stand-in.
//! Unknown levels fall back to warn; a log file that cannot be opened is an
//! error, not an exit.
//!
//! # Error handling
//!
//! Fallible operations return [`SoilError`]. [`Cli::run`] returns errors to
//! the caller; [`Cli::execute`] reports them and exits.

pub mod common;
pub mod error;
pub mod logging;
pub mod types;

mod args;
mod cli;
mod command;
mod duration;
mod env;
mod flag;
mod lower;
mod settings;

#[cfg(test)]
mod fixtures;

pub use args::{ArgsError, PositionalArgs};
pub use cli::{Cli, Invocation};
pub use command::{
    Applicant, Command, CommandOption, Declaration, RunFn, aliases, args, deprecated, group,
    hidden, long, run, short, sub, valid_args,
};
pub use common::{
    completion, defaults, flag_log_file, flag_log_format, flag_log_level, version,
};
pub use duration::{DurationError, format_duration, parse_duration};
pub use env::env_var_name;
pub use error::{RunError, SoilError};
pub use flag::{FlagSpec, boolean, duration, flag, float, int, string};
pub use logging::{
    LogConfig, LogFormat, LogLevel, LogSettings, LogSink, Logger, configure_default_logging,
    configure_logging, configure_logging_with,
};
pub use settings::{Origin, Settings};
pub use types::{CompletionShell, FlagValue, PathHint};
