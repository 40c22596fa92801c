//! Ready-made applicants most command-line tools want.

use crate::args::PositionalArgs;
use crate::command::{Applicant, args, group, run, short, sub, valid_args};
use crate::error::RunError;
use crate::flag::{flag, string};
use crate::types::CompletionShell;

/// A `version` subcommand printing `<version> (<commit>)`.
pub fn version(version: impl Into<String>, commit: impl Into<String>) -> Applicant {
    let line = format!("{} ({})", version.into(), commit.into());
    sub(
        "version",
        [
            short("Show the current version"),
            args(PositionalArgs::None),
            run(move |inv| {
                writeln!(inv.out(), "{line}")?;
                Ok(())
            }),
        ],
    )
}

/// A `completion <shell>` subcommand writing a completion script for the
/// whole tree.
pub fn completion() -> Applicant {
    sub(
        "completion [bash|zsh|fish|powershell]",
        [
            short("Generate completion script"),
            valid_args(CompletionShell::NAMES),
            args(PositionalArgs::and([
                PositionalArgs::one(),
                PositionalArgs::OnlyValid,
            ])),
            run(|inv| {
                let Some(name) = inv.args().first() else {
                    return Err("missing shell name".into());
                };
                let shell: CompletionShell = name.parse().map_err(RunError::from)?;
                inv.generate_completion(shell)?;
                Ok(())
            }),
        ],
    )
}

/// Persistent `--loglevel/-l`; an empty default means `warn`.
pub fn flag_log_level(default: &str) -> Applicant {
    let default = if default.is_empty() { "warn" } else { default };
    flag("loglevel", string(default))
        .abbr('l')
        .description(
            "Minimum level for log messages (one of 'debug', 'info', 'warn', 'error', 'fatal', 'panic')",
        )
        .persistent()
        .env()
        .into()
}

pub fn flag_log_file() -> Applicant {
    flag("logfile", string("-"))
        .description("Write logfiles to the given file ('-' for stderr)")
        .persistent()
        .env()
        .into()
}

/// Persistent `--logformat`, default `json`. Once bound, the default is a
/// resolved value like any other and overrides the automatic format.
pub fn flag_log_format() -> Applicant {
    flag("logformat", string("json"))
        .description("Which format to use for writing the logs ('json' or 'text')")
        .persistent()
        .env()
        .into()
}

/// `version`, `completion` and the three log flags in one applicant.
pub fn defaults(version_text: impl Into<String>, commit: impl Into<String>) -> Applicant {
    group([
        version(version_text, commit),
        completion(),
        flag_log_level("warn"),
        flag_log_file(),
        flag_log_format(),
    ])
}
