//! Dispatch of a compiled command tree.
//!
//! [`Cli`] owns the lowered `clap::Command` plus the per-command data
//! collected during lowering. [`Cli::run`] parses one argument vector,
//! resolves the bound settings, validates positionals and invokes the
//! selected command's run callback with an [`Invocation`].

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{self, Write};
use std::process;

use clap::ArgMatches;
use clap::error::ErrorKind;
use clap::parser::ValueSource;

use crate::env::EnvVars;
use crate::error::SoilError;
use crate::lower::{Node, POSITIONALS};
use crate::settings::{Binding, Settings, resolve};
use crate::types::{CompletionShell, FlagValue};

/// A compiled command tree, ready to dispatch.
pub struct Cli {
    command: clap::Command,
    nodes: HashMap<Vec<String>, Node>,
    bindings: Vec<Binding>,
    env_prefix: Option<String>,
    env_enabled: bool,
}

impl Cli {
    pub(crate) fn new(
        command: clap::Command,
        nodes: HashMap<Vec<String>, Node>,
        bindings: Vec<Binding>,
    ) -> Self {
        Self {
            command,
            nodes,
            bindings,
            env_prefix: None,
            env_enabled: true,
        }
    }

    /// Prefix derived environment variable names with `PREFIX__`.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Never read environment variables; bound flags fall back to their
    /// defaults.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// The lowered clap command.
    pub fn command(&self) -> &clap::Command {
        &self.command
    }

    #[cfg(test)]
    pub(crate) fn node(&self, path: &[&str]) -> Option<&Node> {
        let key: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        self.nodes.get(&key)
    }

    #[cfg(test)]
    pub(crate) fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Parse `args` (program name first) and dispatch.
    ///
    /// `env` supplies the environment snapshot and `out` receives help text
    /// and anything the run callback writes. Errors are returned, never
    /// printed.
    pub fn run<I, T, E>(&self, args: I, env: E, out: &mut dyn Write) -> Result<(), SoilError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
        E: IntoIterator<Item = (String, String)>,
    {
        let matches = match self.command.clone().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                write!(out, "{}", e.render())?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut path = vec![self.command.get_name().to_string()];
        let mut chain = vec![&matches];
        let mut leaf = &matches;
        while let Some((name, sub)) = leaf.subcommand() {
            path.push(name.to_string());
            chain.push(sub);
            leaf = sub;
        }
        let label = path.join(" ");

        let Some(node) = self.nodes.get(&path) else {
            return self.write_help(&path, out);
        };

        if let Some(message) = &node.deprecated {
            let name = path.last().map(String::as_str).unwrap_or_default();
            eprintln!("Command \"{name}\" is deprecated, {message}");
            tracing::warn!(command = %label, "deprecated command invoked: {message}");
        }

        for flag in &node.required_persistent {
            if leaf.value_source(flag) != Some(ValueSource::CommandLine) {
                return Err(SoilError::MissingFlag {
                    command: label,
                    flag: flag.clone(),
                });
            }
        }

        let positionals: Vec<String> = if node.takes_positionals {
            leaf.try_get_many::<String>(POSITIONALS)
                .ok()
                .flatten()
                .map(|values| values.cloned().collect())
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        node.rule
            .validate(&positionals, &node.valid_args)
            .map_err(|source| SoilError::Args {
                command: label.clone(),
                source,
            })?;

        let env = self
            .env_enabled
            .then(|| EnvVars::new(self.env_prefix.clone(), env));
        let settings = resolve(&self.bindings, &path, env.as_ref(), |binding| {
            explicit_value(binding, &chain)
        })?;

        tracing::debug!(
            command = %label,
            args = positionals.len(),
            settings = settings.keys().count(),
            "dispatching"
        );

        match &node.run {
            Some(callback) => {
                let mut invocation = Invocation {
                    path: &path,
                    args: &positionals,
                    settings: &settings,
                    matches: leaf,
                    root: &self.command,
                    out,
                };
                callback(&mut invocation).map_err(|source| SoilError::Run {
                    command: label,
                    source,
                })
            }
            None => self.write_help(&path, out),
        }
    }

    /// [`run`](Self::run) against the process arguments, environment and
    /// stdout.
    pub fn try_execute(&self) -> Result<(), SoilError> {
        self.try_execute_from(std::env::args_os())
    }

    pub fn try_execute_from<I, T>(&self, args: I) -> Result<(), SoilError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run(args, utf8_vars(std::env::vars_os()), &mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Run against the process and exit on failure.
    ///
    /// Parse errors are reported by clap. Anything else prints
    /// `Error: <message>` with a help hint and exits with status 1.
    pub fn execute(&self) {
        match self.try_execute() {
            Ok(()) => {}
            Err(SoilError::Parse(e)) => e.exit(),
            Err(err) => {
                let command = failing_command(&err).unwrap_or(self.command.get_name());
                eprintln!("Error: {err}");
                eprintln!("Run '{command} --help' for usage.");
                process::exit(1);
            }
        }
    }

    fn write_help(&self, path: &[String], out: &mut dyn Write) -> Result<(), SoilError> {
        let mut cmd = &self.command;
        for name in path.iter().skip(1) {
            match cmd.find_subcommand(name) {
                Some(sub) => cmd = sub,
                None => break,
            }
        }
        write!(out, "{}", cmd.clone().render_help())?;
        Ok(())
    }
}

/// Environment entries whose name and value are both UTF-8; the rest can
/// never name or hold a bound value and are skipped.
fn utf8_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
}

fn failing_command(err: &SoilError) -> Option<&str> {
    match err {
        SoilError::Args { command, .. }
        | SoilError::MissingFlag { command, .. }
        | SoilError::Run { command, .. } => Some(command),
        _ => None,
    }
}

/// The command-line value of a bound flag, if the user passed one.
///
/// Persistent flags are read from the leaf, where clap propagates them;
/// local flags from the matches of the command that declares them.
fn explicit_value(binding: &Binding, chain: &[&ArgMatches]) -> Option<FlagValue> {
    let matches = if binding.persistent {
        chain.last()?
    } else {
        chain.get(binding.path.len().checked_sub(1)?)?
    };
    if matches.value_source(&binding.flag) != Some(ValueSource::CommandLine) {
        return None;
    }
    let id = binding.flag.as_str();
    match &binding.default {
        FlagValue::Str(_) => matches.try_get_one::<String>(id).ok()?.cloned().map(FlagValue::Str),
        FlagValue::Bool(_) => matches.try_get_one::<bool>(id).ok()?.copied().map(FlagValue::Bool),
        FlagValue::Int(_) => matches.try_get_one::<i64>(id).ok()?.copied().map(FlagValue::Int),
        FlagValue::Float(_) => matches.try_get_one::<f64>(id).ok()?.copied().map(FlagValue::Float),
        FlagValue::Duration(_) => matches
            .try_get_one::<std::time::Duration>(id)
            .ok()?
            .copied()
            .map(FlagValue::Duration),
    }
}

/// Context handed to a run callback.
pub struct Invocation<'a> {
    path: &'a [String],
    args: &'a [String],
    settings: &'a Settings,
    matches: &'a ArgMatches,
    root: &'a clap::Command,
    out: &'a mut dyn Write,
}

impl<'a> Invocation<'a> {
    /// Names from the root to the invoked command.
    pub fn path(&self) -> &'a [String] {
        self.path
    }

    pub fn name(&self) -> &'a str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    /// Positional arguments after validation.
    pub fn args(&self) -> &'a [String] {
        self.args
    }

    pub fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// Raw clap matches of the invoked command, for flags that are not
    /// bound into the settings store.
    pub fn matches(&self) -> &'a ArgMatches {
        self.matches
    }

    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    /// Write a completion script for the whole tree to the output.
    pub fn generate_completion(&mut self, shell: CompletionShell) -> Result<(), SoilError> {
        let mut cmd = self.root.clone();
        let bin_name = cmd.get_name().to_string();
        clap_complete::generate(shell.generator(), &mut cmd, bin_name, &mut *self.out);
        self.out.flush()?;
        Ok(())
    }
}
