//! Lowering of a [`Command`] tree into a `clap::Command`.
//!
//! Traversal is depth-first. Each node's declarations are applied in order,
//! then its children are lowered and attached in declaration order. Along
//! the way the per-node dispatch data ([`Node`]) and the settings bindings
//! are collected so [`Cli`] can resolve an invocation without walking the
//! builder tree again.

use std::collections::HashMap;

use clap::{Arg, ArgAction};

use crate::args::PositionalArgs;
use crate::cli::Cli;
use crate::command::{Command, CommandOption, Declaration, RunFn};
use crate::env::{check_collisions, env_var_name};
use crate::error::SoilError;
use crate::flag::FlagSpec;
use crate::settings::Binding;

/// Clap id of the positional-argument slot.
pub(crate) const POSITIONALS: &str = "__positionals";

/// Dispatch data for one lowered command.
#[derive(Clone, Default)]
pub(crate) struct Node {
    pub run: Option<RunFn>,
    pub rule: PositionalArgs,
    pub valid_args: Vec<String>,
    pub deprecated: Option<String>,
    pub takes_positionals: bool,
    /// Mandatory persistent flags visible here, own and inherited.
    pub required_persistent: Vec<String>,
}

/// Options folded from a node's declarations. Later options win.
#[derive(Default)]
struct Options {
    about: Option<String>,
    long_about: Option<String>,
    aliases: Vec<String>,
    valid_args: Vec<String>,
    hidden: bool,
    deprecated: Option<String>,
    rule: Option<PositionalArgs>,
    run: Option<RunFn>,
}

impl Options {
    fn apply(&mut self, option: CommandOption) {
        match option {
            CommandOption::Short(text) => self.about = Some(text),
            CommandOption::Long(text) => self.long_about = Some(text),
            CommandOption::Aliases(names) => self.aliases = names,
            CommandOption::ValidArgs(values) => self.valid_args = values,
            CommandOption::Hidden => self.hidden = true,
            CommandOption::Deprecated(message) => self.deprecated = Some(message),
            CommandOption::Args(rule) => self.rule = Some(rule),
            CommandOption::Run(callback) => self.run = Some(callback),
        }
    }
}

pub(crate) fn compile(root: Command) -> Result<Cli, SoilError> {
    let mut nodes = HashMap::new();
    let mut bindings = Vec::new();
    let mut command = lower(root, &[], &[], &mut nodes, &mut bindings)?;

    check_collisions(bindings.iter().map(|b| {
        let var = match &b.env_var {
            Some(var) => var.clone(),
            None => env_var_name(None, &b.key),
        };
        (b.key.as_str(), var)
    }))?;

    command.build();
    tracing::debug!(
        commands = nodes.len(),
        bindings = bindings.len(),
        "compiled command tree"
    );
    Ok(Cli::new(command, nodes, bindings))
}

fn lower(
    node: Command,
    parent: &[String],
    inherited_required: &[String],
    nodes: &mut HashMap<Vec<String>, Node>,
    bindings: &mut Vec<Binding>,
) -> Result<clap::Command, SoilError> {
    let (name, usage, declarations, children) = node.into_parts();
    let mut path = parent.to_vec();
    path.push(name.clone());
    let label = path.join(" ");

    let mut options = Options::default();
    let mut flags: Vec<FlagSpec> = Vec::new();
    for declaration in declarations {
        match declaration {
            Declaration::Option(option) => options.apply(option),
            Declaration::Flag(spec) => add_flag(&mut flags, spec, &label)?,
        }
    }

    let mut cmd = clap::Command::new(name);
    if let Some(about) = &options.about {
        cmd = cmd.about(about.clone());
    }
    if let Some(long_about) = &options.long_about {
        cmd = cmd.long_about(long_about.clone());
    }
    if !options.aliases.is_empty() {
        cmd = cmd.visible_aliases(options.aliases.clone());
    }
    if options.hidden || options.deprecated.is_some() {
        cmd = cmd.hide(true);
    }

    for spec in &flags {
        cmd = cmd.arg(spec.to_arg());
        if let Some(key) = spec.env_key() {
            bindings.push(Binding {
                key: key.to_string(),
                flag: spec.name().to_string(),
                env_var: spec.explicit_env_var().map(str::to_string),
                default: spec.value().clone(),
                path: path.clone(),
                persistent: spec.is_persistent(),
            });
        }
    }

    let takes_positionals =
        children.is_empty() || options.rule.is_some() || !options.valid_args.is_empty();
    if takes_positionals {
        cmd = cmd.arg(positional_slot(usage.as_deref()));
    }

    let mut required = inherited_required.to_vec();
    required.extend(
        flags
            .iter()
            .filter(|f| f.is_mandatory() && f.is_persistent())
            .map(|f| f.name().to_string()),
    );

    let mut seen: Vec<String> = Vec::new();
    for child in children {
        if seen.iter().any(|n| n == child.name()) {
            return Err(SoilError::DuplicateCommand {
                command: label,
                name: child.name().to_string(),
            });
        }
        seen.push(child.name().to_string());
        cmd = cmd.subcommand(lower(child, &path, &required, nodes, bindings)?);
    }

    nodes.insert(
        path,
        Node {
            run: options.run,
            rule: options.rule.unwrap_or_default(),
            valid_args: options.valid_args,
            deprecated: options.deprecated,
            takes_positionals,
            required_persistent: required,
        },
    );
    Ok(cmd)
}

fn add_flag(flags: &mut Vec<FlagSpec>, spec: FlagSpec, command: &str) -> Result<(), SoilError> {
    match flags.iter().position(|f| f.name() == spec.name()) {
        Some(i) if spec.is_shadowing() => {
            flags[i] = spec;
            Ok(())
        }
        Some(_) => Err(SoilError::DuplicateFlag {
            command: command.to_string(),
            flag: spec.name().to_string(),
        }),
        None => {
            flags.push(spec);
            Ok(())
        }
    }
}

/// Trailing positional slot labelled with the use-line remainder.
fn positional_slot(usage: Option<&str>) -> Arg {
    let label = usage
        .map(|u| u.replace(['[', ']', '<', '>'], ""))
        .map(|u| u.trim_end_matches("...").trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "ARGS".to_string());
    Arg::new(POSITIONALS)
        .value_name(label)
        .num_args(0..)
        .action(ArgAction::Append)
}
