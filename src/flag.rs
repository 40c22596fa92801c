//! Flag declarations and their lowering into `clap::Arg`.

use std::time::Duration;

use clap::builder::ValueHint;
use clap::{Arg, ArgAction, value_parser};

use crate::duration::parse_duration;
use crate::types::{FlagValue, PathHint};

/// Full configuration of one flag.
///
/// Created with [`flag`] and refined with the builder methods below, then
/// turned into an [`Applicant`](crate::Applicant) with `.into()`:
///
/// ```ignore
/// flag("loglevel", string("warn"))
///     .abbr('l')
///     .description("Minimum level for log messages")
///     .persistent()
///     .env()
///     .into()
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSpec {
    name: String,
    value: FlagValue,
    persistent: bool,
    mandatory: bool,
    abbreviation: Option<char>,
    description: String,
    env_key: Option<String>,
    env_var: Option<String>,
    path_hint: Option<PathHint>,
    shadow: bool,
}

/// Declare a flag named `name` with the given type and default.
pub fn flag(name: impl Into<String>, value: FlagValue) -> FlagSpec {
    FlagSpec {
        name: name.into(),
        value,
        persistent: false,
        mandatory: false,
        abbreviation: None,
        description: String::new(),
        env_key: None,
        env_var: None,
        path_hint: None,
        shadow: false,
    }
}

pub fn string(default: impl Into<String>) -> FlagValue {
    FlagValue::Str(default.into())
}

pub fn boolean(default: bool) -> FlagValue {
    FlagValue::Bool(default)
}

pub fn int(default: i64) -> FlagValue {
    FlagValue::Int(default)
}

pub fn float(default: f64) -> FlagValue {
    FlagValue::Float(default)
}

pub fn duration(default: Duration) -> FlagValue {
    FlagValue::Duration(default)
}

impl FlagSpec {
    /// Make the flag visible to this command and all its descendants.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Require the flag on the command line.
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn abbr(mut self, short: char) -> Self {
        self.abbreviation = Some(short);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Bind the flag into the settings store under its own name, with an
    /// environment fallback derived from that name.
    pub fn env(mut self) -> Self {
        self.env_key = Some(self.name.clone());
        self
    }

    /// Bind the flag under `key` instead of its name. Dotted keys nest.
    pub fn env_name(mut self, key: impl Into<String>) -> Self {
        self.env_key = Some(key.into());
        self
    }

    /// Read the fallback from exactly this variable, bypassing name
    /// derivation and the env prefix. Implies [`env`](Self::env) when no key
    /// has been set.
    pub fn env_var(mut self, var: impl Into<String>) -> Self {
        if self.env_key.is_none() {
            self.env_key = Some(self.name.clone());
        }
        self.env_var = Some(var.into());
        self
    }

    /// Complete as a file name, optionally limited to `extensions`.
    pub fn filename<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_hint = Some(PathHint::Filename(
            extensions.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Complete as a directory name.
    pub fn dirname(mut self) -> Self {
        self.path_hint = Some(PathHint::Dirname);
        self
    }

    /// Replace an earlier flag with the same name on the same command
    /// instead of failing compilation.
    pub fn shadow(mut self) -> Self {
        self.shadow = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &FlagValue {
        &self.value
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn abbreviation(&self) -> Option<char> {
        self.abbreviation
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn env_key(&self) -> Option<&str> {
        self.env_key.as_deref()
    }

    pub fn explicit_env_var(&self) -> Option<&str> {
        self.env_var.as_deref()
    }

    pub fn path_hint(&self) -> Option<&PathHint> {
        self.path_hint.as_ref()
    }

    pub fn is_shadowing(&self) -> bool {
        self.shadow
    }

    /// Register this flag as a clap argument.
    ///
    /// Persistent flags become clap globals. Mandatory flags get no default;
    /// local ones are marked required, persistent ones are checked at
    /// dispatch since clap cannot require a global argument.
    pub(crate) fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .help(self.description.clone())
            .global(self.persistent);
        if let Some(short) = self.abbreviation {
            arg = arg.short(short);
        }

        arg = match &self.value {
            FlagValue::Str(_) => arg.action(ArgAction::Set).value_parser(value_parser!(String)),
            FlagValue::Bool(_) => arg
                .action(ArgAction::Set)
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(value_parser!(bool)),
            FlagValue::Int(_) => arg.action(ArgAction::Set).value_parser(value_parser!(i64)),
            FlagValue::Float(_) => arg.action(ArgAction::Set).value_parser(value_parser!(f64)),
            FlagValue::Duration(_) => arg
                .action(ArgAction::Set)
                .value_name("DURATION")
                .value_parser(parse_duration),
        };

        if self.mandatory {
            arg = arg.required(!self.persistent);
        } else {
            arg = arg.default_value(self.value.to_arg_string());
        }

        match &self.path_hint {
            Some(PathHint::Filename(_)) => arg.value_hint(ValueHint::FilePath),
            Some(PathHint::Dirname) => arg.value_hint(ValueHint::DirPath),
            None => arg,
        }
    }
}
