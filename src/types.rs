use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use toml::Value;

use crate::duration::{format_duration, parse_duration};

/// The type of a flag together with its default value.
///
/// Built with the constructors in [`flag`](crate::flag) (`string`, `boolean`,
/// `int`, `float`, `duration`).
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Duration(Duration),
}

impl FlagValue {
    /// Short type name used in help and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FlagValue::Str(_) => "string",
            FlagValue::Bool(_) => "bool",
            FlagValue::Int(_) => "int",
            FlagValue::Float(_) => "float",
            FlagValue::Duration(_) => "duration",
        }
    }

    /// The value as command-line text, used for clap's `default_value`.
    pub fn to_arg_string(&self) -> String {
        match self {
            FlagValue::Str(s) => s.clone(),
            FlagValue::Bool(b) => b.to_string(),
            FlagValue::Int(i) => i.to_string(),
            FlagValue::Float(f) => f.to_string(),
            FlagValue::Duration(d) => format_duration(*d),
        }
    }

    /// The value as stored in [`Settings`](crate::Settings).
    pub fn to_toml(&self) -> Value {
        match self {
            FlagValue::Str(s) => Value::String(s.clone()),
            FlagValue::Bool(b) => Value::Boolean(*b),
            FlagValue::Int(i) => Value::Integer(*i),
            FlagValue::Float(f) => Value::Float(*f),
            FlagValue::Duration(d) => Value::String(format_duration(*d)),
        }
    }

    /// Parse `raw` as a value of the same type as `self`.
    pub fn parse_same(&self, raw: &str) -> Result<FlagValue, String> {
        match self {
            FlagValue::Str(_) => Ok(FlagValue::Str(raw.to_string())),
            FlagValue::Bool(_) => parse_bool(raw)
                .map(FlagValue::Bool)
                .ok_or_else(|| format!("'{raw}' is not a boolean")),
            FlagValue::Int(_) => raw
                .trim()
                .parse::<i64>()
                .map(FlagValue::Int)
                .map_err(|e| format!("'{raw}' is not an integer: {e}")),
            FlagValue::Float(_) => raw
                .trim()
                .parse::<f64>()
                .map(FlagValue::Float)
                .map_err(|e| format!("'{raw}' is not a float: {e}")),
            FlagValue::Duration(_) => parse_duration(raw)
                .map(FlagValue::Duration)
                .map_err(|e| e.to_string()),
        }
    }
}

/// Boolean text accepted from the environment.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Shell-completion hint for path-like flags. Does not affect parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathHint {
    /// A file, optionally restricted to the given extensions.
    Filename(Vec<String>),
    /// A directory.
    Dirname,
}

/// Shells supported by the `completion` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl CompletionShell {
    pub const NAMES: [&'static str; 4] = ["bash", "zsh", "fish", "powershell"];

    pub fn name(self) -> &'static str {
        match self {
            CompletionShell::Bash => "bash",
            CompletionShell::Zsh => "zsh",
            CompletionShell::Fish => "fish",
            CompletionShell::PowerShell => "powershell",
        }
    }

    pub(crate) fn generator(self) -> clap_complete::Shell {
        match self {
            CompletionShell::Bash => clap_complete::Shell::Bash,
            CompletionShell::Zsh => clap_complete::Shell::Zsh,
            CompletionShell::Fish => clap_complete::Shell::Fish,
            CompletionShell::PowerShell => clap_complete::Shell::PowerShell,
        }
    }
}

impl FromStr for CompletionShell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bash" => Ok(CompletionShell::Bash),
            "zsh" => Ok(CompletionShell::Zsh),
            "fish" => Ok(CompletionShell::Fish),
            "powershell" => Ok(CompletionShell::PowerShell),
            other => Err(format!(
                "unsupported shell '{other}' (expected one of: {})",
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for CompletionShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_same_keeps_type() {
        let v = FlagValue::Int(0).parse_same("42").unwrap();
        assert_eq!(v, FlagValue::Int(42));
        let v = FlagValue::Float(0.0).parse_same("1.5").unwrap();
        assert_eq!(v, FlagValue::Float(1.5));
        let v = FlagValue::Duration(Duration::ZERO).parse_same("2s").unwrap();
        assert_eq!(v, FlagValue::Duration(Duration::from_secs(2)));
    }

    #[test]
    fn parse_same_rejects_wrong_type() {
        assert!(FlagValue::Int(0).parse_same("forty").is_err());
        assert!(FlagValue::Bool(false).parse_same("yes").is_err());
    }

    #[test]
    fn bool_spellings() {
        for raw in ["1", "t", "T", "true", "TRUE", "True"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["0", "f", "F", "false", "FALSE", "False"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_bool("on"), None);
    }

    #[test]
    fn duration_stored_as_canonical_text() {
        let v = FlagValue::Duration(Duration::from_secs(90));
        assert_eq!(v.to_toml(), Value::String("1m30s".into()));
        assert_eq!(v.to_arg_string(), "1m30s");
    }

    #[test]
    fn shell_names_round_trip() {
        for name in CompletionShell::NAMES {
            let shell: CompletionShell = name.parse().unwrap();
            assert_eq!(shell.name(), name);
        }
        assert!("tcsh".parse::<CompletionShell>().is_err());
    }
}
