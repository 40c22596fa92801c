//! Positional-argument rules.
//!
//! A rule is plain data attached to a command with [`args`](crate::args());
//! dispatch validates the received arguments against it before the run
//! callback executes.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("too few arguments (expected at least {min}, got {actual})")]
    TooFew { min: usize, actual: usize },

    #[error("too many arguments (expected at most {max}, got {actual})")]
    TooMany { max: usize, actual: usize },

    #[error("invalid argument \"{arg}\" (expected one of: {})", .valid.join(", "))]
    Invalid { arg: String, valid: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PositionalArgs {
    /// Anything goes.
    #[default]
    Any,
    /// No positional arguments.
    None,
    Exact(usize),
    Range { min: usize, max: usize },
    Min(usize),
    Max(usize),
    /// Every argument must be one of the command's valid args.
    OnlyValid,
    /// All rules in order; the first failure wins.
    All(Vec<PositionalArgs>),
}

impl PositionalArgs {
    pub fn one() -> Self {
        PositionalArgs::Exact(1)
    }

    pub fn and(rules: impl IntoIterator<Item = PositionalArgs>) -> Self {
        PositionalArgs::All(rules.into_iter().collect())
    }

    /// Check `args` against this rule. `valid` holds the command's valid
    /// args; text after a tab is a description and is not compared.
    pub fn validate(&self, args: &[String], valid: &[String]) -> Result<(), ArgsError> {
        match self {
            PositionalArgs::Any => Ok(()),
            PositionalArgs::None => check_range(args.len(), 0, 0),
            PositionalArgs::Exact(n) => check_range(args.len(), *n, *n),
            PositionalArgs::Range { min, max } => check_range(args.len(), *min, *max),
            PositionalArgs::Min(min) => check_range(args.len(), *min, usize::MAX),
            PositionalArgs::Max(max) => check_range(args.len(), 0, *max),
            PositionalArgs::OnlyValid => check_valid(args, valid),
            PositionalArgs::All(rules) => rules.iter().try_for_each(|r| r.validate(args, valid)),
        }
    }
}

fn check_range(actual: usize, min: usize, max: usize) -> Result<(), ArgsError> {
    if actual < min {
        return Err(ArgsError::TooFew { min, actual });
    }
    if actual > max {
        return Err(ArgsError::TooMany { max, actual });
    }
    Ok(())
}

fn check_valid(args: &[String], valid: &[String]) -> Result<(), ArgsError> {
    if valid.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = valid
        .iter()
        .map(|v| v.split('\t').next().unwrap_or(v))
        .collect();
    for arg in args {
        if !names.contains(&arg.as_str()) {
            return Err(ArgsError::Invalid {
                arg: arg.clone(),
                valid: names.iter().map(|s| s.to_string()).collect(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn shells() -> Vec<String> {
        strs(&["bash", "zsh", "fish", "powershell"])
    }

    fn one_valid() -> PositionalArgs {
        PositionalArgs::and([PositionalArgs::one(), PositionalArgs::OnlyValid])
    }

    #[test]
    fn any_accepts_everything() {
        assert!(PositionalArgs::Any.validate(&strs(&["a", "b"]), &[]).is_ok());
    }

    #[test]
    fn none_rejects_arguments() {
        assert_eq!(
            PositionalArgs::None.validate(&strs(&["x"]), &[]),
            Err(ArgsError::TooMany { max: 0, actual: 1 })
        );
    }

    #[test]
    fn range_bounds() {
        let rule = PositionalArgs::Range { min: 1, max: 2 };
        assert!(rule.validate(&strs(&["a"]), &[]).is_ok());
        assert!(rule.validate(&strs(&["a", "b"]), &[]).is_ok());
        assert_eq!(
            rule.validate(&[], &[]),
            Err(ArgsError::TooFew { min: 1, actual: 0 })
        );
        assert_eq!(
            rule.validate(&strs(&["a", "b", "c"]), &[]),
            Err(ArgsError::TooMany { max: 2, actual: 3 })
        );
    }

    #[test]
    fn min_and_max() {
        assert!(PositionalArgs::Min(2).validate(&strs(&["a"]), &[]).is_err());
        assert!(PositionalArgs::Max(1).validate(&strs(&["a"]), &[]).is_ok());
    }

    #[test]
    fn one_valid_accepts_listed_value() {
        assert!(one_valid().validate(&strs(&["bash"]), &shells()).is_ok());
    }

    #[test]
    fn one_valid_checks_count_when_empty() {
        assert_eq!(
            one_valid().validate(&[], &shells()),
            Err(ArgsError::TooFew { min: 1, actual: 0 })
        );
    }

    #[test]
    fn one_valid_rejects_unknown_value() {
        let err = one_valid().validate(&strs(&["tcsh"]), &shells()).unwrap_err();
        assert!(matches!(err, ArgsError::Invalid { ref arg, .. } if arg == "tcsh"));
        assert!(err.to_string().contains("powershell"));
    }

    #[test]
    fn count_is_checked_before_membership() {
        // "tcsh" is invalid too, but the count rule runs first.
        assert_eq!(
            one_valid().validate(&strs(&["tcsh", "zsh"]), &shells()),
            Err(ArgsError::TooMany { max: 1, actual: 2 })
        );
        assert_eq!(
            one_valid().validate(&strs(&["bash", "zsh"]), &shells()),
            Err(ArgsError::TooMany { max: 1, actual: 2 })
        );
    }

    #[test]
    fn only_valid_ignores_descriptions() {
        let valid = strs(&["start\tStart the service", "stop\tStop it"]);
        assert!(PositionalArgs::OnlyValid.validate(&strs(&["stop"]), &valid).is_ok());
        assert!(PositionalArgs::OnlyValid.validate(&strs(&["Stop it"]), &valid).is_err());
    }

    #[test]
    fn only_valid_without_list_accepts_all() {
        assert!(PositionalArgs::OnlyValid.validate(&strs(&["x"]), &[]).is_ok());
    }
}
