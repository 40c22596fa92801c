use std::collections::HashMap;

use heck::ToShoutySnakeCase;

use crate::error::SoilError;

/// Derive the environment variable name for a settings key.
///
/// Each dotted segment is converted to SHOUTY_SNAKE_CASE and segments are
/// joined with `__`, so nesting stays distinguishable from word breaks.
/// A prefix is joined with `__` as well.
///
/// | prefix  | key                | variable                  |
/// |---------|--------------------|---------------------------|
/// | none    | `loglevel`         | `LOGLEVEL`                |
/// | none    | `log-level`        | `LOG_LEVEL`               |
/// | `MYAPP` | `server.max-conn`  | `MYAPP__SERVER__MAX_CONN` |
pub fn env_var_name(prefix: Option<&str>, key: &str) -> String {
    let body = key
        .split('.')
        .map(|segment| segment.to_shouty_snake_case())
        .collect::<Vec<_>>()
        .join("__");
    match prefix {
        Some(p) if !p.is_empty() => format!("{}__{body}", p.to_shouty_snake_case()),
        _ => body,
    }
}

/// Snapshot of environment variables used during resolution.
///
/// Built from an iterator so tests can pass synthetic data instead of
/// `std::env::vars()`.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    prefix: Option<String>,
    vars: HashMap<String, String>,
}

impl EnvVars {
    pub fn new(
        prefix: Option<String>,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            prefix,
            vars: vars.into_iter().collect(),
        }
    }

    /// The variable name a key reads from, honouring an explicit override.
    pub fn var_name(&self, key: &str, explicit: Option<&str>) -> String {
        match explicit {
            Some(name) => name.to_string(),
            None => env_var_name(self.prefix.as_deref(), key),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Reject two different keys that map onto the same variable.
///
/// `pairs` yields `(key, variable)` in declaration order. The same key bound
/// on several commands is fine.
pub fn check_collisions<'a>(
    pairs: impl IntoIterator<Item = (&'a str, String)>,
) -> Result<(), SoilError> {
    let mut seen: HashMap<String, &'a str> = HashMap::new();
    for (key, var) in pairs {
        match seen.get(&var) {
            Some(first) if *first != key => {
                return Err(SoilError::EnvCollision {
                    var,
                    first: first.to_string(),
                    second: key.to_string(),
                });
            }
            Some(_) => {}
            None => {
                seen.insert(var, key);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn single_word_key() {
        assert_eq!(env_var_name(None, "loglevel"), "LOGLEVEL");
    }

    #[test]
    fn hyphenated_key_becomes_upper_snake() {
        assert_eq!(env_var_name(None, "log-level"), "LOG_LEVEL");
        assert_eq!(env_var_name(None, "max-open-files"), "MAX_OPEN_FILES");
    }

    #[test]
    fn dotted_key_uses_double_underscore() {
        assert_eq!(env_var_name(None, "server.max-conn"), "SERVER__MAX_CONN");
    }

    #[test]
    fn prefix_is_joined_with_double_underscore() {
        assert_eq!(env_var_name(Some("MYAPP"), "log-level"), "MYAPP__LOG_LEVEL");
        assert_eq!(env_var_name(Some("my-app"), "port"), "MY_APP__PORT");
    }

    #[test]
    fn empty_prefix_is_ignored() {
        assert_eq!(env_var_name(Some(""), "port"), "PORT");
    }

    #[test]
    fn explicit_name_bypasses_prefix() {
        let env = EnvVars::new(Some("APP".into()), vars(&[]));
        assert_eq!(env.var_name("log-level", None), "APP__LOG_LEVEL");
        assert_eq!(env.var_name("log-level", Some("RUST_LOG")), "RUST_LOG");
    }

    #[test]
    fn lookup_reads_synthetic_vars() {
        let env = EnvVars::new(None, vars(&[("LOGLEVEL", "debug")]));
        assert_eq!(env.get("LOGLEVEL"), Some("debug"));
        assert_eq!(env.get("LOGFILE"), None);
    }

    #[test]
    fn collision_between_different_keys_is_rejected() {
        let result = check_collisions([
            ("log-level", env_var_name(None, "log-level")),
            ("log_level", env_var_name(None, "log_level")),
        ]);
        match result {
            Err(SoilError::EnvCollision { var, first, second }) => {
                assert_eq!(var, "LOG_LEVEL");
                assert_eq!(first, "log-level");
                assert_eq!(second, "log_level");
            }
            other => panic!("Expected EnvCollision, got {other:?}"),
        }
    }

    #[test]
    fn same_key_twice_is_not_a_collision() {
        let result = check_collisions([
            ("output", env_var_name(None, "output")),
            ("output", env_var_name(None, "output")),
        ]);
        assert!(result.is_ok());
    }
}
