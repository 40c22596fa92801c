//! The configuration-value store.
//!
//! Flags bound with [`env`](crate::FlagSpec::env) land here after parsing,
//! keyed by their binding key. Each key resolves through three layers:
//!
//! ```text
//! Declared default       flag("port", int(8080))
//!        ↑ overridden by
//! Environment variable   PORT / PREFIX__PORT / explicit env_var(..)
//!        ↑ overridden by
//! Command line           --port 9000
//! ```
//!
//! Values are kept in a `toml::Table` (dotted keys nest), so a typed struct
//! can be pulled out with [`Settings::extract`].

use std::collections::BTreeMap;
use std::time::Duration;

use confique::Config;
use serde::Deserialize;
use toml::{Table, Value};

use crate::duration::parse_duration;
use crate::env::EnvVars;
use crate::error::SoilError;
use crate::types::FlagValue;

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    CommandLine,
    /// The named environment variable.
    Environment(String),
    Default,
}

/// Resolved flag values, addressable by dotted key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: Table,
    origins: BTreeMap<String, Origin>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` directly, recording it as coming from the command line.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.insert(key, value.into(), Origin::CommandLine);
    }

    fn insert(&mut self, key: &str, value: Value, origin: Origin) {
        set_nested(&mut self.values, key, value);
        self.origins.insert(key.to_string(), origin);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        table_get(&self.values, key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// The value as text; scalars of other types are formatted.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_integer()
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn get_duration(&self, key: &str) -> Option<Duration> {
        parse_duration(self.get_str(key)?).ok()
    }

    pub fn origin(&self, key: &str) -> Option<&Origin> {
        self.origins.get(key)
    }

    /// All resolved keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.origins.keys().map(String::as_str)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.origins.contains_key(key)
    }

    /// Deserialize the store into a confique config, filling its defaults.
    ///
    /// Keys the config does not know are ignored, so one store can feed
    /// several configs.
    pub fn extract<C: Config>(&self) -> Result<C, SoilError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        let layer: C::Layer = Value::Table(self.values.clone())
            .try_into()
            .map_err(|e: toml::de::Error| SoilError::InvalidValue {
                key: "<settings>".into(),
                reason: e.to_string(),
            })?;

        C::builder()
            .preloaded(layer)
            .load()
            .map_err(SoilError::from)
    }
}

/// A flag bound into the store, as recorded during lowering.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub key: String,
    pub flag: String,
    pub env_var: Option<String>,
    pub default: FlagValue,
    /// Command path of the declaring node, root first.
    pub path: Vec<String>,
    pub persistent: bool,
}

impl Binding {
    fn on_path(&self, invoked: &[String]) -> bool {
        invoked.starts_with(&self.path)
    }
}

/// Resolve every bound key for one invocation.
///
/// `cli_value` returns the explicit command-line value for a binding, if the
/// user passed one. When several bindings share a key, the deepest one on
/// the invoked path wins; otherwise the first declared supplies the default
/// and neither the command line nor the environment is consulted.
pub(crate) fn resolve(
    bindings: &[Binding],
    invoked: &[String],
    env: Option<&EnvVars>,
    cli_value: impl Fn(&Binding) -> Option<FlagValue>,
) -> Result<Settings, SoilError> {
    let mut settings = Settings::new();
    let mut keys: Vec<&str> = Vec::new();
    for binding in bindings {
        if !keys.contains(&binding.key.as_str()) {
            keys.push(&binding.key);
        }
    }

    for key in keys {
        let candidates = bindings.iter().filter(|b| b.key == key);
        let chosen = candidates
            .clone()
            .filter(|b| b.on_path(invoked))
            .max_by_key(|b| b.path.len())
            .or_else(|| candidates.clone().next());
        let Some(binding) = chosen else {
            continue;
        };

        // Bindings off the invoked path contribute their declared default
        // only; a sibling's environment value never fails this command.
        if !binding.on_path(invoked) {
            settings.insert(key, binding.default.to_toml(), Origin::Default);
            continue;
        }

        if let Some(value) = cli_value(binding) {
            settings.insert(key, value.to_toml(), Origin::CommandLine);
            continue;
        }

        if let Some(env) = env {
            let var = env.var_name(key, binding.env_var.as_deref());
            if let Some(raw) = env.get(&var) {
                let value =
                    binding
                        .default
                        .parse_same(raw)
                        .map_err(|reason| SoilError::InvalidValue {
                            key: key.to_string(),
                            reason: format!("{reason} (from {var})"),
                        })?;
                settings.insert(key, value.to_toml(), Origin::Environment(var));
                continue;
            }
        }

        settings.insert(key, binding.default.to_toml(), Origin::Default);
    }

    Ok(settings)
}

/// `("database.url", v)` becomes `{database = {url = v}}`. A scalar in the
/// way of a nested key is replaced by a table.
fn set_nested(table: &mut Table, dotted_key: &str, value: Value) {
    let (path, leaf) = match dotted_key.rsplit_once('.') {
        Some((p, l)) => (Some(p), l),
        None => (None, dotted_key),
    };

    let mut current = table;
    if let Some(path) = path {
        for segment in path.split('.') {
            let entry = current
                .entry(segment)
                .or_insert_with(|| Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = Value::Table(Table::new());
            }
            let Value::Table(next) = entry else {
                unreachable!("entry was just made a table");
            };
            current = next;
        }
    }
    current.insert(leaf.to_string(), value);
}

/// Navigate a `toml::Table` by dotted key path.
fn table_get<'a>(table: &'a Table, dotted_key: &str) -> Option<&'a Value> {
    let (path, leaf) = match dotted_key.rsplit_once('.') {
        Some((p, l)) => (Some(p), l),
        None => (None, dotted_key),
    };

    let tbl = match path {
        Some(path) => {
            let mut current = table;
            for segment in path.split('.') {
                current = current.get(segment)?.as_table()?;
            }
            current
        }
        None => table,
    };

    tbl.get(leaf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{PortConfig, binding};

    fn path(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn env(pairs: &[(&str, &str)]) -> EnvVars {
        EnvVars::new(
            None,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    fn no_cli(_: &Binding) -> Option<FlagValue> {
        None
    }

    #[test]
    fn default_when_nothing_else() {
        let bindings = vec![binding("port", FlagValue::Int(8080), &["app"])];
        let s = resolve(&bindings, &path(&["app"]), Some(&env(&[])), no_cli).unwrap();
        assert_eq!(s.get_int("port"), Some(8080));
        assert_eq!(s.origin("port"), Some(&Origin::Default));
    }

    #[test]
    fn env_overrides_default() {
        let bindings = vec![binding("port", FlagValue::Int(8080), &["app"])];
        let s = resolve(
            &bindings,
            &path(&["app"]),
            Some(&env(&[("PORT", "9000")])),
            no_cli,
        )
        .unwrap();
        assert_eq!(s.get_int("port"), Some(9000));
        assert_eq!(s.origin("port"), Some(&Origin::Environment("PORT".into())));
    }

    #[test]
    fn cli_overrides_env() {
        let bindings = vec![binding("port", FlagValue::Int(8080), &["app"])];
        let s = resolve(
            &bindings,
            &path(&["app"]),
            Some(&env(&[("PORT", "9000")])),
            |_| Some(FlagValue::Int(7000)),
        )
        .unwrap();
        assert_eq!(s.get_int("port"), Some(7000));
        assert_eq!(s.origin("port"), Some(&Origin::CommandLine));
    }

    #[test]
    fn env_disabled_skips_lookup() {
        let bindings = vec![binding("port", FlagValue::Int(8080), &["app"])];
        let s = resolve(&bindings, &path(&["app"]), None, no_cli).unwrap();
        assert_eq!(s.get_int("port"), Some(8080));
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let bindings = vec![binding("port", FlagValue::Int(8080), &["app"])];
        let result = resolve(
            &bindings,
            &path(&["app"]),
            Some(&env(&[("PORT", "eighty")])),
            no_cli,
        );
        match result {
            Err(SoilError::InvalidValue { key, reason }) => {
                assert_eq!(key, "port");
                assert!(reason.contains("PORT"));
            }
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn explicit_env_var_is_used() {
        let mut b = binding("token", FlagValue::Str(String::new()), &["app"]);
        b.env_var = Some("API_TOKEN".into());
        let s = resolve(
            &[b],
            &path(&["app"]),
            Some(&env(&[("TOKEN", "wrong"), ("API_TOKEN", "right")])),
            no_cli,
        )
        .unwrap();
        assert_eq!(s.get_str("token"), Some("right"));
    }

    #[test]
    fn deepest_binding_on_path_wins() {
        let bindings = vec![
            binding("output", FlagValue::Str("root".into()), &["app"]),
            binding("output", FlagValue::Str("child".into()), &["app", "export"]),
            binding("output", FlagValue::Str("other".into()), &["app", "import"]),
        ];
        let s = resolve(&bindings, &path(&["app", "export"]), None, no_cli).unwrap();
        assert_eq!(s.get_str("output"), Some("child"));
    }

    #[test]
    fn off_path_binding_supplies_default_only() {
        let bindings = vec![binding("output", FlagValue::Str("x".into()), &["app", "export"])];
        let s = resolve(&bindings, &path(&["app"]), None, |_| {
            Some(FlagValue::Str("never".into()))
        })
        .unwrap();
        assert_eq!(s.get_str("output"), Some("x"));
    }

    #[test]
    fn off_path_binding_ignores_environment() {
        let bindings = vec![
            binding("port", FlagValue::Int(8080), &["app", "serve"]),
            binding("verbose", FlagValue::Bool(false), &["app"]),
        ];
        let s = resolve(
            &bindings,
            &path(&["app", "version"]),
            Some(&env(&[("PORT", "http"), ("VERBOSE", "true")])),
            no_cli,
        )
        .unwrap();
        assert_eq!(s.get_int("port"), Some(8080));
        assert_eq!(s.origin("port"), Some(&Origin::Default));
        assert_eq!(s.get_bool("verbose"), Some(true));
    }

    #[test]
    fn dotted_keys_nest() {
        let mut s = Settings::new();
        s.set("server.port", 3000);
        s.set("server.host", "0.0.0.0");
        assert_eq!(s.get_int("server.port"), Some(3000));
        assert!(s.get("server").unwrap().is_table());
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["server.host", "server.port"]);
    }

    #[test]
    fn typed_getters() {
        let mut s = Settings::new();
        s.set("ratio", 2);
        s.set("timeout", "1m30s");
        s.set("debug", true);
        assert_eq!(s.get_float("ratio"), Some(2.0));
        assert_eq!(s.get_string("ratio"), Some("2".into()));
        assert_eq!(s.get_duration("timeout"), Some(Duration::from_secs(90)));
        assert_eq!(s.get_bool("debug"), Some(true));
        assert_eq!(s.get_int("missing"), None);
    }

    #[test]
    fn extract_fills_defaults() {
        let s = Settings::new();
        let config: PortConfig = s.extract().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn extract_reads_values_and_ignores_unknown_keys() {
        let mut s = Settings::new();
        s.set("port", 3000);
        s.set("unrelated", "x");
        let config: PortConfig = s.extract().unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn extract_rejects_wrong_type() {
        let mut s = Settings::new();
        s.set("port", "not a number");
        let result: Result<PortConfig, _> = s.extract();
        assert!(result.is_err());
    }
}
