//! Editor configuration
//!
//! A flat store of dotted keys (`table.defaultHeadings.rows`). Features
//! `define` their defaults when they are registered; user values set before
//! or after that take precedence.
//!
//! # Loading
//!
//! ```toml
//! [table.defaultHeadings]
//! rows = 1
//! columns = 0
//!
//! [engine]
//! postFixIterationCap = 32
//! ```

use std::fmt;

use indexmap::IndexMap;

use crate::utils::error::{EditorError, EditorResult};

/// A configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Integer(i64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Integer(n) => write!(f, "{}", n),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Integer(n)
    }
}

impl From<usize> for ConfigValue {
    fn from(n: usize) -> Self {
        ConfigValue::Integer(n as i64)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

/// Defaults plus user overrides
#[derive(Debug, Clone, Default)]
pub struct Config {
    defaults: IndexMap<String, ConfigValue>,
    values: IndexMap<String, ConfigValue>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a default; user values are left alone
    pub fn define(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.defaults.insert(key.to_string(), value.into());
    }

    /// Set a user value
    pub fn set(&mut self, key: &str, value: impl Into<ConfigValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key).or_else(|| self.defaults.get(key))
    }

    pub fn get_i64(&self, key: &str) -> EditorResult<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(ConfigValue::Integer(n)) => Ok(Some(*n)),
            Some(other) => Err(EditorError::config(format!(
                "'{}' must be an integer, got {}",
                key, other
            ))),
        }
    }

    /// Non-negative integer value, `default` when unset
    pub fn get_usize(&self, key: &str, default: usize) -> EditorResult<usize> {
        match self.get_i64(key)? {
            None => Ok(default),
            Some(n) if n >= 0 => Ok(n as usize),
            Some(n) => Err(EditorError::config(format!(
                "'{}' must not be negative, got {}",
                key, n
            ))),
        }
    }

    /// Every key with its effective value, defaults first
    pub fn entries(&self) -> Vec<(&str, &ConfigValue)> {
        let mut keys: Vec<&str> = self.defaults.keys().map(String::as_str).collect();
        for key in self.values.keys() {
            if !self.defaults.contains_key(key) {
                keys.push(key);
            }
        }
        keys.into_iter()
            .filter_map(|k| self.get(k).map(|v| (k, v)))
            .collect()
    }

    /// Parse TOML and take every leaf as a user value under its dotted key
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(input: &str) -> EditorResult<Self> {
        let table: toml::Table = input
            .parse()
            .map_err(|e: toml::de::Error| EditorError::config(e.message().to_string()))?;
        let mut config = Self::new();
        flatten_toml(&mut config, "", &table)?;
        Ok(config)
    }

    /// Load a TOML file from disk
    #[cfg(feature = "config-toml")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> EditorResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Copy every user value of `other` over this config
    pub fn merge(&mut self, other: &Config) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(feature = "config-toml")]
fn flatten_toml(config: &mut Config, prefix: &str, table: &toml::Table) -> EditorResult<()> {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(inner) => flatten_toml(config, &path, inner)?,
            toml::Value::Integer(n) => config.set(&path, *n),
            toml::Value::Boolean(b) => config.set(&path, *b),
            toml::Value::String(s) => config.set(&path, s.as_str()),
            other => {
                return Err(EditorError::config(format!(
                    "unsupported value for '{}': {}",
                    path,
                    other.type_str()
                )))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_value_overrides_default() {
        let mut config = Config::new();
        config.set("table.defaultHeadings.rows", 2i64);
        config.define("table.defaultHeadings.rows", 0i64);
        config.define("table.defaultHeadings.columns", 0i64);

        assert_eq!(config.get_usize("table.defaultHeadings.rows", 0).unwrap(), 2);
        assert_eq!(config.get_usize("table.defaultHeadings.columns", 9).unwrap(), 0);
        assert_eq!(config.get_usize("missing", 7).unwrap(), 7);
    }

    #[test]
    fn test_type_errors() {
        let mut config = Config::new();
        config.set("a", "text");
        config.set("b", -1i64);
        assert!(config.get_usize("a", 0).is_err());
        assert!(config.get_usize("b", 0).is_err());
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn test_from_toml() {
        let config = Config::from_toml_str(
            r#"
            [table.defaultHeadings]
            rows = 1
            columns = 2

            [engine]
            postFixIterationCap = 32
            "#,
        )
        .unwrap();

        assert_eq!(config.get_i64("table.defaultHeadings.rows").unwrap(), Some(1));
        assert_eq!(config.get_i64("table.defaultHeadings.columns").unwrap(), Some(2));
        assert_eq!(config.get_usize("engine.postFixIterationCap", 16).unwrap(), 32);
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn test_from_toml_rejects_arrays() {
        assert!(Config::from_toml_str("list = [1, 2]").is_err());
        assert!(Config::from_toml_str("not toml at all [").is_err());
    }
}
