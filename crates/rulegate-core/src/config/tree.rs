//! Plain configuration trees.

use super::{Config, ConfigError, ValidationView, KEY_SEPARATOR};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A configuration node backed directly by a [`Value`] map.
///
/// Navigating with [`Config::sub_config`] produces a new node scoped to the
/// nested map; the parent is never touched.
#[derive(Clone)]
pub struct TreeConfig {
    properties: Arc<BTreeMap<String, Value>>,
    path: Vec<String>,
    parent: Option<Arc<dyn Config>>,
}

impl TreeConfig {
    /// Creates an empty root node.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_map(BTreeMap::new())
    }

    /// Creates a root node over `properties`.
    #[must_use]
    pub fn from_map(properties: BTreeMap<String, Value>) -> Self {
        Self {
            properties: Arc::new(properties),
            path: Vec::new(),
            parent: None,
        }
    }

    /// Creates a root node from a value tree.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a map.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Map(properties) => Ok(Self::from_map(properties)),
            other => Err(ConfigError::Parse {
                message: format!("configuration root must be a map, found \"{other}\""),
            }),
        }
    }

    /// Parses a root node from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        Self::from_value(Value::from(toml::Value::Table(table)))
    }

    /// Loads a root node from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// The properties held by this node.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// The segments leading to this node from the root.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for TreeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeConfig")
            .field("path", &self.path)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

impl Config for TreeConfig {
    fn parent_path(&self) -> Option<String> {
        if self.path.is_empty() {
            None
        } else {
            Some(self.path.join(KEY_SEPARATOR))
        }
    }

    fn parent(&self) -> Option<Arc<dyn Config>> {
        self.parent.clone()
    }

    fn sub_config(&self, key: &str) -> Arc<dyn Config> {
        let properties = match self.properties.get(key) {
            Some(Value::Map(map)) => map.clone(),
            _ => BTreeMap::new(),
        };
        let mut path = self.path.clone();
        path.push(key.to_string());
        Arc::new(Self {
            properties: Arc::new(properties),
            path,
            parent: Some(Arc::new(self.clone())),
        })
    }

    fn sub_config_keys(&self) -> BTreeSet<String> {
        self.properties
            .iter()
            .filter(|(_, value)| value.is_map())
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn raw_value(&self, key: &str) -> Option<Value> {
        self.properties.get(key).cloned()
    }

    fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn validation_view(&self) -> ValidationView<'_> {
        ValidationView::Tree(&self.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigExt;
    use std::io::Write;

    #[test]
    fn sub_config_scopes_to_nested_map() {
        let config = TreeConfig::parse(
            r#"
[style.MagicNumber]
active = true
"#,
        )
        .unwrap();
        let rule = config.sub_config("style").sub_config("MagicNumber");
        assert!(rule.value_or_default("active", false).unwrap());
        assert_eq!(
            rule.parent_path().as_deref(),
            Some("style > MagicNumber")
        );
    }

    #[test]
    fn missing_sub_config_is_empty_but_keeps_path() {
        let config = TreeConfig::parse("").unwrap();
        let missing = config.sub_config("nope").sub_config("deeper");
        assert!(missing.is_empty());
        assert_eq!(missing.parent_path().as_deref(), Some("nope > deeper"));
    }

    #[test]
    fn navigating_never_mutates_parent() {
        let config = TreeConfig::parse("[a]\nb = 1").unwrap();
        let _child = config.sub_config("a");
        assert_eq!(config.sub_config_keys(), BTreeSet::from(["a".to_string()]));
        assert!(config.parent().is_none());
    }

    #[test]
    fn child_parent_points_back() {
        let config = TreeConfig::parse("[a.b]\nc = 1").unwrap();
        let child = config.sub_config("a").sub_config("b");
        let parent = child.parent().unwrap();
        assert_eq!(parent.parent_path().as_deref(), Some("a"));
    }

    #[test]
    fn rejects_invalid_toml() {
        let err = TreeConfig::parse("[broken").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[build]\nmaxIssues = 3").unwrap();
        let config = TreeConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config
                .sub_config("build")
                .value_or_default("maxIssues", -1_i64)
                .unwrap(),
            3
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TreeConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
