//! Two-layer configuration with primary-wins semantics.

use super::{Config, ValidationView};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Layers `primary` over `secondary`.
///
/// A key is answered by `primary` whenever `primary` has an entry for it
/// (presence, not truthiness), otherwise by `secondary`. Navigation always
/// builds a new composite of both children, so every nested key is decided
/// on its own rather than picking one subtree wholesale.
#[derive(Clone)]
pub struct CompositeConfig {
    primary: Arc<dyn Config>,
    secondary: Arc<dyn Config>,
    parent: Option<Arc<dyn Config>>,
}

impl CompositeConfig {
    /// Creates a composite that consults `primary` before `secondary`.
    #[must_use]
    pub fn new(primary: Arc<dyn Config>, secondary: Arc<dyn Config>) -> Self {
        Self {
            primary,
            secondary,
            parent: None,
        }
    }

    /// The layer consulted first.
    #[must_use]
    pub fn primary(&self) -> &Arc<dyn Config> {
        &self.primary
    }

    /// The fallback layer.
    #[must_use]
    pub fn secondary(&self) -> &Arc<dyn Config> {
        &self.secondary
    }
}

impl fmt::Debug for CompositeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeConfig")
            .field("primary", &self.primary)
            .field("secondary", &self.secondary)
            .finish_non_exhaustive()
    }
}

impl Config for CompositeConfig {
    fn parent_path(&self) -> Option<String> {
        self.primary
            .parent_path()
            .or_else(|| self.secondary.parent_path())
    }

    fn parent(&self) -> Option<Arc<dyn Config>> {
        self.parent.clone()
    }

    fn sub_config(&self, key: &str) -> Arc<dyn Config> {
        Arc::new(Self {
            primary: self.primary.sub_config(key),
            secondary: self.secondary.sub_config(key),
            parent: Some(Arc::new(self.clone())),
        })
    }

    fn sub_config_keys(&self) -> BTreeSet<String> {
        let mut keys = self.primary.sub_config_keys();
        keys.extend(self.secondary.sub_config_keys());
        keys
    }

    fn raw_value(&self, key: &str) -> Option<Value> {
        match (self.primary.raw_value(key), self.secondary.raw_value(key)) {
            (Some(Value::Map(primary)), Some(Value::Map(secondary))) => {
                Some(Value::Map(merge_maps(primary, secondary)))
            }
            (Some(value), _) => Some(value),
            (None, fallback) => fallback,
        }
    }

    fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }

    fn validation_view(&self) -> ValidationView<'_> {
        ValidationView::Composite(&*self.primary, &*self.secondary)
    }
}

fn merge_maps(
    primary: BTreeMap<String, Value>,
    mut secondary: BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
    for (key, value) in primary {
        let merged = match (value, secondary.remove(&key)) {
            (Value::Map(p), Some(Value::Map(s))) => Value::Map(merge_maps(p, s)),
            (value, _) => value,
        };
        secondary.insert(key, merged);
    }
    secondary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigExt, TreeConfig};

    fn tree(content: &str) -> Arc<dyn Config> {
        Arc::new(TreeConfig::parse(content).unwrap())
    }

    fn composite(primary: &str, secondary: &str) -> CompositeConfig {
        CompositeConfig::new(tree(primary), tree(secondary))
    }

    #[test]
    fn primary_override_wins_for_nested_rule() {
        let second = r"
[style.WildcardImport]
active = false
";
        let first = r#"
[style.WildcardImport]
excludeImports = ["java.util.*"]

[style.MagicNumber]
active = true
"#;
        let config = composite(second, first);
        let rule = config.sub_config("style").sub_config("WildcardImport");
        assert!(!rule.value_or_default("active", true).unwrap());
        let imports: Vec<String> = rule.value_or_default("excludeImports", vec![]).unwrap();
        assert_eq!(imports, vec!["java.util.*"]);
    }

    #[test]
    fn falls_back_to_secondary_at_every_depth() {
        let config = composite(
            "[a.b]\nx = 1",
            "[a.b]\nx = 2\ny = 3\n[a.b.c]\nz = 4",
        );
        let b = config.sub_config("a").sub_config("b");
        assert_eq!(b.value_or_default("x", 0_i64).unwrap(), 1);
        assert_eq!(b.value_or_default("y", 0_i64).unwrap(), 3);
        assert_eq!(
            b.sub_config("c").value_or_default("z", 0_i64).unwrap(),
            4
        );
    }

    #[test]
    fn falsy_primary_value_still_wins() {
        let config = composite("flag = false\ncount = 0", "flag = true\ncount = 9");
        assert!(!config.value_or_default("flag", true).unwrap());
        assert_eq!(config.value_or_default("count", 1_i64).unwrap(), 0);
    }

    #[test]
    fn sub_config_is_composite_even_when_one_side_is_empty() {
        let config = composite("", "[only]\nvalue = \"secondary\"");
        let only = config.sub_config("only");
        assert_eq!(
            only.value_or_default("value", String::new()).unwrap(),
            "secondary"
        );
        assert!(matches!(
            only.validation_view(),
            ValidationView::Composite(..)
        ));
    }

    #[test]
    fn raw_maps_are_merged_primary_first() {
        let config = composite("[m]\na = 1", "[m]\na = 2\nb = 3");
        let Some(Value::Map(merged)) = config.raw_value("m") else {
            panic!("expected merged map");
        };
        assert_eq!(merged["a"], Value::Int(1));
        assert_eq!(merged["b"], Value::Int(3));
    }

    #[test]
    fn nested_composites_compose() {
        let inner = Arc::new(composite("x = 1", "y = 2"));
        let outer = CompositeConfig::new(tree("z = 3"), inner);
        assert_eq!(outer.value_or_default("x", 0_i64).unwrap(), 1);
        assert_eq!(outer.value_or_default("y", 0_i64).unwrap(), 2);
        assert_eq!(outer.value_or_default("z", 0_i64).unwrap(), 3);
    }

    #[test]
    fn parent_path_comes_from_either_side() {
        let config = composite("", "");
        let child = config.sub_config("style");
        assert_eq!(child.parent_path().as_deref(), Some("style"));
        assert_eq!(
            child.key_sequence("active"),
            "style > active"
        );
    }
}
