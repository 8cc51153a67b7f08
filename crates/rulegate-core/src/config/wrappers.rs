//! Decorators that override a single key and pass everything else through.

use super::{Config, ValidationView, ACTIVE_KEY, AUTO_CORRECT_KEY};
use crate::value::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Turns every rule on unless it is explicitly switched off.
///
/// `active` resolves to the value in `original` if present, else the value
/// in `default` if present, else `true`. Every other key is answered by
/// `original`, then `default`.
#[derive(Clone)]
pub struct AllRulesConfig {
    original: Arc<dyn Config>,
    default: Arc<dyn Config>,
    parent: Option<Arc<dyn Config>>,
}

impl AllRulesConfig {
    /// Wraps `original`, using `default` for keys it does not set.
    #[must_use]
    pub fn new(original: Arc<dyn Config>, default: Arc<dyn Config>) -> Self {
        Self {
            original,
            default,
            parent: None,
        }
    }
}

impl fmt::Debug for AllRulesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllRulesConfig")
            .field("original", &self.original)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

impl Config for AllRulesConfig {
    fn parent_path(&self) -> Option<String> {
        self.original
            .parent_path()
            .or_else(|| self.default.parent_path())
    }

    fn parent(&self) -> Option<Arc<dyn Config>> {
        self.parent.clone()
    }

    fn sub_config(&self, key: &str) -> Arc<dyn Config> {
        Arc::new(Self {
            original: self.original.sub_config(key),
            default: self.default.sub_config(key),
            parent: Some(Arc::new(self.clone())),
        })
    }

    fn sub_config_keys(&self) -> BTreeSet<String> {
        let mut keys = self.original.sub_config_keys();
        keys.extend(self.default.sub_config_keys());
        keys
    }

    fn raw_value(&self, key: &str) -> Option<Value> {
        let value = self
            .original
            .raw_value(key)
            .or_else(|| self.default.raw_value(key));
        if key == ACTIVE_KEY {
            Some(value.unwrap_or(Value::Bool(true)))
        } else {
            value
        }
    }

    fn is_empty(&self) -> bool {
        self.original.is_empty() && self.default.is_empty()
    }

    fn validation_view(&self) -> ValidationView<'_> {
        ValidationView::Delegate(&*self.original)
    }
}

/// Forces `autoCorrect` to `false` at every depth.
///
/// Used when the global auto-correct switch is off. Children are re-wrapped
/// on navigation and report this wrapper as their parent.
#[derive(Clone)]
pub struct DisabledAutoCorrectConfig {
    wrapped: Arc<dyn Config>,
    parent: Option<Arc<dyn Config>>,
}

impl DisabledAutoCorrectConfig {
    /// Wraps `wrapped`.
    #[must_use]
    pub fn new(wrapped: Arc<dyn Config>) -> Self {
        Self {
            wrapped,
            parent: None,
        }
    }
}

impl fmt::Debug for DisabledAutoCorrectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisabledAutoCorrectConfig")
            .field("wrapped", &self.wrapped)
            .finish_non_exhaustive()
    }
}

impl Config for DisabledAutoCorrectConfig {
    fn parent_path(&self) -> Option<String> {
        self.wrapped.parent_path()
    }

    fn parent(&self) -> Option<Arc<dyn Config>> {
        self.parent.clone()
    }

    fn sub_config(&self, key: &str) -> Arc<dyn Config> {
        Arc::new(Self {
            wrapped: self.wrapped.sub_config(key),
            parent: Some(Arc::new(self.clone())),
        })
    }

    fn sub_config_keys(&self) -> BTreeSet<String> {
        self.wrapped.sub_config_keys()
    }

    fn raw_value(&self, key: &str) -> Option<Value> {
        if key == AUTO_CORRECT_KEY {
            Some(Value::Bool(false))
        } else {
            self.wrapped.raw_value(key)
        }
    }

    fn is_empty(&self) -> bool {
        self.wrapped.is_empty()
    }

    fn validation_view(&self) -> ValidationView<'_> {
        ValidationView::Delegate(&*self.wrapped)
    }
}
