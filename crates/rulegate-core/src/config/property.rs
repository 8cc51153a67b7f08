//! Memoized, typed configuration properties.
//!
//! Checks declare their tunables as [`ConfigProperty`] fields bound to their
//! own config node. The value is read, coerced and transformed on first
//! access and cached for the lifetime of the check.

use super::{Config, ConfigError, ConfigExt};
use crate::value::ConfigValue;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

type Transform<R, T> = Box<dyn Fn(R) -> T + Send + Sync>;

/// A lazily resolved configuration value.
///
/// `R` is the raw property type read from config; `T` is what the optional
/// transform turns it into. Resolution happens at most once: the cache is a
/// write-once cell, so the transform runs exactly once even if several
/// threads race on first access. Errors are returned and not cached.
///
/// # Example
///
/// ```ignore
/// let pattern = ConfigProperty::with_transform(
///     Arc::clone(&rule_config),
///     "functionPattern",
///     "[a-z][a-zA-Z0-9]*".to_string(),
///     |raw| Regex::new(&raw).ok(),
/// );
/// let regex = pattern.get()?;
/// ```
pub struct ConfigProperty<R, T = R> {
    config: Arc<dyn Config>,
    key: String,
    fallback_key: Option<String>,
    default: R,
    transform: Transform<R, T>,
    cell: OnceCell<T>,
}

impl<R> ConfigProperty<R, R>
where
    R: ConfigValue + Clone + Send + Sync + 'static,
{
    /// Binds `key` in `config` with a default.
    #[must_use]
    pub fn new(config: Arc<dyn Config>, key: impl Into<String>, default: R) -> Self {
        Self::with_transform(config, key, default, |value| value)
    }
}

impl<R, T> ConfigProperty<R, T>
where
    R: ConfigValue + Clone,
{
    /// Binds `key` in `config` and transforms the resolved value.
    #[must_use]
    pub fn with_transform(
        config: Arc<dyn Config>,
        key: impl Into<String>,
        default: R,
        transform: impl Fn(R) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            key: key.into(),
            fallback_key: None,
            default,
            transform: Box::new(transform),
            cell: OnceCell::new(),
        }
    }

    /// Consults `key` when the primary key is absent.
    #[must_use]
    pub fn with_fallback(mut self, key: impl Into<String>) -> Self {
        self.fallback_key = Some(key.into());
        self
    }

    /// The primary key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolves the value, computing it on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if the primary or fallback value is present but not
    /// coercible to `R`.
    pub fn get(&self) -> Result<&T, ConfigError> {
        self.cell.get_or_try_init(|| {
            let raw = self.resolve_raw()?;
            Ok((self.transform)(raw))
        })
    }

    fn resolve_raw(&self) -> Result<R, ConfigError> {
        if let Some(value) = self.config.value_or_none::<R>(&self.key)? {
            return Ok(value);
        }
        if let Some(fallback) = &self.fallback_key {
            if let Some(value) = self.config.value_or_none::<R>(fallback)? {
                return Ok(value);
            }
        }
        Ok(self.default.clone())
    }
}

impl<R, T: fmt::Debug> fmt::Debug for ConfigProperty<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigProperty")
            .field("key", &self.key)
            .field("fallback_key", &self.fallback_key)
            .field("resolved", &self.cell.get())
            .finish_non_exhaustive()
    }
}
