//! Layered, type-coercing configuration.
//!
//! A [`Config`] is an immutable view over a subtree of a [`Value`] tree,
//! addressed by a path of segment names. Plain trees ([`TreeConfig`]) can be
//! layered ([`CompositeConfig`]) and decorated ([`AllRulesConfig`],
//! [`DisabledAutoCorrectConfig`]) without changing their shape.
//!
//! Typed reads go through [`ConfigExt`], which coerces raw values and
//! reports failures with the full key path:
//!
//! ```text
//! Value "yes" set for config parameter "style > WildcardImport > active" is not of required type Boolean.
//! ```

mod composite;
pub mod property;
mod tree;
pub mod validation;
mod wrappers;

use crate::value::{Coercion, ConfigValue, Value, ValueKind};
use miette::Diagnostic;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

pub use composite::CompositeConfig;
pub use property::ConfigProperty;
pub use tree::TreeConfig;
pub use validation::{ConfigValidator, Notification, NotificationLevel};
pub use wrappers::{AllRulesConfig, DisabledAutoCorrectConfig};

/// Separator between path segments in rendered key sequences.
pub const KEY_SEPARATOR: &str = " > ";

/// Key holding a rule's (or rule set's) activation flag.
pub const ACTIVE_KEY: &str = "active";
/// Key holding a rule's auto-correct flag.
pub const AUTO_CORRECT_KEY: &str = "autoCorrect";
/// Key holding a rule's aliases.
pub const ALIASES_KEY: &str = "aliases";
/// Key holding a rule's include path patterns.
pub const INCLUDES_KEY: &str = "includes";
/// Key holding a rule's exclude path patterns.
pub const EXCLUDES_KEY: &str = "excludes";
/// Key holding a rule's severity override.
pub const SEVERITY_KEY: &str = "severity";
/// Key holding annotation names that exclude a declaration from a rule.
pub const IGNORE_ANNOTATED_KEY: &str = "ignoreAnnotated";
/// Section holding build settings.
pub const BUILD_KEY: &str = "build";
/// Key (under `build`) holding the maximum number of weighted issues.
pub const MAX_ISSUES_KEY: &str = "maxIssues";
/// Key (under `build`) flipping the auto-corrected issue filter.
pub const EXCLUDE_CORRECTABLE_KEY: &str = "excludeCorrectable";
/// Section holding settings for the configuration itself.
pub const CONFIG_KEY: &str = "config";
/// Key (under `config`) turning validation on or off.
pub const VALIDATION_KEY: &str = "validation";
/// Key (under `config`) promoting validation warnings to errors.
pub const WARNINGS_AS_ERRORS_KEY: &str = "warningsAsErrors";

/// An immutable, navigable view over a configuration subtree.
///
/// Implementations only have to answer raw lookups; typed access with
/// coercion and path-aware errors is provided for every implementation by
/// [`ConfigExt`].
pub trait Config: fmt::Debug + Send + Sync {
    /// The rendered path of this node (`"style > WildcardImport"`), or `None`
    /// for a root.
    fn parent_path(&self) -> Option<String>;

    /// The node this one was navigated from, if any.
    fn parent(&self) -> Option<Arc<dyn Config>> {
        None
    }

    /// Returns the child node at `key`. Missing children are empty nodes,
    /// never errors.
    fn sub_config(&self, key: &str) -> Arc<dyn Config>;

    /// Keys under this node that hold nested maps.
    fn sub_config_keys(&self) -> BTreeSet<String>;

    /// The raw value stored at `key`, if present.
    fn raw_value(&self, key: &str) -> Option<Value>;

    /// Returns true if this node holds no properties at all.
    fn is_empty(&self) -> bool;

    /// Describes the shape of this node to the validator.
    fn validation_view(&self) -> ValidationView<'_> {
        ValidationView::Unsupported
    }
}

/// How a configuration node participates in validation.
#[derive(Debug, Clone, Copy)]
pub enum ValidationView<'a> {
    /// A plain property tree, validated key by key.
    Tree(&'a BTreeMap<String, Value>),
    /// Two layers validated independently, primary first.
    Composite(&'a dyn Config, &'a dyn Config),
    /// A decorator; the wrapped node is validated.
    Delegate(&'a dyn Config),
    /// Cannot be validated.
    Unsupported,
}

/// Typed access to configuration values.
///
/// Blanket-implemented for every [`Config`], including `dyn Config`.
pub trait ConfigExt: Config {
    /// Renders `key` prefixed with this node's path.
    fn key_sequence(&self, key: &str) -> String {
        match self.parent_path() {
            Some(parent) => format!("{parent}{KEY_SEPARATOR}{key}"),
            None => key.to_string(),
        }
    }

    /// Reads `key` as `T`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TypeMismatch`] if the key is present but cannot
    /// be coerced to `T`.
    fn value_or_none<T: ConfigValue>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let Some(raw) = self.value_of_kind(key, T::KIND)? else {
            return Ok(None);
        };
        let rendered = raw.to_string();
        T::from_value(raw)
            .map(Some)
            .ok_or_else(|| ConfigError::TypeMismatch {
                value: rendered,
                path: self.key_sequence(key),
                required: T::KIND.type_name(),
            })
    }

    /// Reads `key` as `T`, falling back to `default` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TypeMismatch`] if the key is present but cannot
    /// be coerced to `T`. A missing key is never an error.
    fn value_or_default<T: ConfigValue>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.value_or_none(key)?.unwrap_or(default))
    }

    /// Reads `key` coerced to a dynamically chosen kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedType`] when `kind` is not a property
    /// type, and [`ConfigError::TypeMismatch`] when the value cannot be
    /// coerced.
    fn value_of_kind(&self, key: &str, kind: ValueKind) -> Result<Option<Value>, ConfigError> {
        let Some(raw) = self.raw_value(key) else {
            return Ok(None);
        };
        let rendered = raw.to_string();
        match raw.coerce(kind) {
            Ok(value) => Ok(Some(value)),
            Err(Coercion::Mismatch) => Err(ConfigError::TypeMismatch {
                value: rendered,
                path: self.key_sequence(key),
                required: kind.type_name(),
            }),
            Err(Coercion::Unsupported) => Err(ConfigError::UnsupportedType {
                path: self.key_sequence(key),
                required: kind.type_name(),
            }),
        }
    }
}

impl<C: Config + ?Sized> ConfigExt for C {}

/// Returns a shared empty root configuration.
#[must_use]
pub fn empty() -> Arc<dyn Config> {
    Arc::new(TreeConfig::empty())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(rulegate::config::io))]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    #[diagnostic(code(rulegate::config::parse))]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A present value could not be read as the requested type.
    #[error("Value \"{value}\" set for config parameter \"{path}\" is not of required type {required}.")]
    #[diagnostic(code(rulegate::config::type_mismatch))]
    TypeMismatch {
        /// The offending raw value.
        value: String,
        /// Full key path, segments joined with `" > "`.
        path: String,
        /// The required type name.
        required: &'static str,
    },

    /// The requested type is not a supported property type.
    #[error("{required} is not supported for config parameter \"{path}\". Use one of String, Int, Boolean or List<String> instead.")]
    #[diagnostic(code(rulegate::config::unsupported_type))]
    UnsupportedType {
        /// Full key path.
        path: String,
        /// The requested type name.
        required: &'static str,
    },

    /// Validation was asked to use an empty baseline.
    #[error("Cannot validate configuration based on an empty baseline config.")]
    #[diagnostic(code(rulegate::config::empty_baseline))]
    EmptyBaseline,

    /// Validation was asked to use a baseline that is not a plain tree.
    #[error("Only a plain tree config is supported as validation baseline.")]
    #[diagnostic(code(rulegate::config::unsupported_baseline))]
    UnsupportedBaseline,

    /// The candidate configuration cannot be validated.
    #[error("Unsupported config type for validation: {description}")]
    #[diagnostic(code(rulegate::config::unsupported_config))]
    UnsupportedConfig {
        /// Debug rendering of the offending node.
        description: String,
    },

    /// A `config.excludes` entry is not a valid regular expression.
    #[error("Invalid config exclude pattern '{pattern}': {reason}")]
    #[diagnostic(
        code(rulegate::config::exclude_pattern),
        help("config.excludes takes a comma-separated list of regular expressions")
    )]
    InvalidExcludePattern {
        /// The offending pattern.
        pattern: String,
        /// Why it failed to compile.
        reason: String,
    },
}
