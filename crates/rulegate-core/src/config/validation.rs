//! Validation of a configuration against a baseline schema.
//!
//! The baseline is the bundled default configuration: every key a user may
//! set appears there with a representative value. Validation walks the
//! candidate key by key and reports what the baseline does not know about
//! or expects in a different shape.

use super::{
    Config, ConfigError, ConfigExt, ValidationView, CONFIG_KEY, EXCLUDES_KEY, VALIDATION_KEY,
    WARNINGS_AS_ERRORS_KEY,
};
use crate::value::Value;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Paths that are never reported, in `a>b>c` form.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    ".*>excludes",
    ".*>includes",
    ".*>active",
    ".*>.*>excludes",
    ".*>.*>includes",
    ".*>.*>active",
    ".*>.*>autoCorrect",
    ".*>severity",
    ".*>.*>severity",
    "build>weights.*",
    ".*>.*>ignoreAnnotated",
    ".*>.*>aliases",
];

/// Severity of a validation notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Must be fixed; fails validation.
    Error,
    /// Reported but tolerated.
    Warning,
}

/// A discrepancy between a candidate configuration and the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// The candidate sets a key the baseline does not have.
    PropertyDoesNotExist {
        /// Path of the key.
        path: String,
    },
    /// The baseline expects a nested map, the candidate has a scalar.
    NestedConfigurationExpected {
        /// Path of the key.
        path: String,
    },
    /// The baseline expects a scalar, the candidate has a nested map.
    UnexpectedNestedConfiguration {
        /// Path of the key.
        path: String,
    },
    /// The key is known but deprecated.
    PropertyIsDeprecated {
        /// Path of the key.
        path: String,
        /// What to use instead.
        hint: String,
    },
    /// The baseline holds a list, the candidate a comma-separated string.
    PropertyShouldBeAnArray {
        /// Path of the key.
        path: String,
    },
}

impl NotificationKind {
    /// The path the notification is about.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::PropertyDoesNotExist { path }
            | Self::NestedConfigurationExpected { path }
            | Self::UnexpectedNestedConfiguration { path }
            | Self::PropertyIsDeprecated { path, .. }
            | Self::PropertyShouldBeAnArray { path } => path,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PropertyDoesNotExist { path } => {
                write!(f, "Property '{path}' is misspelled or does not exist.")
            }
            Self::NestedConfigurationExpected { path } => {
                write!(f, "Nested config expected for '{path}'.")
            }
            Self::UnexpectedNestedConfiguration { path } => {
                write!(f, "Unexpected nested config for '{path}'.")
            }
            Self::PropertyIsDeprecated { path, hint } => {
                write!(f, "Property '{path}' is deprecated. {hint}.")
            }
            Self::PropertyShouldBeAnArray { path } => write!(
                f,
                "Property '{path}' should be a list instead of a comma-separated String."
            ),
        }
    }
}

/// A single validation finding, returned as data rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// What is wrong.
    pub kind: NotificationKind,
    /// How serious it is.
    pub level: NotificationLevel,
}

impl Notification {
    /// Returns true for error-level notifications.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Validates candidate configurations against a baseline tree.
#[derive(Debug)]
pub struct ConfigValidator {
    baseline: Arc<dyn Config>,
    excludes: Vec<Regex>,
    deprecations: HashMap<String, String>,
}

impl ConfigValidator {
    /// Creates a validator for `baseline` with the default exclude patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyBaseline`] or
    /// [`ConfigError::UnsupportedBaseline`] when `baseline` is not a
    /// non-empty plain tree.
    pub fn new(baseline: Arc<dyn Config>) -> Result<Self, ConfigError> {
        if baseline.is_empty() {
            return Err(ConfigError::EmptyBaseline);
        }
        if !matches!(baseline.validation_view(), ValidationView::Tree(_)) {
            return Err(ConfigError::UnsupportedBaseline);
        }
        Ok(Self {
            baseline,
            excludes: compile_patterns(DEFAULT_EXCLUDE_PATTERNS.iter().copied())?,
            deprecations: HashMap::new(),
        })
    }

    /// Adds exclude patterns on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid regular expression.
    pub fn with_excludes<I, S>(mut self, patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extra = compile_patterns(patterns)?;
        self.excludes.extend(extra);
        Ok(self)
    }

    /// Registers deprecated property paths (`a>b>c`) with a replacement hint.
    #[must_use]
    pub fn with_deprecations<I, K, V>(mut self, deprecations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.deprecations.extend(
            deprecations
                .into_iter()
                .map(|(path, hint)| (path.into(), hint.into())),
        );
        self
    }

    /// Validates `candidate`, returning one notification per discrepancy.
    ///
    /// The candidate's own `config` section controls the run:
    /// `validation = false` skips it, `warningsAsErrors` promotes warnings,
    /// and `excludes` adds exclude patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if the candidate cannot be validated (unsupported
    /// node type) or its `config` section is malformed.
    pub fn validate(&self, candidate: &dyn Config) -> Result<Vec<Notification>, ConfigError> {
        let settings = candidate.sub_config(CONFIG_KEY);
        if !settings.value_or_default(VALIDATION_KEY, true)? {
            debug!("Config validation disabled");
            return Ok(Vec::new());
        }

        let warnings_as_errors = settings.value_or_default(WARNINGS_AS_ERRORS_KEY, false)?;
        let user_excludes: Vec<String> = settings.value_or_default(EXCLUDES_KEY, Vec::new())?;
        let mut excludes = self.excludes.clone();
        excludes.extend(compile_patterns(&user_excludes)?);

        let ValidationView::Tree(baseline) = self.baseline.validation_view() else {
            return Err(ConfigError::UnsupportedBaseline);
        };

        let run = Run {
            baseline,
            excludes: &excludes,
            deprecations: &self.deprecations,
            warnings_as_errors,
        };
        let mut notifications = Vec::new();
        run.validate(candidate, &mut notifications)?;
        debug!("Config validation produced {} notification(s)", notifications.len());
        Ok(notifications)
    }
}

struct Run<'a> {
    baseline: &'a BTreeMap<String, Value>,
    excludes: &'a [Regex],
    deprecations: &'a HashMap<String, String>,
    warnings_as_errors: bool,
}

impl Run<'_> {
    fn validate(
        &self,
        candidate: &dyn Config,
        out: &mut Vec<Notification>,
    ) -> Result<(), ConfigError> {
        if candidate.is_empty() {
            return Ok(());
        }
        match candidate.validation_view() {
            ValidationView::Tree(properties) => {
                self.test_keys(properties, self.baseline, None, out);
                Ok(())
            }
            ValidationView::Composite(primary, secondary) => {
                self.validate(primary, out)?;
                self.validate(secondary, out)
            }
            ValidationView::Delegate(inner) => self.validate(inner, out),
            ValidationView::Unsupported => Err(ConfigError::UnsupportedConfig {
                description: format!("{candidate:?}"),
            }),
        }
    }

    fn test_keys(
        &self,
        current: &BTreeMap<String, Value>,
        base: &BTreeMap<String, Value>,
        parent_path: Option<&str>,
        out: &mut Vec<Notification>,
    ) {
        for (prop, value) in current {
            let path = match parent_path {
                Some(parent) => format!("{parent}>{prop}"),
                None => prop.clone(),
            };
            if self.is_excluded(&path) {
                continue;
            }
            if let Some(hint) = self.deprecations.get(&path) {
                out.push(self.soft(NotificationKind::PropertyIsDeprecated {
                    path,
                    hint: hint.clone(),
                }));
                continue;
            }
            let Some(base_value) = base.get(prop) else {
                out.push(hard(NotificationKind::PropertyDoesNotExist { path }));
                continue;
            };
            match (value, base_value) {
                (Value::Map(next), Value::Map(next_base)) => {
                    self.test_keys(next, next_base, Some(&path), out);
                }
                (_, Value::Map(_)) => {
                    out.push(hard(NotificationKind::NestedConfigurationExpected { path }));
                }
                (Value::Map(_), _) => {
                    out.push(hard(NotificationKind::UnexpectedNestedConfiguration { path }));
                }
                (Value::String(_), Value::List(_)) => {
                    out.push(self.soft(NotificationKind::PropertyShouldBeAnArray { path }));
                }
                _ => {}
            }
        }
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excludes.iter().any(|pattern| pattern.is_match(path))
    }

    fn soft(&self, kind: NotificationKind) -> Notification {
        let level = if self.warnings_as_errors {
            NotificationLevel::Error
        } else {
            NotificationLevel::Warning
        };
        Notification { kind, level }
    }
}

fn hard(kind: NotificationKind) -> Notification {
    Notification {
        kind,
        level: NotificationLevel::Error,
    }
}

/// Compiles patterns anchored at both ends, so they must match a whole path.
fn compile_patterns<I, S>(patterns: I) -> Result<Vec<Regex>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(&format!("^(?:{pattern})$")).map_err(|e| ConfigError::InvalidExcludePattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}
