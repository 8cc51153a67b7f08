//! Rules: a check plus everything configuration decides about it.

use crate::config::{
    Config, ConfigError, ConfigExt, ACTIVE_KEY, ALIASES_KEY, AUTO_CORRECT_KEY, EXCLUDES_KEY,
    IGNORE_ANNOTATED_KEY, INCLUDES_KEY, SEVERITY_KEY,
};
use crate::context::CheckContext;
use crate::path_filters::{PathFilterError, PathFilters};
use crate::suppression::Suppressor;
use crate::syntax::{NodeRef, SourceFile};
use crate::types::{Debt, Finding, Severity};
use miette::Diagnostic;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Shape every rule and rule-set id must have.
pub const ID_PATTERN: &str =
    "[a-zA-Z][a-zA-Z0-9]*(-[a-zA-Z0-9]+)*(/[a-zA-Z][a-zA-Z0-9]*(-[a-zA-Z0-9]+)*)?";

#[allow(clippy::expect_used)]
static ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^(?:{ID_PATTERN})$")).expect("ID_PATTERN is a valid regex"));

fn is_valid_id(value: &str) -> bool {
    ID_REGEX.is_match(value)
}

macro_rules! validated_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Validates and wraps an id.
            ///
            /// # Errors
            ///
            /// Returns [`IdError`] if `value` does not match [`ID_PATTERN`].
            pub fn new(value: &str) -> Result<Self, IdError> {
                if is_valid_id(value) {
                    Ok(Self(value.to_string()))
                } else {
                    Err(IdError::Invalid {
                        value: value.to_string(),
                    })
                }
            }

            /// Returns the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

validated_id!(
    /// Id of a rule, e.g. `WildcardImport`.
    RuleId
);

validated_id!(
    /// Id of a rule set, e.g. `style`.
    RuleSetId
);

/// An id failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum IdError {
    /// The id does not match [`ID_PATTERN`].
    #[error("Id '{value}' must match {pattern}", pattern = ID_PATTERN)]
    #[diagnostic(code(rulegate::rule::invalid_id))]
    Invalid {
        /// The rejected value.
        value: String,
    },
}

/// Errors building or running rules.
#[derive(Debug, Error, Diagnostic)]
pub enum RuleError {
    /// A rule or rule-set id is malformed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Id(#[from] IdError),

    /// A configuration value could not be read.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// An include or exclude pattern does not compile.
    #[error("Invalid path filter for rule '{rule}': {source}")]
    #[diagnostic(code(rulegate::rule::path_filter))]
    PathFilter {
        /// Rule the pattern belongs to.
        rule: String,
        /// Why it failed.
        #[source]
        source: PathFilterError,
    },

    /// A `severity` override is not a known severity.
    #[error("Invalid severity for config parameter \"{path}\": {reason}")]
    #[diagnostic(code(rulegate::rule::severity))]
    InvalidSeverity {
        /// Full key path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A pattern tunable is not a valid regular expression.
    #[error("Invalid regular expression for config parameter \"{path}\": {reason}")]
    #[diagnostic(code(rulegate::rule::pattern))]
    InvalidPattern {
        /// Full key path.
        path: String,
        /// Why it failed to compile.
        reason: String,
    },
}

/// A single check: the analysis logic behind a rule.
///
/// Checks are constructed by a [`RuleSetProvider`](crate::RuleSetProvider)
/// with their own config node and read tunables through
/// [`ConfigProperty`](crate::ConfigProperty). Everything generic (activation,
/// path filters, suppression, severity overrides) is handled by [`Rule`].
///
/// # Example
///
/// ```ignore
/// struct EmptyFunctionBlock;
///
/// impl Check for EmptyFunctionBlock {
///     fn id(&self) -> &'static str { "EmptyFunctionBlock" }
///
///     fn visit_node(&self, node: NodeRef<'_>, ctx: &mut CheckContext<'_>) -> Result<(), RuleError> {
///         if node.kind() == &NodeKind::Function && has_empty_body(node) {
///             ctx.report(node, "This empty block of code can be removed.");
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Check: Send + Sync {
    /// The rule id, used as config key and in suppressions.
    fn id(&self) -> &'static str;

    /// A brief description of what this check finds.
    fn description(&self) -> &'static str {
        ""
    }

    /// Severity when config does not override it.
    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    /// Whether the rule runs when config does not say.
    fn default_active(&self) -> bool {
        true
    }

    /// Additional ids accepted in suppressions when config sets none.
    fn default_aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Estimated time to fix one finding.
    fn debt(&self) -> Debt {
        Debt::FIVE_MINS
    }

    /// Called once per file before any node is visited.
    ///
    /// # Errors
    ///
    /// Returns an error if the check cannot read its configuration.
    fn visit_file(&self, _file: &SourceFile, _ctx: &mut CheckContext<'_>) -> Result<(), RuleError> {
        Ok(())
    }

    /// Called for every node in pre-order.
    ///
    /// # Errors
    ///
    /// Returns an error if the check cannot read its configuration.
    fn visit_node(&self, _node: NodeRef<'_>, _ctx: &mut CheckContext<'_>) -> Result<(), RuleError> {
        Ok(())
    }
}

/// Whether a rule takes part in analysis. Decided once from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    /// The rule runs.
    Active,
    /// The rule never runs.
    Inactive,
}

/// A check bound to its resolved configuration.
pub struct Rule {
    id: RuleId,
    rule_set_id: RuleSetId,
    aliases: Vec<String>,
    state: RuleState,
    auto_correct: bool,
    filters: PathFilters,
    severity: Severity,
    ignore_annotated: Vec<String>,
    suppressor: Suppressor,
    check: Box<dyn Check>,
}

impl Rule {
    /// Resolves `check` against its node in `rule_set_config`.
    ///
    /// Reads `active`, `autoCorrect`, `aliases`, `includes`, `excludes`,
    /// `severity` and `ignoreAnnotated`. Includes and excludes fall back to
    /// the rule set's own when the rule sets none.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is malformed or a value has the wrong type.
    pub fn from_config(
        rule_set_id: &RuleSetId,
        rule_set_config: &dyn Config,
        check: Box<dyn Check>,
    ) -> Result<Self, RuleError> {
        let id = RuleId::new(check.id())?;
        let config = rule_set_config.sub_config(id.as_str());

        let active = config.value_or_default(ACTIVE_KEY, check.default_active())?;
        let auto_correct = config.value_or_default(AUTO_CORRECT_KEY, false)?;
        let aliases = match config.value_or_none::<Vec<String>>(ALIASES_KEY)? {
            Some(aliases) => aliases,
            None => check
                .default_aliases()
                .iter()
                .map(ToString::to_string)
                .collect(),
        };

        let includes = scoped_list(&*config, rule_set_config, INCLUDES_KEY)?;
        let excludes = scoped_list(&*config, rule_set_config, EXCLUDES_KEY)?;
        let filters =
            PathFilters::new(&includes, &excludes).map_err(|source| RuleError::PathFilter {
                rule: id.to_string(),
                source,
            })?;

        let severity = match config.value_or_none::<String>(SEVERITY_KEY)? {
            Some(raw) => raw
                .parse()
                .map_err(|reason| RuleError::InvalidSeverity {
                    path: config.key_sequence(SEVERITY_KEY),
                    reason,
                })?,
            None => check.default_severity(),
        };
        let ignore_annotated = config.value_or_default(IGNORE_ANNOTATED_KEY, Vec::new())?;

        let state = if active {
            RuleState::Active
        } else {
            RuleState::Inactive
        };
        debug!(
            "Rule {}:{} resolved as {:?} ({})",
            rule_set_id,
            id,
            state,
            check.description()
        );

        Ok(Self {
            suppressor: Suppressor::new(id.as_str(), aliases.clone(), rule_set_id.as_str()),
            id,
            rule_set_id: rule_set_id.clone(),
            aliases,
            state,
            auto_correct,
            filters,
            severity,
            ignore_annotated,
            check,
        })
    }

    /// The rule id.
    #[must_use]
    pub fn id(&self) -> &RuleId {
        &self.id
    }

    /// The owning rule set's id.
    #[must_use]
    pub fn rule_set_id(&self) -> &RuleSetId {
        &self.rule_set_id
    }

    /// Ids also accepted in suppressions.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Activation state.
    #[must_use]
    pub fn state(&self) -> RuleState {
        self.state
    }

    /// Returns true if the rule is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == RuleState::Active
    }

    /// Whether the rule may fix what it finds.
    #[must_use]
    pub fn auto_correct(&self) -> bool {
        self.auto_correct
    }

    /// Severity of this rule's findings.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Estimated time to fix one finding.
    #[must_use]
    pub fn debt(&self) -> Debt {
        self.check.debt()
    }

    /// Annotations that exclude a declaration from this rule.
    #[must_use]
    pub fn ignore_annotated(&self) -> &[String] {
        &self.ignore_annotated
    }

    /// Include/exclude filters.
    #[must_use]
    pub fn filters(&self) -> &PathFilters {
        &self.filters
    }

    /// Suppression matcher for this rule's identity.
    #[must_use]
    pub fn suppressor(&self) -> &Suppressor {
        &self.suppressor
    }

    /// The underlying check.
    #[must_use]
    pub fn check(&self) -> &dyn Check {
        &*self.check
    }

    /// Returns true if the rule is active and `path` passes its filters.
    #[must_use]
    pub fn should_run(&self, path: &Path) -> bool {
        if !self.is_active() {
            debug!("Skipping inactive rule: {}", self.id);
            return false;
        }
        if self.filters.is_ignored(path) {
            debug!("Skipping {} for filtered path {}", self.id, path.display());
            return false;
        }
        true
    }

    /// Runs this rule alone over `file`, ignoring activation and filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the check fails.
    pub fn visit(&self, file: &SourceFile) -> Result<Vec<Finding>, RuleError> {
        crate::rule_set::traverse(file, &[self])
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("rule_set_id", &self.rule_set_id)
            .field("state", &self.state)
            .field("auto_correct", &self.auto_correct)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

fn scoped_list(
    rule_config: &dyn Config,
    rule_set_config: &dyn Config,
    key: &str,
) -> Result<Vec<String>, ConfigError> {
    match rule_config.value_or_none::<Vec<String>>(key)? {
        Some(values) => Ok(values),
        None => rule_set_config.value_or_default(key, Vec::new()),
    }
}
