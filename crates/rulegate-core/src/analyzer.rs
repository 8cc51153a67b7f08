//! Core analyzer for orchestrating rule execution.

use crate::config::{
    AllRulesConfig, Config, ConfigError, ConfigValidator, DisabledAutoCorrectConfig, Notification,
};
use crate::result::AnalysisResult;
use crate::rule::RuleError;
use crate::rule_set::{RuleSet, RuleSetProvider};
use crate::syntax::SourceFile;
use crate::types::Finding;

use miette::Diagnostic;
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during analysis.
#[derive(Debug, Error, Diagnostic)]
pub enum AnalyzerError {
    /// Configuration error.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// The configuration failed validation.
    #[error("Run failed with {count} invalid config {}.", property_noun(.count))]
    #[diagnostic(code(rulegate::analyzer::invalid_config), help("{details}"))]
    InvalidConfig {
        /// Number of error-level notifications.
        count: usize,
        /// The notification messages, one per line.
        details: String,
        /// Every notification, warnings included.
        notifications: Vec<Notification>,
    },

    /// A rule could not be built or failed while running.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Rule(#[from] RuleError),
}

fn property_noun(count: &usize) -> &'static str {
    if *count == 1 {
        "property"
    } else {
        "properties"
    }
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    config: Option<Arc<dyn Config>>,
    default_config: Option<Arc<dyn Config>>,
    providers: Vec<Box<dyn RuleSetProvider>>,
    auto_correct: bool,
    all_rules: bool,
    deprecations: Vec<(String, String)>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the effective configuration.
    #[must_use]
    pub fn config(mut self, config: Arc<dyn Config>) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the baseline configuration used for validation and by
    /// [`all_rules`](Self::all_rules).
    #[must_use]
    pub fn default_config(mut self, config: Arc<dyn Config>) -> Self {
        self.default_config = Some(config);
        self
    }

    /// Adds a rule-set provider.
    #[must_use]
    pub fn provider<P: RuleSetProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Adds boxed rule-set providers.
    #[must_use]
    pub fn providers<I>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn RuleSetProvider>>,
    {
        self.providers.extend(providers);
        self
    }

    /// Allows rules to auto-correct (default: false).
    #[must_use]
    pub fn auto_correct(mut self, enabled: bool) -> Self {
        self.auto_correct = enabled;
        self
    }

    /// Activates every rule not explicitly switched off (default: false).
    #[must_use]
    pub fn all_rules(mut self, enabled: bool) -> Self {
        self.all_rules = enabled;
        self
    }

    /// Registers deprecated property paths (`a>b>c`) with a hint.
    #[must_use]
    pub fn deprecations<I, K, V>(mut self, deprecations: I) -> Self
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

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the baseline cannot be used for validation.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let mut config = self.config.unwrap_or_else(crate::config::empty);
        if self.all_rules {
            let default = self
                .default_config
                .clone()
                .unwrap_or_else(crate::config::empty);
            config = Arc::new(AllRulesConfig::new(config, default));
        }
        if !self.auto_correct {
            config = Arc::new(DisabledAutoCorrectConfig::new(config));
        }

        let validator = match self.default_config {
            Some(baseline) => {
                Some(ConfigValidator::new(baseline)?.with_deprecations(self.deprecations))
            }
            None => None,
        };

        Ok(Analyzer {
            config,
            validator,
            providers: self.providers,
        })
    }
}

/// The main analyzer that orchestrates rule execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    config: Arc<dyn Config>,
    validator: Option<ConfigValidator>,
    providers: Vec<Box<dyn RuleSetProvider>>,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// The effective configuration, wrappers applied.
    #[must_use]
    pub fn config(&self) -> &Arc<dyn Config> {
        &self.config
    }

    /// Returns the number of registered rule-set providers.
    #[must_use]
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Validates the effective configuration against the baseline.
    ///
    /// Returns all notifications when none is an error.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::InvalidConfig`] when any notification is an
    /// error.
    pub fn validate(&self) -> Result<Vec<Notification>, AnalyzerError> {
        let Some(validator) = &self.validator else {
            return Ok(Vec::new());
        };
        let notifications = validator.validate(&*self.config)?;
        for notification in notifications.iter().filter(|n| !n.is_error()) {
            warn!("{}", notification);
        }
        let errors: Vec<String> = notifications
            .iter()
            .filter(|n| n.is_error())
            .map(Notification::message)
            .collect();
        if errors.is_empty() {
            Ok(notifications)
        } else {
            Err(AnalyzerError::InvalidConfig {
                count: errors.len(),
                details: errors.join("\n"),
                notifications,
            })
        }
    }

    /// Instantiates every active rule set once.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule cannot be built from config.
    pub fn rule_sets(&self) -> Result<Vec<RuleSet>, AnalyzerError> {
        let mut rule_sets = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            if let Some(rule_set) = provider.build(&*self.config)? {
                debug!(
                    "Instantiated rule set {} with {} rule(s)",
                    rule_set.id(),
                    rule_set.rules().count()
                );
                rule_sets.push(rule_set);
            }
        }
        Ok(rule_sets)
    }

    /// Validates config, then analyses `files` with every active rule set.
    ///
    /// Files are analysed in parallel; findings are merged in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a rule fails.
    pub fn analyze(&self, files: &[SourceFile]) -> Result<AnalysisResult, AnalyzerError> {
        info!("Starting analysis of {} file(s)", files.len());

        let notifications = self.validate()?;
        let rule_sets = self.rule_sets()?;
        info!("Running {} rule set(s)", rule_sets.len());

        let per_file: Vec<Vec<(String, Vec<Finding>)>> = files
            .par_iter()
            .map(|file| analyze_file(&rule_sets, file))
            .collect::<Result<_, RuleError>>()?;

        let mut result = AnalysisResult::new();
        result.add_notifications(notifications);
        for file_findings in per_file {
            result.record_file();
            for (rule_set_id, findings) in file_findings {
                result.add(rule_set_id, findings);
            }
        }

        info!(
            "Analysis complete: {} finding(s) in {} file(s)",
            result.all_findings().count(),
            result.files_analyzed()
        );
        Ok(result)
    }
}

fn analyze_file(
    rule_sets: &[RuleSet],
    file: &SourceFile,
) -> Result<Vec<(String, Vec<Finding>)>, RuleError> {
    debug!("Analyzing: {}", file.path.display());
    rule_sets
        .iter()
        .map(|rule_set| Ok((rule_set.id().to_string(), rule_set.accept(file)?)))
        .collect()
}
