//! End-to-end runner: config layering, validation, analysis and policies.

use miette::Diagnostic;
use rulegate_core::syntax::SourceFile;
use rulegate_core::{
    AnalysisResult, Analyzer, AnalyzerError, CompositeConfig, Config, ConfigError, FailurePolicy,
    FindingDiagnostic, MaxIssuePolicy, Notification, PolicyError, Severity, TreeConfig,
};
use rulegate_rules::{all_providers, default_config, DEPRECATIONS};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that end a run.
#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    /// A configuration layer could not be loaded or read.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// Validation, rule construction or analysis failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Analyzer(#[from] AnalyzerError),

    /// The run completed but a policy failed it.
    #[error("{source}")]
    #[diagnostic(code(rulegate::run::policy), help("{report}"))]
    Policy {
        /// The policy that failed.
        #[source]
        source: PolicyError,
        /// Report of the findings that were counted.
        report: String,
        /// The counted findings, one diagnostic each.
        #[related]
        findings: Vec<FindingDiagnostic>,
    },
}

/// Inputs of a single run.
#[derive(Debug, Clone, Default)]
pub struct RunSettings {
    /// User config file, layered over the bundled baseline.
    pub config_path: Option<PathBuf>,
    /// Inline user config, layered over `config_path`.
    pub config_text: Option<String>,
    /// Lets rules with `autoCorrect = true` correct what they find.
    pub auto_correct: bool,
    /// Activates every rule not explicitly switched off.
    pub all_rules: bool,
    /// Severity-based failure decision.
    pub failure_policy: FailurePolicy,
    /// Weighted-count-based failure decision.
    pub max_issue_policy: MaxIssuePolicy,
}

/// A run that passed every policy.
#[derive(Debug)]
pub struct RunOutcome {
    /// Findings after auto-corrected ones were filtered.
    pub result: AnalysisResult,
    /// Number of unsuppressed findings.
    pub weighted_issues: usize,
}

impl RunOutcome {
    /// Config validation warnings raised during the run.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        self.result.notifications()
    }
}

/// Analyses `files` with the bundled rule sets.
///
/// Layering, lowest first: bundled baseline, `config_path`, `config_text`.
///
/// # Errors
///
/// Returns [`RunError::Config`] or [`RunError::Analyzer`] when the run cannot
/// complete, and [`RunError::Policy`] when a policy fails it.
pub fn run(settings: &RunSettings, files: &[SourceFile]) -> Result<RunOutcome, RunError> {
    let baseline: Arc<dyn Config> = Arc::new(default_config()?);
    let config = layer_config(settings, Arc::clone(&baseline))?;

    let analyzer = Analyzer::builder()
        .config(Arc::clone(&config))
        .default_config(baseline)
        .providers(all_providers())
        .auto_correct(settings.auto_correct)
        .all_rules(settings.all_rules)
        .deprecations(DEPRECATIONS.iter().copied())
        .build()?;

    let result = analyzer.analyze(files)?.filter_auto_corrected(&*config)?;

    settings
        .failure_policy
        .check(&result)
        .map_err(|source| policy_error(source, &result, settings.failure_policy))?;

    let weighted_issues = result.weighted_issue_count();
    settings
        .max_issue_policy
        .check(i64::try_from(weighted_issues).unwrap_or(i64::MAX), &*config)
        .map_err(|source| policy_error(source, &result, settings.failure_policy))?;

    info!(
        "Run passed: {} weighted issue(s) in {} file(s)",
        weighted_issues,
        result.files_analyzed()
    );
    Ok(RunOutcome {
        result,
        weighted_issues,
    })
}

fn layer_config(
    settings: &RunSettings,
    baseline: Arc<dyn Config>,
) -> Result<Arc<dyn Config>, ConfigError> {
    let mut config = baseline;
    if let Some(path) = &settings.config_path {
        debug!("Loading config: {}", path.display());
        let user: Arc<dyn Config> = Arc::new(TreeConfig::from_file(path)?);
        config = Arc::new(CompositeConfig::new(user, config));
    }
    if let Some(text) = &settings.config_text {
        let user: Arc<dyn Config> = Arc::new(TreeConfig::parse(text)?);
        config = Arc::new(CompositeConfig::new(user, config));
    }
    Ok(config)
}

fn policy_error(source: PolicyError, result: &AnalysisResult, policy: FailurePolicy) -> RunError {
    let threshold = match policy {
        FailurePolicy::FailOnSeverity(threshold) => threshold,
        FailurePolicy::NeverFail => Severity::Info,
    };
    RunError::Policy {
        source,
        report: result.format_report(threshold),
        findings: result
            .all_findings()
            .filter(|finding| !finding.is_suppressed() && finding.severity >= threshold)
            .map(FindingDiagnostic::from)
            .collect(),
    }
}
