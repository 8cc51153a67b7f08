//! Pass/fail policies over an analysis result.

use crate::config::{Config, ConfigError, ConfigExt, BUILD_KEY, MAX_ISSUES_KEY};
use crate::result::AnalysisResult;
use crate::types::Severity;
use miette::Diagnostic;
use thiserror::Error;
use tracing::info;

/// A run failed one of its policies.
#[derive(Debug, Error, Diagnostic)]
pub enum PolicyError {
    /// More weighted issues than allowed.
    #[error("Build failed with {count} weighted issues (max allowed: {max}).")]
    #[diagnostic(
        code(rulegate::policy::max_issues),
        help("fix the reported issues or raise build.maxIssues")
    )]
    MaxIssuesReached {
        /// Weighted issue count.
        count: i64,
        /// The configured limit.
        max: i64,
    },

    /// Unsuppressed findings at or above the failure threshold.
    #[error("Analysis failed with {count} issue(s) at or above severity {threshold}.")]
    #[diagnostic(code(rulegate::policy::issues_found))]
    IssuesFound {
        /// Number of failing findings.
        count: usize,
        /// The threshold that was hit.
        threshold: Severity,
    },

    /// The policy could not read its configuration.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Decides failure from finding severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Never fails.
    #[default]
    NeverFail,
    /// Fails on any unsuppressed finding at or above the severity.
    ///
    /// [`Severity::Info`] findings never fail, whatever the threshold.
    FailOnSeverity(Severity),
}

impl FailurePolicy {
    /// Checks `result` against this policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::IssuesFound`] when the policy fails.
    pub fn check(&self, result: &AnalysisResult) -> Result<(), PolicyError> {
        let Self::FailOnSeverity(threshold) = *self else {
            return Ok(());
        };
        let count = result
            .all_findings()
            .filter(|finding| {
                !finding.is_suppressed()
                    && finding.severity != Severity::Info
                    && finding.severity >= threshold
            })
            .count();
        if count == 0 {
            Ok(())
        } else {
            info!("Failure policy hit: {} issue(s) at or above {}", count, threshold);
            Err(PolicyError::IssuesFound { count, threshold })
        }
    }
}

/// Decides failure from the weighted issue count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxIssuePolicy {
    /// Any number of issues passes.
    AllowAny,
    /// A single issue fails.
    NoneAllowed,
    /// Up to the amount passes.
    AllowAmount(i64),
    /// Uses `build > maxIssues` from config, no limit when absent.
    #[default]
    NonSpecified,
}

impl MaxIssuePolicy {
    /// Checks `count` against this policy.
    ///
    /// A negative `count` means the count is unknown and always passes.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::MaxIssuesReached`] when the limit is exceeded,
    /// or a config error if `build > maxIssues` is not an integer.
    pub fn check(&self, count: i64, config: &dyn Config) -> Result<(), PolicyError> {
        if count < 0 {
            return Ok(());
        }
        let max = match *self {
            Self::AllowAny => return Ok(()),
            Self::NoneAllowed => 0,
            Self::AllowAmount(max) => max,
            Self::NonSpecified => match config
                .sub_config(BUILD_KEY)
                .value_or_default(MAX_ISSUES_KEY, -1_i64)?
            {
                max if max < 0 => return Ok(()),
                max => max,
            },
        };
        if count <= max {
            Ok(())
        } else {
            info!("Max issue policy hit: {} > {}", count, max);
            Err(PolicyError::MaxIssuesReached { count, max })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::types::{Entity, Finding, Location};
    use std::path::PathBuf;

    fn result(findings: Vec<Finding>) -> AnalysisResult {
        let mut result = AnalysisResult::new();
        result.add("style", findings);
        result
    }

    fn finding(severity: Severity) -> Finding {
        Finding::new(
            "style",
            "Rule",
            Entity::new("x", "x", Location::new(PathBuf::from("A.kt"), 1, 1)),
            "message",
            severity,
        )
    }

    fn empty() -> TreeConfig {
        TreeConfig::empty()
    }

    #[test]
    fn allow_amount_accepts_up_to_limit() {
        let policy = MaxIssuePolicy::AllowAmount(2);
        assert!(policy.check(2, &empty()).is_ok());
        let err = policy.check(3, &empty()).unwrap_err();
        assert!(matches!(err, PolicyError::MaxIssuesReached { count: 3, max: 2 }));
    }

    #[test]
    fn negative_amount_allows_nothing() {
        let err = MaxIssuePolicy::AllowAmount(-1).check(0, &empty()).unwrap_err();
        assert!(matches!(err, PolicyError::MaxIssuesReached { count: 0, max: -1 }));
    }

    #[test]
    fn unknown_count_always_passes() {
        assert!(MaxIssuePolicy::NoneAllowed.check(-1, &empty()).is_ok());
        assert!(MaxIssuePolicy::AllowAmount(2).check(-5, &empty()).is_ok());
        let config = TreeConfig::parse("[build]\nmaxIssues = 0").unwrap();
        assert!(MaxIssuePolicy::NonSpecified.check(-1, &config).is_ok());
    }

    #[test]
    fn negative_max_issues_in_config_is_unlimited() {
        let config = TreeConfig::parse("[build]\nmaxIssues = -1").unwrap();
        assert!(MaxIssuePolicy::NonSpecified.check(1000, &config).is_ok());
    }

    #[test]
    fn none_allowed_and_allow_any() {
        assert!(MaxIssuePolicy::NoneAllowed.check(0, &empty()).is_ok());
        assert!(MaxIssuePolicy::NoneAllowed.check(1, &empty()).is_err());
        assert!(MaxIssuePolicy::AllowAny.check(i64::MAX, &empty()).is_ok());
    }

    #[test]
    fn non_specified_reads_build_max_issues() {
        let config = TreeConfig::parse("[build]\nmaxIssues = 1").unwrap();
        assert!(MaxIssuePolicy::NonSpecified.check(1, &config).is_ok());
        assert!(MaxIssuePolicy::NonSpecified.check(2, &config).is_err());
        assert!(MaxIssuePolicy::NonSpecified.check(50, &empty()).is_ok());
    }

    #[test]
    fn non_specified_rejects_non_integer() {
        let config = TreeConfig::parse("[build]\nmaxIssues = \"many\"").unwrap();
        let err = MaxIssuePolicy::NonSpecified.check(1, &config).unwrap_err();
        assert!(matches!(err, PolicyError::Config(_)));
    }

    #[test]
    fn fail_on_warning_ignores_info() {
        let policy = FailurePolicy::FailOnSeverity(Severity::Warning);
        assert!(policy.check(&result(vec![finding(Severity::Info)])).is_ok());
        let err = policy
            .check(&result(vec![finding(Severity::Info), finding(Severity::Error)]))
            .unwrap_err();
        assert!(matches!(err, PolicyError::IssuesFound { count: 1, .. }));
    }

    #[test]
    fn info_is_exempt_even_at_info_threshold() {
        let policy = FailurePolicy::FailOnSeverity(Severity::Info);
        assert!(policy.check(&result(vec![finding(Severity::Info)])).is_ok());
    }

    #[test]
    fn suppressed_findings_never_fail() {
        let policy = FailurePolicy::FailOnSeverity(Severity::Warning);
        let suppressed = finding(Severity::Error).with_suppress_reason("Suppressed by @Suppress(\"all\")");
        assert!(policy.check(&result(vec![suppressed])).is_ok());
    }

    #[test]
    fn never_fail_passes() {
        assert!(FailurePolicy::NeverFail
            .check(&result(vec![finding(Severity::Error)]))
            .is_ok());
    }

    #[test]
    fn messages() {
        let err = MaxIssuePolicy::AllowAmount(0).check(4, &empty()).unwrap_err();
        assert_eq!(err.to_string(), "Build failed with 4 weighted issues (max allowed: 0).");
    }
}
