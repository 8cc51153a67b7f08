//! Aggregated analysis output.

use crate::config::{Config, ConfigError, ConfigExt, Notification, BUILD_KEY, EXCLUDE_CORRECTABLE_KEY};
use crate::types::{Debt, Finding, Severity};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;

/// Findings grouped by rule set, plus run metadata.
#[derive(Debug, Default)]
pub struct AnalysisResult {
    findings: BTreeMap<String, Vec<Finding>>,
    notifications: Vec<Notification>,
    files_analyzed: usize,
    weighted_count: OnceCell<usize>,
}

impl AnalysisResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends findings for a rule set, keeping their order.
    pub fn add(&mut self, rule_set_id: impl Into<String>, findings: Vec<Finding>) {
        self.findings
            .entry(rule_set_id.into())
            .or_default()
            .extend(findings);
        self.weighted_count = OnceCell::new();
    }

    /// Records config validation notifications.
    pub fn add_notifications(&mut self, notifications: impl IntoIterator<Item = Notification>) {
        self.notifications.extend(notifications);
    }

    /// Counts an analysed file.
    pub fn record_file(&mut self) {
        self.files_analyzed += 1;
    }

    /// Findings per rule-set id.
    #[must_use]
    pub fn findings(&self) -> &BTreeMap<String, Vec<Finding>> {
        &self.findings
    }

    /// All findings, rule set by rule set.
    pub fn all_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.values().flatten()
    }

    /// Config validation notifications.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Number of analysed files.
    #[must_use]
    pub fn files_analyzed(&self) -> usize {
        self.files_analyzed
    }

    /// Drops auto-corrected findings unless `build > excludeCorrectable` is
    /// `true`, in which case everything is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if `excludeCorrectable` is not a boolean.
    pub fn filter_auto_corrected(mut self, config: &dyn Config) -> Result<Self, ConfigError> {
        let keep_all = config
            .sub_config(BUILD_KEY)
            .value_or_default(EXCLUDE_CORRECTABLE_KEY, false)?;
        if !keep_all {
            for findings in self.findings.values_mut() {
                findings.retain(|finding| !finding.auto_corrected);
            }
            self.weighted_count = OnceCell::new();
        }
        Ok(self)
    }

    /// Number of findings that are not suppressed.
    ///
    /// Computed on first call and cached until the result changes.
    #[must_use]
    pub fn weighted_issue_count(&self) -> usize {
        *self.weighted_count.get_or_init(|| {
            self.all_findings()
                .filter(|finding| !finding.is_suppressed())
                .count()
        })
    }

    /// Sum of the debt of all unsuppressed findings.
    #[must_use]
    pub fn total_debt(&self) -> Debt {
        self.all_findings()
            .filter(|finding| !finding.is_suppressed())
            .map(|finding| finding.debt)
            .sum()
    }

    /// Counts unsuppressed findings by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |severity: Severity| {
            self.all_findings()
                .filter(|finding| !finding.is_suppressed() && finding.severity == severity)
                .count()
        };
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Adds everything from another result.
    pub fn merge(&mut self, other: Self) {
        for (rule_set_id, findings) in other.findings {
            self.add(rule_set_id, findings);
        }
        self.notifications.extend(other.notifications);
        self.files_analyzed += other.files_analyzed;
        self.weighted_count = OnceCell::new();
    }

    /// Formats unsuppressed findings at or above `threshold` as a report.
    #[must_use]
    pub fn format_report(&self, threshold: Severity) -> String {
        use std::fmt::Write;

        let failing: Vec<&Finding> = self
            .all_findings()
            .filter(|finding| !finding.is_suppressed() && finding.severity >= threshold)
            .collect();

        let mut report = String::new();
        let _ = writeln!(report, "\n=== rulegate: {} finding(s) ===\n", failing.len());
        for finding in &failing {
            let _ = writeln!(report, "{}", finding.format());
        }

        let (errors, warnings, infos) = self.count_by_severity();
        let _ = writeln!(
            report,
            "Total: {} error(s), {} warning(s), {} info(s) in {} file(s), debt {}",
            errors,
            warnings,
            infos,
            self.files_analyzed,
            self.total_debt()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::types::{Entity, Location};
    use std::path::PathBuf;

    fn finding(rule: &str, severity: Severity) -> Finding {
        Finding::new(
            "style",
            rule,
            Entity::new("x", "val x = 1", Location::new(PathBuf::from("A.kt"), 1, 1)),
            "message",
            severity,
        )
    }

    fn sample() -> AnalysisResult {
        let mut result = AnalysisResult::new();
        result.add(
            "style",
            vec![
                finding("A", Severity::Error),
                finding("B", Severity::Warning).with_auto_corrected(true),
                finding("C", Severity::Warning).with_suppress_reason("Suppressed by @Suppress(\"C\")"),
            ],
        );
        result.add("empty-blocks", vec![finding("D", Severity::Info)]);
        result
    }

    fn config(content: &str) -> TreeConfig {
        TreeConfig::parse(content).unwrap()
    }

    #[test]
    fn auto_corrected_are_dropped_by_default() {
        let result = sample().filter_auto_corrected(&config("")).unwrap();
        assert!(result.all_findings().all(|f| !f.auto_corrected));
        assert_eq!(result.all_findings().count(), 3);
    }

    #[test]
    fn exclude_correctable_false_drops_auto_corrected() {
        let result = sample()
            .filter_auto_corrected(&config("[build]\nexcludeCorrectable = false"))
            .unwrap();
        assert_eq!(result.all_findings().count(), 3);
    }

    #[test]
    fn exclude_correctable_true_keeps_everything() {
        let result = sample()
            .filter_auto_corrected(&config("[build]\nexcludeCorrectable = true"))
            .unwrap();
        assert_eq!(result.all_findings().count(), 4);
    }

    #[test]
    fn exclude_correctable_must_be_boolean() {
        let err = sample()
            .filter_auto_corrected(&config("[build]\nexcludeCorrectable = \"maybe\""))
            .unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    }

    #[test]
    fn weighted_count_skips_suppressed_and_is_cached() {
        let result = sample();
        assert!(result.weighted_count.get().is_none());
        assert_eq!(result.weighted_issue_count(), 3);
        assert_eq!(result.weighted_count.get(), Some(&3));
        assert_eq!(result.weighted_issue_count(), 3);
    }

    #[test]
    fn weighted_count_follows_changes() {
        let mut result = sample();
        assert_eq!(result.weighted_issue_count(), 3);
        result.add("style", vec![finding("E", Severity::Error)]);
        assert!(result.weighted_count.get().is_none());
        assert_eq!(result.weighted_issue_count(), 4);
    }

    #[test]
    fn counts_and_debt_ignore_suppressed() {
        let result = sample();
        assert_eq!(result.count_by_severity(), (1, 1, 1));
        assert_eq!(result.total_debt(), Debt::new(0, 0, 15));
    }

    #[test]
    fn merge_keeps_rule_set_order() {
        let mut left = AnalysisResult::new();
        left.record_file();
        left.add("style", vec![finding("A", Severity::Error)]);
        let mut right = AnalysisResult::new();
        right.record_file();
        right.add("style", vec![finding("B", Severity::Error)]);

        left.merge(right);
        let ids: Vec<&str> = left.findings()["style"]
            .iter()
            .map(|f| f.rule_id.as_str())
            .collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(left.files_analyzed(), 2);
    }

    #[test]
    fn report_lists_failing_findings() {
        let report = sample().format_report(Severity::Warning);
        assert!(report.contains("2 finding(s)"));
        assert!(report.contains("Total: 1 error(s), 1 warning(s), 1 info(s) in 0 file(s), debt 15min"));
    }
}
