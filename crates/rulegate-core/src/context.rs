//! Context handed to checks while they visit a file.

use crate::rule::Rule;
use crate::syntax::{NodeRef, SourceFile};
use crate::types::{Entity, Finding};

/// Collects findings for one rule over one file.
///
/// Every finding is stamped with the rule's identity, severity and debt, and
/// with the suppression reason of the reported node, if any. Suppressed
/// findings are kept.
#[derive(Debug)]
pub struct CheckContext<'a> {
    file: &'a SourceFile,
    rule: &'a Rule,
    findings: Vec<Finding>,
}

impl<'a> CheckContext<'a> {
    pub(crate) fn new(file: &'a SourceFile, rule: &'a Rule) -> Self {
        Self {
            file,
            rule,
            findings: Vec::new(),
        }
    }

    /// The file being visited.
    #[must_use]
    pub fn file(&self) -> &'a SourceFile {
        self.file
    }

    /// Whether the rule may fix what it finds.
    #[must_use]
    pub fn auto_correct(&self) -> bool {
        self.rule.auto_correct()
    }

    /// Reports a finding on `node`.
    pub fn report(&mut self, node: NodeRef<'_>, message: impl Into<String>) {
        self.push(node, message.into(), false);
    }

    /// Reports a finding the rule can fix.
    ///
    /// When auto-correct is on for this rule, the finding is recorded as
    /// already corrected.
    pub fn report_correctable(&mut self, node: NodeRef<'_>, message: impl Into<String>) {
        let corrected = self.rule.auto_correct();
        self.push(node, message.into(), corrected);
    }

    /// Reports a finding on something that is not a tree node, such as an
    /// import. Suppressions are looked up on the file root.
    pub fn report_entity(&mut self, entity: Entity, message: impl Into<String>) {
        let reason = self.rule.suppressor().is_suppressed_by(self.file.tree.root());
        let finding = self.finding(entity, message.into(), false);
        self.findings.push(match reason {
            Some(reason) => finding.with_suppress_reason(reason),
            None => finding,
        });
    }

    /// Findings reported so far.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub(crate) fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    fn push(&mut self, node: NodeRef<'_>, message: String, corrected: bool) {
        let entity = Entity::from_node(&self.file.path, node);
        let finding = self.finding(entity, message, corrected);
        self.findings
            .push(match self.rule.suppressor().is_suppressed_by(node) {
                Some(reason) => finding.with_suppress_reason(reason),
                None => finding,
            });
    }

    fn finding(&self, entity: Entity, message: String, corrected: bool) -> Finding {
        Finding::new(
            self.rule.rule_set_id().as_str(),
            self.rule.id().as_str(),
            entity,
            message,
            self.rule.severity(),
        )
        .with_debt(self.rule.debt())
        .with_auto_corrected(corrected)
    }
}
