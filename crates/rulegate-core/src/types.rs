//! Core types for findings.

use crate::syntax::{NodeId, NodeRef};
use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Severity level for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, never fails a run.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "unknown severity `{s}`, expected one of info, warning, error"
            )),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path as given to the analyzer.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset in file (for miette integration).
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Sets the byte offset and length for this location.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }
}

/// The source entity a finding is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Short name, e.g. the function name.
    pub name: String,
    /// Longer, more unique description, e.g. the function signature.
    pub signature: String,
    /// Where the entity is.
    pub location: Location,
    /// The reported node, when the entity is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
}

impl Entity {
    /// Creates an entity.
    #[must_use]
    pub fn new(name: impl Into<String>, signature: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            location,
            node: None,
        }
    }

    /// Describes `node` in `file`.
    #[must_use]
    pub fn from_node(file: &Path, node: NodeRef<'_>) -> Self {
        let position = node.position();
        let signature = node.signature();
        Self {
            name: node.name().unwrap_or(signature).to_string(),
            signature: signature.to_string(),
            location: Location::new(file.to_path_buf(), position.line, position.column)
                .with_span(position.start, position.end.saturating_sub(position.start)),
            node: Some(node.id()),
        }
    }
}

/// Estimated time to fix a finding.
///
/// Adding debts normalises minutes into hours and hours into days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Debt {
    /// Whole days.
    pub days: u32,
    /// Hours, below 24 once normalised.
    pub hours: u32,
    /// Minutes, below 60 once normalised.
    pub mins: u32,
}

impl Debt {
    /// Five minutes, the default for most checks.
    pub const FIVE_MINS: Self = Self::new(0, 0, 5);
    /// Twenty minutes.
    pub const TWENTY_MINS: Self = Self::new(0, 0, 20);

    /// Creates a debt, normalising overflowing units.
    #[must_use]
    pub const fn new(days: u32, hours: u32, mins: u32) -> Self {
        let hours = hours + mins / 60;
        Self {
            days: days + hours / 24,
            hours: hours % 24,
            mins: mins % 60,
        }
    }

    /// Total length in minutes.
    #[must_use]
    pub fn as_minutes(self) -> u64 {
        (u64::from(self.days) * 24 + u64::from(self.hours)) * 60 + u64::from(self.mins)
    }
}

impl Add for Debt {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(
            self.days + other.days,
            self.hours + other.hours,
            self.mins + other.mins,
        )
    }
}

impl std::iter::Sum for Debt {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl std::fmt::Display for Debt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.days > 0 {
            parts.push(format!("{}d", self.days));
        }
        if self.hours > 0 {
            parts.push(format!("{}h", self.hours));
        }
        if self.mins > 0 || parts.is_empty() {
            parts.push(format!("{}min", self.mins));
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// A finding produced by a rule.
///
/// Suppression does not remove a finding; it records why the finding is
/// suppressed so downstream filtering can decide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Id of the rule set the rule belongs to.
    pub rule_set_id: String,
    /// Id of the rule that reported this.
    pub rule_id: String,
    /// The entity the finding is about.
    pub entity: Entity,
    /// Human-readable message.
    pub message: String,
    /// Severity of this finding.
    pub severity: Severity,
    /// Estimated time to fix.
    pub debt: Debt,
    /// True if the rule already fixed the code.
    #[serde(default)]
    pub auto_corrected: bool,
    /// Why the finding is suppressed; empty if it is not.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppress_reasons: Vec<String>,
}

impl Finding {
    /// Creates a new, unsuppressed finding.
    #[must_use]
    pub fn new(
        rule_set_id: impl Into<String>,
        rule_id: impl Into<String>,
        entity: Entity,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            rule_set_id: rule_set_id.into(),
            rule_id: rule_id.into(),
            entity,
            message: message.into(),
            severity,
            debt: Debt::FIVE_MINS,
            auto_corrected: false,
            suppress_reasons: Vec::new(),
        }
    }

    /// Sets the debt.
    #[must_use]
    pub fn with_debt(mut self, debt: Debt) -> Self {
        self.debt = debt;
        self
    }

    /// Marks the finding as already fixed.
    #[must_use]
    pub fn with_auto_corrected(mut self, auto_corrected: bool) -> Self {
        self.auto_corrected = auto_corrected;
        self
    }

    /// Records a suppression reason.
    #[must_use]
    pub fn with_suppress_reason(mut self, reason: impl Into<String>) -> Self {
        self.suppress_reasons.push(reason.into());
        self
    }

    /// Returns true if any suppression reason is attached.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        !self.suppress_reasons.is_empty()
    }

    /// The location of the entity.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.entity.location
    }

    /// Formats the finding for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let location = self.location();
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.rule_set_id,
            self.rule_id,
            location.file.display(),
            location.line,
            location.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        let _ = writeln!(output, "  = debt: {}", self.debt);
        for reason in &self.suppress_reasons {
            let _ = writeln!(output, "  = suppressed: {reason}");
        }
        output
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let location = self.location();
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            location.file.display(),
            location.line,
            location.column,
            self.severity,
            self.rule_id,
            self.message
        )
    }
}

/// A finding rendered as a miette diagnostic.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct FindingDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl From<&Finding> for FindingDiagnostic {
    fn from(finding: &Finding) -> Self {
        let location = finding.location();
        Self {
            message: format!("[{}] {}", finding.rule_id, finding.message),
            help: finding.suppress_reasons.first().cloned(),
            span: SourceSpan::from((location.offset, location.length)),
            label_message: finding.entity.signature.clone(),
        }
    }
}
