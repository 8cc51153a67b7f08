//! # rulegate-core
//!
//! Core engine for configurable static-analysis rules over syntax trees.
//!
//! This crate provides the foundational pieces for building and running
//! rule sets. It includes:
//!
//! - [`Config`] trees with typed lookups, composition and validation
//! - [`Rule`] and [`Check`] for config-driven rules with suppression
//! - [`RuleSet`] and [`MultiRule`] for grouping rules over one traversal
//! - [`Analyzer`] for orchestrating analysis over parsed files
//! - [`AnalysisResult`] with pass/fail [`policy`] decisions
//!
//! ## Example
//!
//! ```ignore
//! use rulegate_core::{Analyzer, TreeConfig};
//! use std::sync::Arc;
//!
//! let analyzer = Analyzer::builder()
//!     .config(Arc::new(TreeConfig::from_file("rulegate.toml".as_ref())?))
//!     .provider(MyRuleSetProvider)
//!     .build()?;
//!
//! let result = analyzer.analyze(&files)?;
//! print!("{}", result.format_report(Severity::Warning));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
pub mod config;
mod context;
mod path_filters;
pub mod policy;
mod result;
mod rule;
mod rule_set;
mod suppression;
pub mod syntax;
mod types;
pub mod value;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{
    AllRulesConfig, CompositeConfig, Config, ConfigError, ConfigExt, ConfigProperty,
    ConfigValidator, DisabledAutoCorrectConfig, Notification, NotificationLevel, TreeConfig,
};
pub use context::CheckContext;
pub use path_filters::{GlobPattern, PathFilterError, PathFilters};
pub use policy::{FailurePolicy, MaxIssuePolicy, PolicyError};
pub use result::AnalysisResult;
pub use rule::{Check, IdError, Rule, RuleError, RuleId, RuleSetId, RuleState, ID_PATTERN};
pub use rule_set::{MultiRule, RuleEntry, RuleSet, RuleSetProvider};
pub use suppression::{AnnotationExcluder, Suppressor, SUPPRESSION_ANNOTATIONS};
pub use types::{Debt, Entity, Finding, FindingDiagnostic, Location, Severity};
pub use value::{Value, ValueKind};
