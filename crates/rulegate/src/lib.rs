//! # rulegate
//!
//! Configurable, suppressible, policy-gated rule engine for static analysis.
//!
//! This is the main facade crate that re-exports the core engine and the
//! bundled rules, and provides [`run`] for a complete analysis: user config
//! layered over the bundled baseline, validated, analysed, then gated by the
//! failure and max-issue policies.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rulegate::{run, FailurePolicy, RunSettings, Severity};
//!
//! let settings = RunSettings {
//!     config_path: Some("rulegate.toml".into()),
//!     failure_policy: FailurePolicy::FailOnSeverity(Severity::Error),
//!     ..RunSettings::default()
//! };
//! let outcome = run(&settings, &files)?;
//! ```
//!
//! ## Suppression
//!
//! Annotate any declaration to silence rules for it and everything inside:
//!
//! ```kotlin
//! @Suppress("detekt:WildcardImport", "empty-blocks")
//! class Legacy { }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

// Re-export core types and traits
pub use rulegate_core::*;

/// Built-in rule sets and the bundled baseline configuration.
pub mod rules {
    pub use rulegate_rules::*;
}

mod runner;

pub use runner::{run, RunError, RunOutcome, RunSettings};
