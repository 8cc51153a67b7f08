//! # rulegate-rules
//!
//! Built-in rule sets and the bundled baseline configuration for rulegate.
//!
//! The baseline (`default-config.toml`) lists every property a user config
//! may set and is the tree user configs are validated against.
//!
//! ## Available Rules
//!
//! | Rule set | Rule | Description |
//! |----------|------|-------------|
//! | `style` | `WildcardImport` | Forbids star imports outside `excludeImports` |
//! | `style` | `FunctionNaming` | Function names must match `functionPattern` |
//! | `empty-blocks` | `EmptyFunctionBlock` | Reports functions with an empty body |
//! | `empty-blocks` | `EmptyClassBlock` | Reports classes and objects with an empty body |
//!
//! ## Usage
//!
//! ```ignore
//! use rulegate_core::Analyzer;
//! use rulegate_rules::{all_providers, default_config, DEPRECATIONS};
//! use std::sync::Arc;
//!
//! let analyzer = Analyzer::builder()
//!     .config(user_config)
//!     .default_config(Arc::new(default_config()?))
//!     .providers(all_providers())
//!     .deprecations(DEPRECATIONS.iter().copied())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod defaults;
pub mod empty_blocks;
pub mod function_naming;
mod providers;
pub mod wildcard_import;

pub use defaults::{default_config, DEFAULT_CONFIG, DEPRECATIONS};
pub use empty_blocks::{EmptyClassBlock, EmptyFunctionBlock};
pub use function_naming::FunctionNaming;
pub use providers::{all_providers, EmptyBlocksProvider, StyleProvider};
pub use wildcard_import::WildcardImport;
