//! Rule to enforce a naming pattern for functions.
//!
//! # Configuration
//!
//! - `functionPattern`: regular expression a function name must match in
//!   full (default: `[a-z][a-zA-Z0-9]*`).
//! - `ignoreOverridden`: skip functions declared with `override`
//!   (default: `true`). The older `ignoreOverriddenFunctions` key is still
//!   read when `ignoreOverridden` is absent.

use regex::Regex;
use rulegate_core::syntax::{NodeKind, NodeRef};
use rulegate_core::{Check, CheckContext, Config, ConfigExt, ConfigProperty, RuleError};
use std::sync::Arc;

/// Rule id for function-naming.
pub const ID: &str = "FunctionNaming";

const PATTERN_KEY: &str = "functionPattern";

/// The configured pattern as written, and compiled for whole-name matches.
type Pattern = Result<(String, Regex), String>;

/// Reports functions whose name does not match `functionPattern`.
#[derive(Debug)]
pub struct FunctionNaming {
    config: Arc<dyn Config>,
    function_pattern: ConfigProperty<String, Pattern>,
    ignore_overridden: ConfigProperty<bool>,
}

impl FunctionNaming {
    /// Creates the check bound to its own config node.
    #[must_use]
    pub fn new(config: Arc<dyn Config>) -> Self {
        Self {
            function_pattern: ConfigProperty::with_transform(
                Arc::clone(&config),
                PATTERN_KEY,
                "[a-z][a-zA-Z0-9]*".to_string(),
                |raw| {
                    Regex::new(&format!("^(?:{raw})$"))
                        .map(|regex| (raw, regex))
                        .map_err(|e| e.to_string())
                },
            ),
            ignore_overridden: ConfigProperty::new(Arc::clone(&config), "ignoreOverridden", true)
                .with_fallback("ignoreOverriddenFunctions"),
            config,
        }
    }

    fn pattern(&self) -> Result<&(String, Regex), RuleError> {
        self.function_pattern
            .get()?
            .as_ref()
            .map_err(|reason| RuleError::InvalidPattern {
                path: self.config.key_sequence(PATTERN_KEY),
                reason: reason.clone(),
            })
    }
}

pub(crate) fn is_overridden(node: NodeRef<'_>) -> bool {
    node.signature()
        .split_whitespace()
        .take_while(|word| *word != "fun")
        .any(|word| word == "override")
}

impl Check for FunctionNaming {
    fn id(&self) -> &'static str {
        ID
    }

    fn description(&self) -> &'static str {
        "Function names should follow the naming convention set in the configuration."
    }

    fn default_aliases(&self) -> &'static [&'static str] {
        &["FunctionName"]
    }

    fn visit_node(&self, node: NodeRef<'_>, ctx: &mut CheckContext<'_>) -> Result<(), RuleError> {
        if node.kind() != &NodeKind::Function {
            return Ok(());
        }
        let Some(name) = node.name() else {
            return Ok(());
        };
        if *self.ignore_overridden.get()? && is_overridden(node) {
            return Ok(());
        }
        let (source, pattern) = self.pattern()?;
        if !pattern.is_match(name) {
            ctx.report(node, format!("Function names should match the pattern: {source}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegate_core::syntax::{NodeId, NodeSpec, SourceFile, SyntaxTreeBuilder};
    use rulegate_core::{Finding, Rule, RuleSetId, TreeConfig};

    fn file() -> SourceFile {
        let mut builder = SyntaxTreeBuilder::new();
        let class = builder.add(NodeId::ROOT, NodeSpec::new(NodeKind::Class).named("Screen"));
        builder.add(
            class,
            NodeSpec::new(NodeKind::Function)
                .named("Render")
                .signature("fun Render()"),
        );
        builder.add(
            class,
            NodeSpec::new(NodeKind::Function)
                .named("ToString")
                .signature("override fun ToString(): String"),
        );
        builder.add(
            class,
            NodeSpec::new(NodeKind::Function)
                .named("update")
                .signature("fun update()"),
        );
        SourceFile::new("src/Screen.kt", builder.build())
    }

    fn run(config: &str) -> Result<Vec<Finding>, RuleError> {
        let root: Arc<dyn Config> = Arc::new(TreeConfig::parse(config).unwrap());
        let style = root.sub_config("style");
        let check = FunctionNaming::new(style.sub_config(ID));
        Rule::from_config(&RuleSetId::new("style").unwrap(), &*style, Box::new(check))?
            .visit(&file())
    }

    fn names(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.entity.name.as_str()).collect()
    }

    #[test]
    fn reports_names_not_matching_default_pattern() {
        let findings = run("").unwrap();
        assert_eq!(names(&findings), vec!["Render"]);
        assert_eq!(
            findings[0].message,
            "Function names should match the pattern: [a-z][a-zA-Z0-9]*"
        );
        assert_eq!(findings[0].entity.signature, "fun Render()");
    }

    #[test]
    fn overridden_functions_can_be_included() {
        let findings = run("[style.FunctionNaming]\nignoreOverridden = false").unwrap();
        assert_eq!(names(&findings), vec!["Render", "ToString"]);
    }

    #[test]
    fn deprecated_key_is_still_honoured() {
        let findings = run("[style.FunctionNaming]\nignoreOverriddenFunctions = false").unwrap();
        assert_eq!(names(&findings), vec!["Render", "ToString"]);
    }

    #[test]
    fn pattern_matches_whole_name() {
        let findings = run("[style.FunctionNaming]\nfunctionPattern = \"[A-Z][a-z]+\"").unwrap();
        assert_eq!(names(&findings), vec!["update"]);
    }

    #[test]
    fn invalid_pattern_is_reported_with_its_path() {
        let err = run("[style.FunctionNaming]\nfunctionPattern = \"[a-z\"").unwrap_err();
        match err {
            RuleError::InvalidPattern { path, .. } => {
                assert_eq!(path, "style > FunctionNaming > functionPattern");
            }
            other => panic!("expected invalid pattern, got {other:?}"),
        }
    }

    #[test]
    fn overridden_is_read_from_modifiers() {
        let file = file();
        let overridden: Vec<bool> = file
            .tree
            .root()
            .walk()
            .filter(|node| node.kind() == &NodeKind::Function)
            .map(is_overridden)
            .collect();
        assert_eq!(overridden, vec![false, true, false]);
    }
}
