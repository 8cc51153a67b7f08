//! Rule to forbid wildcard imports.
//!
//! # Rationale
//!
//! Star imports hide where a name comes from and can silently pick up new
//! declarations when the imported package grows.
//!
//! # Detected Patterns
//!
//! - `import java.io.*`
//! - `import kotlinx.coroutines.*`
//!
//! # Configuration
//!
//! - `excludeImports`: wildcard imports that are allowed (default:
//!   `java.util.*`).

use rulegate_core::syntax::SourceFile;
use rulegate_core::{Check, CheckContext, Config, ConfigProperty, Entity, Location, RuleError};
use std::sync::Arc;
use tracing::trace;

/// Rule id for wildcard-import.
pub const ID: &str = "WildcardImport";

/// Reports star imports not listed in `excludeImports`.
#[derive(Debug)]
pub struct WildcardImport {
    exclude_imports: ConfigProperty<Vec<String>>,
}

impl WildcardImport {
    /// Creates the check bound to its own config node.
    #[must_use]
    pub fn new(config: Arc<dyn Config>) -> Self {
        Self {
            exclude_imports: ConfigProperty::new(
                config,
                "excludeImports",
                vec!["java.util.*".to_string()],
            ),
        }
    }
}

impl Check for WildcardImport {
    fn id(&self) -> &'static str {
        ID
    }

    fn description(&self) -> &'static str {
        "Wildcard imports should be replaced with imports using fully qualified class names."
    }

    fn visit_file(&self, file: &SourceFile, ctx: &mut CheckContext<'_>) -> Result<(), RuleError> {
        let excludes = self.exclude_imports.get()?;
        for import in file.imports.iter().filter(|import| import.is_wildcard()) {
            if excludes.iter().any(|allowed| allowed == &import.path) {
                trace!("Allowed wildcard import: {}", import.path);
                continue;
            }
            let location = Location::new(file.path.clone(), import.line.unwrap_or(1), 1);
            ctx.report_entity(
                Entity::new(&import.path, format!("import {}", import.path), location),
                format!(
                    "{} is a wildcard import. Replace it with fully qualified imports.",
                    import.path
                ),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegate_core::syntax::{Import, SyntaxTreeBuilder};
    use rulegate_core::{Rule, RuleSetId, TreeConfig};

    fn run(config: &str, file: &SourceFile) -> Vec<rulegate_core::Finding> {
        let root: Arc<dyn Config> = Arc::new(TreeConfig::parse(config).unwrap());
        let style = root.sub_config("style");
        let check = WildcardImport::new(style.sub_config(ID));
        Rule::from_config(&RuleSetId::new("style").unwrap(), &*style, Box::new(check))
            .unwrap()
            .visit(file)
            .unwrap()
    }

    fn file() -> SourceFile {
        SourceFile::new("src/Main.kt", SyntaxTreeBuilder::new().build())
            .with_import(Import::new("java.util.*").at_line(3))
            .with_import(Import::new("java.io.*").at_line(4))
            .with_import(Import::new("kotlin.collections.List").at_line(5))
    }

    #[test]
    fn reports_wildcards_except_default_excludes() {
        let findings = run("", &file());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].entity.name, "java.io.*");
        assert_eq!(findings[0].entity.location.line, 4);
        assert_eq!(
            findings[0].message,
            "java.io.* is a wildcard import. Replace it with fully qualified imports."
        );
    }

    #[test]
    fn exclude_imports_accepts_comma_separated_string() {
        let findings = run(
            "[style.WildcardImport]\nexcludeImports = \"java.util.*, java.io.*\"",
            &file(),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn wrong_type_is_an_error() {
        let root: Arc<dyn Config> =
            Arc::new(TreeConfig::parse("[style.WildcardImport]\nexcludeImports = 3").unwrap());
        let style = root.sub_config("style");
        let rule = Rule::from_config(
            &RuleSetId::new("style").unwrap(),
            &*style,
            Box::new(WildcardImport::new(style.sub_config(ID))),
        )
        .unwrap();
        assert!(matches!(rule.visit(&file()), Err(RuleError::Config(_))));
    }
}
