//! Annotation-driven suppression and exclusion.
//!
//! [`Suppressor`] decides whether a finding is silenced by a `@Suppress`
//! annotation on the reported node or any enclosing declaration.
//! [`AnnotationExcluder`] decides whether a declaration is skipped by a rule
//! entirely because it carries one of the rule's `ignoreAnnotated`
//! annotations.
//!
//! Neither can fail. Missing information (no bindings, no annotations)
//! means "not suppressed" and "not excluded".

use crate::syntax::{short_name, Annotation, BindingContext, Import, NodeRef, SourceFile};
use once_cell::sync::Lazy;
use regex::Regex;

/// Annotation names that carry suppressions.
pub const SUPPRESSION_ANNOTATIONS: &[&str] = &["Suppress", "SuppressWarnings"];

/// Optional `detekt` namespace in front of a suppressed id, matched
/// case-insensitively and followed by `:` or `.`.
#[allow(clippy::expect_used)]
static NAMESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^detekt[:.]").expect("namespace pattern is a valid regex"));

/// Matches suppression annotations against one rule's identity.
#[derive(Debug, Clone)]
pub struct Suppressor {
    rule_id: String,
    aliases: Vec<String>,
    rule_set_id: String,
}

impl Suppressor {
    /// Creates a suppressor for a rule.
    #[must_use]
    pub fn new(
        rule_id: impl Into<String>,
        aliases: impl IntoIterator<Item = impl Into<String>>,
        rule_set_id: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
            rule_set_id: rule_set_id.into(),
        }
    }

    /// Returns the suppression reason if `node` or any ancestor suppresses
    /// this rule.
    ///
    /// The nearest suppressing annotation wins:
    /// `Suppressed by @Suppress("detekt:MagicNumber")`.
    #[must_use]
    pub fn is_suppressed_by(&self, node: NodeRef<'_>) -> Option<String> {
        node.self_and_ancestors()
            .find_map(|current| self.reason_in(current.annotations()))
    }

    fn reason_in(&self, annotations: &[Annotation]) -> Option<String> {
        annotations
            .iter()
            .filter(|annotation| SUPPRESSION_ANNOTATIONS.contains(&annotation.short_name()))
            .find_map(|annotation| {
                annotation
                    .arguments
                    .iter()
                    .find(|argument| self.matches(argument))
                    .map(|argument| {
                        format!(
                            "Suppressed by @{}(\"{}\")",
                            annotation.short_name(),
                            unquote(argument)
                        )
                    })
            })
    }

    fn matches(&self, argument: &str) -> bool {
        let id = strip_namespace(unquote(argument));
        id.eq_ignore_ascii_case("all")
            || id == self.rule_id
            || self.aliases.iter().any(|alias| alias == id)
            || id == self.rule_set_id
            || id
                .strip_prefix(self.rule_set_id.as_str())
                .and_then(|rest| rest.strip_prefix(['.', ':']))
                .is_some_and(|rest| rest == self.rule_id)
    }
}

fn unquote(argument: &str) -> &str {
    argument.trim().trim_matches('"')
}

fn strip_namespace(id: &str) -> &str {
    NAMESPACE
        .find(id)
        .map_or(id, |namespace| &id[namespace.end()..])
}

/// Skips declarations annotated with one of a rule's excluded annotations.
///
/// An annotation only counts when its identity is known: it must be written
/// fully qualified, imported by name, or resolved by the binding context.
/// Without a binding context nothing is excluded.
#[derive(Debug)]
pub struct AnnotationExcluder<'a> {
    excludes: &'a [String],
    imports: &'a [Import],
    bindings: Option<&'a BindingContext>,
}

impl<'a> AnnotationExcluder<'a> {
    /// Creates an excluder for `file` with annotation names from `excludes`.
    #[must_use]
    pub fn new(file: &'a SourceFile, excludes: &'a [String]) -> Self {
        Self {
            excludes,
            imports: &file.imports,
            bindings: file.bindings.as_ref(),
        }
    }

    /// Returns true if any of `annotations` is excluded.
    #[must_use]
    pub fn should_exclude(&self, annotations: &[Annotation]) -> bool {
        let Some(bindings) = self.bindings else {
            return false;
        };
        if self.excludes.is_empty() {
            return false;
        }
        annotations.iter().any(|annotation| {
            self.qualified_name(annotation, bindings)
                .is_some_and(|qualified| self.is_excluded(annotation, qualified))
        })
    }

    /// Fully qualified name of `annotation`, if its identity is known.
    fn qualified_name<'n>(
        &'n self,
        annotation: &'n Annotation,
        bindings: &'n BindingContext,
    ) -> Option<&'n str> {
        if annotation.is_qualified() {
            return Some(&annotation.name);
        }
        self.imports
            .iter()
            .find(|import| !import.is_wildcard() && import.short_name() == annotation.name)
            .map(|import| import.path.as_str())
            .or_else(|| bindings.resolve(&annotation.name))
    }

    fn is_excluded(&self, annotation: &Annotation, qualified: &str) -> bool {
        let names = [
            annotation.name.as_str(),
            annotation.short_name(),
            qualified,
            short_name(qualified),
        ];
        self.excludes
            .iter()
            .any(|exclude| names.contains(&exclude.as_str()))
    }
}
