//! Rule sets and shared-traversal multi rules.

use crate::config::{Config, ConfigExt, ACTIVE_KEY};
use crate::context::CheckContext;
use crate::rule::{Rule, RuleError, RuleSetId};
use crate::suppression::AnnotationExcluder;
use crate::syntax::{NodeId, SourceFile};
use crate::types::Finding;
use std::sync::Arc;
use tracing::debug;

/// Several rules sharing one traversal.
///
/// At every node the active sub-rules run in declaration order. Findings are
/// the same as running each sub-rule on its own and concatenating.
#[derive(Debug)]
pub struct MultiRule {
    rules: Vec<Rule>,
}

impl MultiRule {
    /// Groups `rules`.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The sub-rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runs the sub-rules that should run for `file` in a single pass.
    ///
    /// # Errors
    ///
    /// Returns the first error a sub-rule's check reports.
    pub fn visit(&self, file: &SourceFile) -> Result<Vec<Finding>, RuleError> {
        let runnable: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|rule| rule.should_run(&file.path))
            .collect();
        if runnable.is_empty() {
            return Ok(Vec::new());
        }
        traverse(file, &runnable)
    }
}

/// One entry of a rule set.
#[derive(Debug)]
pub enum RuleEntry {
    /// A rule with its own traversal.
    Single(Rule),
    /// Rules sharing a traversal.
    Multi(MultiRule),
}

impl From<Rule> for RuleEntry {
    fn from(rule: Rule) -> Self {
        Self::Single(rule)
    }
}

impl From<MultiRule> for RuleEntry {
    fn from(multi: MultiRule) -> Self {
        Self::Multi(multi)
    }
}

/// A named group of rules run together.
#[derive(Debug)]
pub struct RuleSet {
    id: RuleSetId,
    entries: Vec<RuleEntry>,
}

impl RuleSet {
    /// Creates a rule set.
    #[must_use]
    pub fn new(id: RuleSetId, entries: Vec<RuleEntry>) -> Self {
        Self { id, entries }
    }

    /// The rule set id.
    #[must_use]
    pub fn id(&self) -> &RuleSetId {
        &self.id
    }

    /// The entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// All rules, flattening multi rules.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.entries.iter().flat_map(|entry| match entry {
            RuleEntry::Single(rule) => std::slice::from_ref(rule),
            RuleEntry::Multi(multi) => multi.rules(),
        })
    }

    /// Runs every applicable rule over `file`.
    ///
    /// Suppressed findings are returned with their reasons attached.
    ///
    /// # Errors
    ///
    /// Returns the first error a check reports.
    pub fn accept(&self, file: &SourceFile) -> Result<Vec<Finding>, RuleError> {
        let mut findings = Vec::new();
        for entry in &self.entries {
            match entry {
                RuleEntry::Single(rule) => {
                    if rule.should_run(&file.path) {
                        findings.extend(rule.visit(file)?);
                    }
                }
                RuleEntry::Multi(multi) => findings.extend(multi.visit(file)?),
            }
        }
        debug!(
            "Rule set {} reported {} finding(s) for {}",
            self.id,
            findings.len(),
            file.path.display()
        );
        Ok(findings)
    }
}

/// Builds a rule set from its config node.
///
/// Implemented once per rule set by rule crates.
pub trait RuleSetProvider: Send + Sync {
    /// Id of the rule set this provider builds.
    fn rule_set_id(&self) -> &'static str;

    /// Builds the rule set from its own config node.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule cannot be built from config.
    fn instance(&self, config: Arc<dyn Config>) -> Result<RuleSet, RuleError>;

    /// Builds the rule set from the root config, or `None` if the rule set
    /// is switched off with `active = false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is malformed or a rule cannot be built.
    fn build(&self, root: &dyn Config) -> Result<Option<RuleSet>, RuleError> {
        let id = RuleSetId::new(self.rule_set_id())?;
        let config = root.sub_config(id.as_str());
        if !config.value_or_default(ACTIVE_KEY, true)? {
            debug!("Skipping inactive rule set: {}", id);
            return Ok(None);
        }
        self.instance(config).map(Some)
    }
}

/// Walks `file` once, feeding every node to each rule in order.
///
/// A node carrying one of a rule's `ignoreAnnotated` annotations is skipped
/// by that rule together with its subtree. Findings are grouped per rule in
/// the order of `rules`.
pub(crate) fn traverse(file: &SourceFile, rules: &[&Rule]) -> Result<Vec<Finding>, RuleError> {
    let excluders: Vec<AnnotationExcluder<'_>> = rules
        .iter()
        .map(|rule| AnnotationExcluder::new(file, rule.ignore_annotated()))
        .collect();
    let mut contexts: Vec<CheckContext<'_>> = rules
        .iter()
        .map(|rule| CheckContext::new(file, rule))
        .collect();

    for (rule, ctx) in rules.iter().zip(contexts.iter_mut()) {
        rule.check().visit_file(file, ctx)?;
    }

    let mut stack: Vec<(NodeId, Vec<bool>)> = vec![(NodeId::ROOT, vec![false; rules.len()])];
    while let Some((id, inherited)) = stack.pop() {
        let Some(node) = file.tree.node(id) else {
            continue;
        };
        let skipped: Vec<bool> = inherited
            .iter()
            .zip(&excluders)
            .map(|(&skipped, excluder)| skipped || excluder.should_exclude(node.annotations()))
            .collect();

        for ((rule, ctx), &skip) in rules.iter().zip(contexts.iter_mut()).zip(&skipped) {
            if !skip {
                rule.check().visit_node(node, ctx)?;
            }
        }

        if skipped.iter().all(|&skip| skip) {
            continue;
        }
        for child in node.children().rev() {
            stack.push((child.id(), skipped.clone()));
        }
    }

    Ok(contexts
        .into_iter()
        .flat_map(CheckContext::into_findings)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::rule::Check;
    use crate::syntax::{Annotation, BindingContext, Import, NodeKind, NodeRef, NodeSpec, SyntaxTreeBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports every node of one kind.
    struct KindCheck {
        id: &'static str,
        kind: NodeKind,
        visits: Arc<AtomicUsize>,
    }

    impl KindCheck {
        fn new(id: &'static str, kind: NodeKind) -> Self {
            Self {
                id,
                kind,
                visits: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Check for KindCheck {
        fn id(&self) -> &'static str {
            self.id
        }
        fn visit_node(&self, node: NodeRef<'_>, ctx: &mut CheckContext<'_>) -> Result<(), RuleError> {
            self.visits.fetch_add(1, Ordering::SeqCst);
            if node.kind() == &self.kind {
                ctx.report(node, format!("{} found", node.signature()));
            }
            Ok(())
        }
    }

    fn config(content: &str) -> Arc<dyn Config> {
        Arc::new(TreeConfig::parse(content).unwrap())
    }

    fn rule(config: &dyn Config, check: KindCheck) -> Rule {
        Rule::from_config(&RuleSetId::new("test").unwrap(), config, Box::new(check)).unwrap()
    }

    fn sample(path: &str) -> SourceFile {
        let mut builder = SyntaxTreeBuilder::new();
        let class = builder.add(
            NodeId::ROOT,
            NodeSpec::new(NodeKind::Class)
                .named("Screen")
                .annotated(Annotation::new("Preview", Vec::<String>::new())),
        );
        builder.add(class, NodeSpec::new(NodeKind::Function).named("render"));
        let other = builder.add(NodeId::ROOT, NodeSpec::new(NodeKind::Class).named("Model"));
        builder.add(
            other,
            NodeSpec::new(NodeKind::Function)
                .named("load")
                .annotated(Annotation::new("Suppress", ["\"Functions\""])),
        );
        SourceFile::new(path, builder.build())
            .with_import(Import::new("androidx.compose.ui.tooling.preview.Preview"))
            .with_bindings(BindingContext::new())
    }

    fn names(findings: &[Finding]) -> Vec<String> {
        findings
            .iter()
            .map(|f| format!("{}:{}", f.rule_id, f.entity.name))
            .collect()
    }

    #[test]
    fn multi_rule_equals_independent_runs_concatenated() {
        let config = config("");
        let multi = MultiRule::new(vec![
            rule(&*config, KindCheck::new("Functions", NodeKind::Function)),
            rule(&*config, KindCheck::new("Classes", NodeKind::Class)),
        ]);
        let file = sample("src/A.kt");

        let shared = multi.visit(&file).unwrap();
        let mut independent = Vec::new();
        for rule in multi.rules() {
            independent.extend(rule.visit(&file).unwrap());
        }
        assert_eq!(shared, independent);
        assert_eq!(
            names(&shared),
            vec![
                "Functions:render",
                "Functions:load",
                "Classes:Screen",
                "Classes:Model"
            ]
        );
    }

    #[test]
    fn multi_rule_skips_inactive_sub_rules() {
        let config = config("[Classes]\nactive = false");
        let classes = KindCheck::new("Classes", NodeKind::Class);
        let visits = Arc::clone(&classes.visits);
        let multi = MultiRule::new(vec![
            rule(&*config, KindCheck::new("Functions", NodeKind::Function)),
            rule(&*config, classes),
        ]);
        let findings = multi.visit(&sample("src/A.kt")).unwrap();
        assert_eq!(names(&findings), vec!["Functions:render", "Functions:load"]);
        assert_eq!(visits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn suppressed_findings_are_kept_with_reason() {
        let config = config("");
        let set = RuleSet::new(
            RuleSetId::new("test").unwrap(),
            vec![rule(&*config, KindCheck::new("Functions", NodeKind::Function)).into()],
        );
        let findings = set.accept(&sample("src/A.kt")).unwrap();
        assert_eq!(findings.len(), 2);
        assert!(!findings[0].is_suppressed());
        assert_eq!(
            findings[1].suppress_reasons,
            vec!["Suppressed by @Suppress(\"Functions\")".to_string()]
        );
    }

    #[test]
    fn ignore_annotated_skips_subtree_for_that_rule_only() {
        let config = config("[Functions]\nignoreAnnotated = [\"Preview\"]");
        let set = RuleSet::new(
            RuleSetId::new("test").unwrap(),
            vec![MultiRule::new(vec![
                rule(&*config, KindCheck::new("Functions", NodeKind::Function)),
                rule(&*config, KindCheck::new("Classes", NodeKind::Class)),
            ])
            .into()],
        );
        let findings = set.accept(&sample("src/A.kt")).unwrap();
        assert_eq!(
            names(&findings),
            vec!["Functions:load", "Classes:Screen", "Classes:Model"]
        );
    }

    #[test]
    fn path_filtered_rule_does_not_run() {
        let config = config("[Functions]\nexcludes = [\"**/test/**\"]");
        let set = RuleSet::new(
            RuleSetId::new("test").unwrap(),
            vec![
                rule(&*config, KindCheck::new("Functions", NodeKind::Function)).into(),
                rule(&*config, KindCheck::new("Classes", NodeKind::Class)).into(),
            ],
        );
        let findings = set.accept(&sample("src/test/ATest.kt")).unwrap();
        assert_eq!(names(&findings), vec!["Classes:Screen", "Classes:Model"]);
        assert_eq!(set.rules().count(), 2);
    }

    struct Provider;

    impl RuleSetProvider for Provider {
        fn rule_set_id(&self) -> &'static str {
            "test"
        }
        fn instance(&self, config: Arc<dyn Config>) -> Result<RuleSet, RuleError> {
            Ok(RuleSet::new(
                RuleSetId::new(self.rule_set_id())?,
                vec![Rule::from_config(
                    &RuleSetId::new(self.rule_set_id())?,
                    &*config,
                    Box::new(KindCheck::new("Functions", NodeKind::Function)),
                )?
                .into()],
            ))
        }
    }

    #[test]
    fn provider_skips_inactive_rule_set() {
        assert!(Provider.build(&*config("[test]\nactive = false")).unwrap().is_none());
        let set = Provider.build(&*config("")).unwrap().unwrap();
        assert_eq!(set.id().as_str(), "test");
    }
}
