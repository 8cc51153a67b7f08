//! Rules reporting empty blocks of code.
//!
//! Both checks look for a declaration whose body is a [`NodeKind::Block`]
//! without children. They are grouped in one multi rule so a file is walked
//! once for the whole rule set.

use crate::function_naming::is_overridden;
use rulegate_core::syntax::{NodeKind, NodeRef};
use rulegate_core::{Check, CheckContext, Config, ConfigProperty, Debt, RuleError};
use std::sync::Arc;

/// Rule id for empty-function-block.
pub const EMPTY_FUNCTION_BLOCK: &str = "EmptyFunctionBlock";

/// Rule id for empty-class-block.
pub const EMPTY_CLASS_BLOCK: &str = "EmptyClassBlock";

const MESSAGE: &str = "This empty block of code can be removed.";

fn empty_body(node: NodeRef<'_>) -> Option<NodeRef<'_>> {
    node.child_of_kind(&NodeKind::Block)
        .filter(|body| body.is_leaf())
}

/// Reports functions with an empty body.
#[derive(Debug)]
pub struct EmptyFunctionBlock {
    ignore_overridden: ConfigProperty<bool>,
}

impl EmptyFunctionBlock {
    /// Creates the check bound to its own config node.
    #[must_use]
    pub fn new(config: Arc<dyn Config>) -> Self {
        Self {
            ignore_overridden: ConfigProperty::new(config, "ignoreOverridden", false)
                .with_fallback("ignoreOverriddenFunctions"),
        }
    }
}

impl Check for EmptyFunctionBlock {
    fn id(&self) -> &'static str {
        EMPTY_FUNCTION_BLOCK
    }

    fn description(&self) -> &'static str {
        "Empty function blocks serve no purpose and should be removed."
    }

    fn visit_node(&self, node: NodeRef<'_>, ctx: &mut CheckContext<'_>) -> Result<(), RuleError> {
        if node.kind() != &NodeKind::Function {
            return Ok(());
        }
        if *self.ignore_overridden.get()? && is_overridden(node) {
            return Ok(());
        }
        if let Some(body) = empty_body(node) {
            ctx.report(body, MESSAGE);
        }
        Ok(())
    }
}

/// Reports classes and objects with an empty body. The braces can be
/// dropped, so findings are correctable.
#[derive(Debug, Default)]
pub struct EmptyClassBlock;

impl Check for EmptyClassBlock {
    fn id(&self) -> &'static str {
        EMPTY_CLASS_BLOCK
    }

    fn description(&self) -> &'static str {
        "Empty class blocks serve no purpose and should be removed."
    }

    fn debt(&self) -> Debt {
        Debt::new(0, 0, 1)
    }

    fn visit_node(&self, node: NodeRef<'_>, ctx: &mut CheckContext<'_>) -> Result<(), RuleError> {
        if !matches!(node.kind(), NodeKind::Class | NodeKind::Object) {
            return Ok(());
        }
        if let Some(body) = empty_body(node) {
            ctx.report_correctable(body, MESSAGE);
        }
        Ok(())
    }
}
