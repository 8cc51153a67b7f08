//! Rule-set providers for the bundled rules.

use crate::empty_blocks::{EmptyClassBlock, EmptyFunctionBlock, EMPTY_FUNCTION_BLOCK};
use crate::{function_naming, wildcard_import, FunctionNaming, WildcardImport};
use rulegate_core::{Config, MultiRule, Rule, RuleError, RuleSet, RuleSetId, RuleSetProvider};
use std::sync::Arc;
use tracing::debug;

/// Provides the `style` rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleProvider;

impl RuleSetProvider for StyleProvider {
    fn rule_set_id(&self) -> &'static str {
        "style"
    }

    fn instance(&self, config: Arc<dyn Config>) -> Result<RuleSet, RuleError> {
        let id = RuleSetId::new(self.rule_set_id())?;
        debug!("Building rule set: {}", id);
        let wildcard = WildcardImport::new(config.sub_config(wildcard_import::ID));
        let naming = FunctionNaming::new(config.sub_config(function_naming::ID));
        Ok(RuleSet::new(
            id.clone(),
            vec![
                Rule::from_config(&id, &*config, Box::new(wildcard))?.into(),
                Rule::from_config(&id, &*config, Box::new(naming))?.into(),
            ],
        ))
    }
}

/// Provides the `empty-blocks` rule set.
///
/// Its checks share one traversal through a [`MultiRule`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBlocksProvider;

impl RuleSetProvider for EmptyBlocksProvider {
    fn rule_set_id(&self) -> &'static str {
        "empty-blocks"
    }

    fn instance(&self, config: Arc<dyn Config>) -> Result<RuleSet, RuleError> {
        let id = RuleSetId::new(self.rule_set_id())?;
        debug!("Building rule set: {}", id);
        let function_block = EmptyFunctionBlock::new(config.sub_config(EMPTY_FUNCTION_BLOCK));
        let multi = MultiRule::new(vec![
            Rule::from_config(&id, &*config, Box::new(function_block))?,
            Rule::from_config(&id, &*config, Box::new(EmptyClassBlock))?,
        ]);
        Ok(RuleSet::new(id, vec![multi.into()]))
    }
}

/// Returns a provider for every bundled rule set.
#[must_use]
pub fn all_providers() -> Vec<Box<dyn RuleSetProvider>> {
    vec![Box::new(StyleProvider), Box::new(EmptyBlocksProvider)]
}
