//! Bundled baseline configuration and deprecated properties.

use rulegate_core::{ConfigError, TreeConfig};

/// The bundled baseline configuration as TOML text.
pub const DEFAULT_CONFIG: &str = include_str!("../default-config.toml");

/// Deprecated property paths (`a>b>c`) with a migration hint.
pub const DEPRECATIONS: &[(&str, &str)] = &[
    (
        "style>FunctionNaming>ignoreOverriddenFunctions",
        "Use `ignoreOverridden` instead",
    ),
    (
        "empty-blocks>EmptyFunctionBlock>ignoreOverriddenFunctions",
        "Use `ignoreOverridden` instead",
    ),
];

/// Parses the bundled baseline configuration.
///
/// # Errors
///
/// Returns an error if the bundled TOML does not parse.
pub fn default_config() -> Result<TreeConfig, ConfigError> {
    TreeConfig::parse(DEFAULT_CONFIG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegate_core::{Config, ConfigExt, ConfigValidator};
    use std::sync::Arc;

    #[test]
    fn bundled_config_parses() {
        let config = default_config().unwrap();
        let style = config.sub_config("style");
        assert!(style.value_or_default("active", false).unwrap());
        assert_eq!(
            config
                .sub_config("build")
                .value_or_default("maxIssues", -1_i64)
                .unwrap(),
            0
        );
    }

    #[test]
    fn bundled_config_validates_against_itself() {
        let baseline: Arc<dyn Config> = Arc::new(default_config().unwrap());
        let validator = ConfigValidator::new(Arc::clone(&baseline)).unwrap();
        assert!(validator.validate(&*baseline).unwrap().is_empty());
    }

    #[test]
    fn deprecated_keys_are_warnings() {
        let baseline: Arc<dyn Config> = Arc::new(default_config().unwrap());
        let validator = ConfigValidator::new(baseline)
            .unwrap()
            .with_deprecations(DEPRECATIONS.iter().copied());
        let user = TreeConfig::parse("[style.FunctionNaming]\nignoreOverriddenFunctions = false")
            .unwrap();

        let notifications = validator.validate(&user).unwrap();
        insta::assert_snapshot!(notifications[0].to_string(), @"Property 'style>FunctionNaming>ignoreOverriddenFunctions' is deprecated. Use `ignoreOverridden` instead.");
        assert!(!notifications[0].is_error());
    }
}
