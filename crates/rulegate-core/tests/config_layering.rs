//! Integration tests for layered configuration and validation.

use rulegate_core::{
    CompositeConfig, Config, ConfigError, ConfigExt, ConfigValidator, DisabledAutoCorrectConfig,
    TreeConfig,
};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture(name: &str) -> Arc<dyn Config> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    Arc::new(TreeConfig::from_file(&path).expect("fixture should parse"))
}

#[test]
fn later_layer_wins_per_key() {
    let config = CompositeConfig::new(fixture("second.toml"), fixture("first.toml"));
    let rule = config.sub_config("style").sub_config("WildcardImport");

    assert!(!rule.value_or_default("active", true).unwrap());
    let excludes: Vec<String> = rule.value_or_default("excludeImports", Vec::new()).unwrap();
    assert_eq!(excludes, vec!["java.io.*", "kotlinx.coroutines.*"]);
}

#[test]
fn three_layers_fall_back_to_baseline() {
    let user = Arc::new(CompositeConfig::new(
        fixture("second.toml"),
        fixture("first.toml"),
    ));
    let config = CompositeConfig::new(user, fixture("baseline.toml"));
    let style = config.sub_config("style");

    assert_eq!(
        style
            .sub_config("MaxLineLength")
            .value_or_default("maxLineLength", 0_i64)
            .unwrap(),
        100
    );
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
fn disabled_auto_correct_survives_composition() {
    let config = DisabledAutoCorrectConfig::new(Arc::new(CompositeConfig::new(
        fixture("first.toml"),
        fixture("baseline.toml"),
    )));
    let rule = config.sub_config("style").sub_config("WildcardImport");

    assert!(!rule.value_or_default("autoCorrect", true).unwrap());
    assert_eq!(rule.key_sequence("autoCorrect"), "style > WildcardImport > autoCorrect");
}

#[test]
fn validation_reports_each_problem() {
    let validator = ConfigValidator::new(fixture("baseline.toml")).unwrap();
    let candidate = CompositeConfig::new(fixture("misspelled.toml"), fixture("baseline.toml"));

    let messages: Vec<String> = validator
        .validate(&candidate)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    insta::assert_snapshot!(messages.join("\n"), @r"
    Nested config expected for 'empty-blocks>EmptyFunctionBlock'.
    Property 'style>MaxLineLength>maxLineLenght' is misspelled or does not exist.
    ");
}

#[test]
fn layered_user_config_only_warns() {
    let validator = ConfigValidator::new(fixture("baseline.toml")).unwrap();
    let candidate = CompositeConfig::new(fixture("second.toml"), fixture("first.toml"));

    let notifications = validator.validate(&candidate).unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(
        notifications[0].to_string(),
        "Property 'style>WildcardImport>excludeImports' should be a list instead of a comma-separated String."
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let err = TreeConfig::from_file(&PathBuf::from("does/not/exist.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
