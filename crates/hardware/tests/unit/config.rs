//! Configuration Tests.
//!
//! Verifies JSON loading, defaults, and validation failures, including how an invalid
//! configuration surfaces from `Core::new`.

use pipecore::common::error::{ConfigError, CoreError};
use pipecore::config::{Config, FeatureConfig};
use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;

#[test]
fn empty_json_yields_defaults() {
    let config = Config::from_json("{}").expect("empty object is valid");
    assert_eq!(config, Config::default());
    assert_eq!(config.general.reset_address, 0x0040_0000);
    assert!(!config.features.fpu);
    assert!(config.features.divide);
}

#[test]
fn partial_feature_table_keeps_other_defaults() {
    let config = Config::from_json(r#"{ "features": { "lock": false, "fpu": true } }"#)
        .expect("valid config");
    assert_eq!(
        config.features,
        FeatureConfig {
            lock: false,
            fpu: true,
            ..FeatureConfig::default()
        }
    );
}

#[test]
fn misaligned_reset_address_is_rejected() {
    let err = Config::from_json(r#"{ "general": { "reset_address": 4098 } }"#)
        .expect_err("misaligned reset vector");
    match err {
        ConfigError::Invalid { field, .. } => assert_eq!(field, "general.reset_address"),
        ConfigError::Json(e) => panic!("unexpected parse error: {e}"),
    }
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = Config::from_json(r#"{ "general": "#).expect_err("truncated input");
    assert!(matches!(err, ConfigError::Json(_)));
    assert!(err.to_string().starts_with("failed to parse configuration"));
}

#[test]
fn unknown_field_type_is_a_parse_error() {
    let err = Config::from_json(r#"{ "features": { "divide": "yes" } }"#)
        .expect_err("wrong field type");
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn core_rejects_invalid_config() {
    let mut config = Config::default();
    config.general.reset_address = 0x0040_0002;
    let err = TestContext::builder()
        .config(config)
        .try_build()
        .err()
        .expect("construction must fail");
    assert!(matches!(err, CoreError::Config(ConfigError::Invalid { .. })));
}

#[test]
fn core_requires_enabled_divide_unit() {
    let err = TestContext::builder()
        .explicit_units()
        .try_build()
        .err()
        .expect("divide unit missing");
    assert!(matches!(err, CoreError::MissingUnit("divide")));
}

#[test]
fn core_requires_enabled_fpu() {
    let mut config = Config::default();
    config.features.divide = false;
    config.features.fpu = true;
    let err = TestContext::builder()
        .config(config)
        .explicit_units()
        .try_build()
        .err()
        .expect("fpu missing");
    assert!(matches!(err, CoreError::MissingUnit("floating-point")));
    assert_eq!(
        err.to_string(),
        "configuration enables the floating-point unit but none was supplied"
    );
}
