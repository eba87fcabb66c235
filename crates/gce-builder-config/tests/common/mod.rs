// crates/gce-builder-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared fixtures for builder config validation tests.
// Purpose: Provide a known-valid raw config and small validation helpers.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::io::Write;

use gce_builder_config::ConfigValidator;
use gce_builder_config::RawConfig;
use gce_builder_config::TimestampSource;
use gce_builder_config::ValidatedConfig;
use gce_builder_config::ValidationErrors;
use serde_json::Value;
use serde_json::json;
use tempfile::NamedTempFile;

/// Fixed timestamp token used by [`fixed_validator`].
pub const FIXED_TIMESTAMP: &str = "1700000000";

/// Clock that always returns [`FIXED_TIMESTAMP`].
pub struct FixedClock;

impl TimestampSource for FixedClock {
    fn timestamp_token(&self) -> String {
        FIXED_TIMESTAMP.to_string()
    }
}

/// Known-valid raw config plus the guard keeping its account file alive.
pub struct Fixture {
    /// Raw config that passes validation.
    pub raw: RawConfig,
    /// Temporary credentials file referenced by `account_file`.
    pub account_file: NamedTempFile,
}

/// Builds the canonical valid raw config with a real account file on disk.
pub fn test_config() -> Result<Fixture, String> {
    let mut account_file = NamedTempFile::new().map_err(|err| err.to_string())?;
    account_file.write_all(b"{}").map_err(|err| err.to_string())?;
    let path = account_file.path().to_string_lossy().into_owned();
    let value = json!({
        "account_file": path,
        "project_id": "hashicorp",
        "source_image": "foo",
        "ssh_username": "root",
        "image_family": "bar",
        "image_labels": {
            "label-1": "value-1",
            "label-2": "value-2",
        },
        "zone": "us-east1-a",
    });
    let Value::Object(raw) = value else {
        return Err("fixture must be an object".to_string());
    };
    Ok(Fixture {
        raw,
        account_file,
    })
}

/// Builds a raw layer from a JSON object literal.
pub fn layer(value: Value) -> Result<RawConfig, String> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!("layer must be an object, got {other}")),
    }
}

/// Validator with a deterministic clock.
pub fn fixed_validator() -> ConfigValidator {
    ConfigValidator::new().with_clock(FixedClock)
}

/// Validates `raw` with one override setting `key` to `value`.
pub fn validate_with(
    raw: &RawConfig,
    key: &str,
    value: Value,
) -> Result<ValidatedConfig, ValidationErrors> {
    let mut overrides = RawConfig::new();
    overrides.insert(key.to_string(), value);
    fixed_validator().validate(raw, &[overrides])
}

/// Fails unless `result` is an error whose text contains `needle`.
pub fn assert_invalid(
    result: Result<ValidatedConfig, ValidationErrors>,
    needle: &str,
) -> Result<(), String> {
    match result {
        Err(errors) => {
            let message = errors.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error '{message}' did not contain '{needle}'"))
            }
        }
        Ok(validated) => {
            Err(format!("expected invalid config, got image {}", validated.config.image_name))
        }
    }
}

/// Fails unless `result` is a success, returning the config.
pub fn assert_valid(
    result: Result<ValidatedConfig, ValidationErrors>,
) -> Result<ValidatedConfig, String> {
    result.map_err(|errors| format!("expected valid config, got {errors}"))
}
