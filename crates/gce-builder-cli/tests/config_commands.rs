// crates/gce-builder-cli/tests/config_commands.rs
// ============================================================================
// Module: CLI Config Command Tests
// Description: Integration tests for CLI config validation workflows.
// Purpose: Ensure validation reports success and fails closed on errors.
// Dependencies: gce-builder binary
// ============================================================================

//! ## Overview
//! Runs the CLI binary for config validation and key listing, and checks that
//! invalid configuration fails closed with every violation on stderr.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn gce_builder_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gce-builder"))
}

/// Writes a valid base config and its account file into a fresh directory.
fn valid_workspace() -> (TempDir, PathBuf) {
    let root = tempfile::tempdir().expect("create temp dir");
    let account_file = root.path().join("account.json");
    fs::write(&account_file, "{}").expect("write account file");
    let config_path = root.path().join("gce-builder.toml");
    let config = format!(
        r#"
project_id = "hashicorp"
source_image = "foo"
zone = "us-east1-a"
ssh_username = "root"
image_family = "bar"
account_file = "{}"

[image_labels]
label-1 = "value-1"
label-2 = "value-2"
"#,
        account_file.display()
    );
    fs::write(&config_path, config.trim()).expect("write config");
    (root, config_path)
}

fn run_validate(config_path: &Path, extra: &[&str]) -> Output {
    Command::new(gce_builder_bin())
        .args(["config", "validate", "--config"])
        .arg(config_path)
        .args(extra)
        .env_remove("GCE_BUILDER_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("config validate")
}

fn run_validate_with_log(config_path: &Path, extra: &[&str], rust_log: &str) -> Output {
    Command::new(gce_builder_bin())
        .args(["config", "validate", "--config"])
        .arg(config_path)
        .args(extra)
        .env_remove("GCE_BUILDER_CONFIG")
        .env("RUST_LOG", rust_log)
        .output()
        .expect("config validate")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies config validation succeeds and prints the derived region.
#[test]
fn cli_config_validate_accepts_valid_config() {
    let (_root, config_path) = valid_workspace();
    let output = run_validate(&config_path, &[]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Config valid"), "unexpected stdout: {stdout}");
    assert!(stdout.contains("region: us-east1"), "unexpected stdout: {stdout}");
    assert!(stdout.contains("image_name: packer-"), "unexpected stdout: {stdout}");
}

/// Verifies JSON output carries the full config and omits the SSH password.
#[test]
fn cli_config_validate_json_output() {
    let (_root, config_path) = valid_workspace();
    let output =
        run_validate(&config_path, &["--set", "ssh_password=hunter2", "--format", "json"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let document: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(document["valid"], serde_json::json!(true));
    assert_eq!(document["config"]["region"], serde_json::json!("us-east1"));
    assert_eq!(document["config"]["comm"]["type"], serde_json::json!("ssh"));
    assert_eq!(document["config"]["comm"]["ssh_port"], serde_json::json!(22));
    assert_eq!(document["config"]["state_timeout"], serde_json::json!("5m"));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("hunter2"));
}

/// Verifies every violation is reported and the exit code is non-zero.
#[test]
fn cli_config_validate_reports_all_errors() {
    let (_root, config_path) = valid_workspace();
    let output = run_validate(
        &config_path,
        &["--set", "ssh_timeout=SO BAD", "--set", "image_family=foo bar", "--set", "nope=1"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("3 error(s) occurred:"), "unexpected stderr: {stderr}");
    assert!(stderr.contains("ssh_timeout"), "unexpected stderr: {stderr}");
    assert!(stderr.contains("image_family"), "unexpected stderr: {stderr}");
    assert!(stderr.contains("unknown configuration key: nope"), "unexpected stderr: {stderr}");
}

/// Verifies override files are applied after the base layer.
#[test]
fn cli_config_validate_applies_override_files() {
    let (root, config_path) = valid_workspace();
    let override_path = root.path().join("override.json");
    fs::write(&override_path, r#"{"zone": "europe-west4-b"}"#).expect("write override");

    let output = run_validate(&config_path, &["--override", override_path.to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("region: europe-west4"), "unexpected stdout: {stdout}");
}

/// Verifies load failures are reported on stderr.
#[test]
fn cli_config_validate_rejects_missing_file() {
    let root = tempfile::tempdir().expect("create temp dir");
    let output = run_validate(&root.path().join("missing.toml"), &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load"), "unexpected stderr: {stderr}");
}

/// Verifies the key listing includes recognized keys and no derived ones.
#[test]
fn cli_config_keys_lists_recognized_keys() {
    let output = Command::new(gce_builder_bin())
        .args(["config", "keys"])
        .output()
        .expect("config keys");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let keys: Vec<&str> = stdout.lines().collect();
    assert_eq!(keys.first(), Some(&"project_id"));
    assert!(keys.contains(&"accelerator_count"));
    assert!(!keys.contains(&"region"));
    assert!(!keys.contains(&"image_name"));
}

/// Verifies a global `RUST_LOG` level is not overridden by the default filter.
#[test]
fn cli_rust_log_level_is_honored_without_verbose() {
    let (_root, config_path) = valid_workspace();
    let output = run_validate_with_log(&config_path, &[], "debug");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loaded config layer"), "unexpected stderr: {stderr}");
}

/// Verifies `RUST_LOG` takes precedence over `--verbose`.
#[test]
fn cli_rust_log_wins_over_verbose() {
    let (_root, config_path) = valid_workspace();
    let output = run_validate_with_log(&config_path, &["-v"], "error");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("loaded config layer"), "unexpected stderr: {stderr}");
}

/// Verifies `--verbose` enables debug events when `RUST_LOG` is unset.
#[test]
fn cli_verbose_enables_debug_without_rust_log() {
    let (_root, config_path) = valid_workspace();
    let output = run_validate(&config_path, &["-v"]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loaded config layer"), "unexpected stderr: {stderr}");
}
