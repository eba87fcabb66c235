// crates/gce-builder-config/src/loader.rs
// ============================================================================
// Module: Raw Layer Loader
// Description: Reads raw configuration layers from TOML or JSON files.
// Purpose: Provide size- and path-limited, fail-closed file loading.
// Dependencies: toml, serde_json, tracing
// ============================================================================

//! ## Overview
//! Layers are read as untyped maps; no field checks happen here. The loader
//! only guarantees that a file is small, UTF-8, recognizably TOML or JSON, and
//! has a table at the top level. Security posture: file contents are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::LoadError;
use crate::raw::RawConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "gce-builder.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "GCE_BUILDER_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Path Resolution
// ============================================================================

/// Resolves the config path from an explicit argument or the environment.
///
/// `env_value` is the value of [`CONFIG_ENV_VAR`], read by the caller.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>, env_value: Option<String>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env_value {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_NAME),
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Supported layer encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LayerFormat {
    /// `.toml` files.
    Toml,
    /// `.json` files.
    Json,
}

/// Reads one raw configuration layer from `path`.
///
/// # Errors
///
/// Returns [`LoadError`] when the file cannot be read, is too large, is not
/// UTF-8, has an unsupported extension, or does not contain a table.
pub fn load_raw_config(path: &Path) -> Result<RawConfig, LoadError> {
    validate_path(path)?;
    let format = layer_format(path)?;
    let bytes = fs::read(path).map_err(|err| LoadError::Io(format!("{}: {err}", path.display())))?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(LoadError::Invalid("config file exceeds size limit".to_string()));
    }
    let content = std::str::from_utf8(&bytes)
        .map_err(|_| LoadError::Invalid("config file must be utf-8".to_string()))?;
    let value: Value = match format {
        LayerFormat::Toml => {
            toml::from_str(content).map_err(|err| LoadError::Parse(err.to_string()))?
        }
        LayerFormat::Json => {
            serde_json::from_str(content).map_err(|err| LoadError::Parse(err.to_string()))?
        }
    };
    let Value::Object(map) = value else {
        return Err(LoadError::Invalid("config root must be a table".to_string()));
    };
    tracing::debug!(path = %path.display(), keys = map.len(), "loaded config layer");
    Ok(map)
}

/// Picks the layer encoding from the file extension.
fn layer_format(path: &Path) -> Result<LayerFormat, LoadError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(LayerFormat::Toml),
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(LayerFormat::Json),
        _ => Err(LoadError::Invalid(format!(
            "unsupported config extension: {} (expected .toml or .json)",
            path.display()
        ))),
    }
}

/// Validates the path against length limits.
fn validate_path(path: &Path) -> Result<(), LoadError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(LoadError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(LoadError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and fixtures."
    )]

    use std::io::Write;

    use super::*;

    fn write_layer(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().expect("temp file");
        file.write_all(content.as_bytes()).expect("write layer");
        file
    }

    #[test]
    fn explicit_path_wins_over_environment() {
        let path = resolve_config_path(Some(Path::new("a.toml")), Some("b.toml".to_string()));
        assert_eq!(path, PathBuf::from("a.toml"));
    }

    #[test]
    fn environment_path_wins_over_default() {
        assert_eq!(resolve_config_path(None, Some("b.toml".to_string())), PathBuf::from("b.toml"));
        assert_eq!(
            resolve_config_path(None, Some("  ".to_string())),
            PathBuf::from(DEFAULT_CONFIG_NAME)
        );
        assert_eq!(resolve_config_path(None, None), PathBuf::from(DEFAULT_CONFIG_NAME));
    }

    #[test]
    fn toml_layer_keeps_key_order() {
        let file = write_layer(
            ".toml",
            "zone = \"us-east1-a\"\nproject_id = \"hashicorp\"\ndisk_size = 20\n",
        );
        let layer = load_raw_config(file.path()).expect("load toml");
        let keys: Vec<&str> = layer.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zone", "project_id", "disk_size"]);
        assert_eq!(layer.get("disk_size"), Some(&Value::from(20)));
    }

    #[test]
    fn json_layer_loads() {
        let file = write_layer(".json", r#"{"project_id": "hashicorp", "scopes": []}"#);
        let layer = load_raw_config(file.path()).expect("load json");
        assert_eq!(layer.len(), 2);
    }

    #[test]
    fn json_root_must_be_object() {
        let file = write_layer(".json", "[1, 2]");
        let err = load_raw_config(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(message) if message.contains("table")));
    }

    #[test]
    fn unsupported_extension_rejected() {
        let file = write_layer(".yaml", "project_id: hashicorp\n");
        assert!(matches!(load_raw_config(file.path()), Err(LoadError::Invalid(_))));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let file = write_layer(".toml", "project_id = \n");
        assert!(matches!(load_raw_config(file.path()), Err(LoadError::Parse(_))));
    }

    #[test]
    fn oversized_file_rejected() {
        let padding = "#".repeat(MAX_CONFIG_FILE_SIZE + 1);
        let file = write_layer(".toml", &padding);
        let err = load_raw_config(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(message) if message.contains("size limit")));
    }

    #[test]
    fn non_utf8_file_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("temp file");
        file.write_all(&[0x7a, 0x6f, 0x6e, 0x65, 0x20, 0x3d, 0x20, 0xff, 0xfe]).expect("write");
        let err = load_raw_config(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(message) if message.contains("utf-8")));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_raw_config(Path::new("/tmp/i/should/not/exist.toml")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
