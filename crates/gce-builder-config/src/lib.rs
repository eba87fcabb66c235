// crates/gce-builder-config/src/lib.rs
// ============================================================================
// Module: GCE Builder Config Library
// Description: Canonical configuration model and validator for the Google
//              Compute image builder.
// Purpose: Turn untyped, layered key/value input into a fully defaulted config.
// Dependencies: serde, serde_json, thiserror, humantime, time, url, tracing
// ============================================================================

//! ## Overview
//! `gce-builder-config` converts user-authored key/value maps into a validated
//! [`GoogleComputeConfig`]. Input layers are merged left to right, decoded
//! against a closed field table, defaulted, checked, and derived. Every
//! independent problem is collected into a single [`ValidationErrors`] value
//! rather than stopping at the first failure.
//!
//! Security posture: raw maps are untrusted input; unknown keys fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod fields;
pub mod interfaces;
pub mod loader;
pub mod raw;
pub mod validate;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use error::LoadError;
pub use error::ValidationError;
pub use error::ValidationErrors;
pub use fields::recognized_keys;
pub use interfaces::*;
pub use loader::CONFIG_ENV_VAR;
pub use loader::DEFAULT_CONFIG_NAME;
pub use loader::MAX_CONFIG_FILE_SIZE;
pub use loader::load_raw_config;
pub use loader::resolve_config_path;
pub use raw::RawConfig;
pub use raw::merge_layers;
pub use validate::ConfigValidator;
pub use validate::ValidatedConfig;
pub use validate::new_config;
