// crates/gce-builder-config/src/validate.rs
// ============================================================================
// Module: Configuration Validator
// Description: Merge, decode, default, check, and derive a builder config.
// Purpose: Produce a fully defaulted config or every violation at once.
// Dependencies: humantime, url, tracing
// ============================================================================

//! ## Overview
//! [`ConfigValidator::validate`] runs a fixed pipeline over a private merged
//! copy of its input layers:
//!
//! 1. merge and decode (unknown keys, type mismatches);
//! 2. apply defaults to unset fields;
//! 3. required-field checks;
//! 4. format and enum checks;
//! 5. cross-field rules;
//! 6. local file existence;
//! 7. derivation of `region`, `image_name`, and default scopes.
//!
//! Errors from stages 1 through 6 are collected in order; a field that failed
//! decoding is skipped by the stages that follow. Any error means no config is
//! returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::config::CommunicatorConfig;
use crate::config::CommunicatorKind;
use crate::config::DEFAULT_DISK_SIZE_GB;
use crate::config::DEFAULT_DISK_TYPE;
use crate::config::DEFAULT_MACHINE_TYPE;
use crate::config::DEFAULT_NETWORK;
use crate::config::DEFAULT_SCOPES;
use crate::config::DEFAULT_STATE_TIMEOUT;
use crate::config::GoogleComputeConfig;
use crate::config::IMAGE_NAME_PREFIX;
use crate::config::IMAGE_NAME_TEMPLATE;
use crate::config::MAX_IMAGE_FAMILY_LENGTH;
use crate::config::OnHostMaintenance;
use crate::config::TIMESTAMP_PLACEHOLDER;
use crate::config::derive_region;
use crate::config::is_valid_image_family;
use crate::error::ValidationError;
use crate::error::ValidationErrors;
use crate::fields::DecodedFields;
use crate::fields::decode;
use crate::interfaces::CommunicatorDefaults;
use crate::interfaces::LocalFilesystem;
use crate::interfaces::PathProbe;
use crate::interfaces::SshCommunicatorDefaults;
use crate::interfaces::SystemClock;
use crate::interfaces::TimestampSource;
use crate::raw::RawConfig;
use crate::raw::merge_layers;
use crate::raw::render_value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Keys jointly constrained by the accelerator rule.
const ACCELERATOR_KEYS: [&str; 3] =
    ["accelerator_count", "on_host_maintenance", "accelerator_type"];
/// Rendered value for an involved key the caller did not supply.
const UNSET_VALUE: &str = "<unset>";

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Successful validation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    /// Fully defaulted and derived configuration.
    pub config: GoogleComputeConfig,
    /// Soft-deprecation notices; the current rule set never emits one.
    pub warnings: Vec<String>,
}

/// Validates raw configuration layers into a [`GoogleComputeConfig`].
pub struct ConfigValidator {
    /// Path-existence predicate for local file checks.
    filesystem: Box<dyn PathProbe>,
    /// Timestamp resolver for the generated image name.
    clock: Box<dyn TimestampSource>,
    /// Communicator default provider.
    communicator: Box<dyn CommunicatorDefaults>,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator {
    /// Creates a validator backed by the local filesystem and system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filesystem: Box::new(LocalFilesystem),
            clock: Box::new(SystemClock),
            communicator: Box::new(SshCommunicatorDefaults),
        }
    }

    /// Replaces the path-existence predicate.
    #[must_use]
    pub fn with_filesystem(mut self, filesystem: impl PathProbe + 'static) -> Self {
        self.filesystem = Box::new(filesystem);
        self
    }

    /// Replaces the timestamp resolver.
    #[must_use]
    pub fn with_clock(mut self, clock: impl TimestampSource + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the communicator default provider.
    #[must_use]
    pub fn with_communicator_defaults(
        mut self,
        communicator: impl CommunicatorDefaults + 'static,
    ) -> Self {
        self.communicator = Box::new(communicator);
        self
    }

    /// Validates `raw` with `overrides` applied left to right.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] listing every violation, in stage order,
    /// when any stage fails.
    pub fn validate(
        &self,
        raw: &RawConfig,
        overrides: &[RawConfig],
    ) -> Result<ValidatedConfig, ValidationErrors> {
        let merged = merge_layers(raw, overrides);
        let mut errors = Vec::new();

        let fields = decode(&merged, &mut errors);
        let draft = Draft::with_defaults(fields);
        check_required(&draft, &mut errors);
        let parsed = check_formats(&draft, self.communicator.as_ref(), &mut errors);
        check_cross_field(&draft, parsed.on_host_maintenance, &merged, &mut errors);
        check_files(&draft, self.filesystem.as_ref(), &mut errors);
        let image_name = resolve_image_name(self.clock.as_ref(), &mut errors);

        tracing::debug!(
            layers = overrides.len() + 1,
            keys = merged.len(),
            errors = errors.len(),
            "validated google compute builder config"
        );
        if !errors.is_empty() {
            return Err(ValidationErrors::new(errors));
        }
        Ok(ValidatedConfig {
            config: draft.finish(parsed, image_name),
            warnings: Vec::new(),
        })
    }
}

/// Validates `raw` with `overrides` using the default local collaborators.
///
/// # Errors
///
/// Returns [`ValidationErrors`] when any validation stage fails.
pub fn new_config(
    raw: &RawConfig,
    overrides: &[RawConfig],
) -> Result<ValidatedConfig, ValidationErrors> {
    ConfigValidator::new().validate(raw, overrides)
}

// ============================================================================
// SECTION: Defaulting
// ============================================================================

/// Decoded fields with defaults applied; text still awaiting format checks.
struct Draft {
    /// Raw decoded fields, kept for presence and failure tracking.
    fields: DecodedFields,
    /// `machine_type` or its default.
    machine_type: String,
    /// `disk_type` or its default.
    disk_type: String,
    /// `network` or its default.
    network: String,
    /// `use_internal_ip` or false.
    use_internal_ip: bool,
    /// `omit_external_ip` or false.
    omit_external_ip: bool,
    /// `preemptible` or false.
    preemptible: bool,
    /// `disable_default_service_account` or false.
    disable_default_service_account: bool,
    /// `accelerator_count` or zero.
    accelerator_count: u64,
    /// `accelerator_type` or empty.
    accelerator_type: String,
    /// `scopes` or empty; empty is replaced at derivation.
    scopes: Vec<String>,
}

impl Draft {
    /// Applies defaults without overwriting any supplied value.
    ///
    /// Identifiers are trimmed first so that checks and output see the same
    /// value; whitespace-only identifiers become unset.
    fn with_defaults(mut fields: DecodedFields) -> Self {
        for slot in [
            &mut fields.project_id,
            &mut fields.source_image,
            &mut fields.zone,
            &mut fields.service_account_email,
            &mut fields.accelerator_type,
        ] {
            *slot = slot.take().and_then(normalize_identifier);
        }
        Self {
            machine_type: fields
                .machine_type
                .clone()
                .unwrap_or_else(|| DEFAULT_MACHINE_TYPE.to_string()),
            disk_type: fields.disk_type.clone().unwrap_or_else(|| DEFAULT_DISK_TYPE.to_string()),
            network: fields.network.clone().unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
            use_internal_ip: fields.use_internal_ip.unwrap_or(false),
            omit_external_ip: fields.omit_external_ip.unwrap_or(false),
            preemptible: fields.preemptible.unwrap_or(false),
            disable_default_service_account: fields
                .disable_default_service_account
                .unwrap_or(false),
            accelerator_count: fields.accelerator_count.unwrap_or(0),
            accelerator_type: fields.accelerator_type.clone().unwrap_or_default(),
            scopes: fields.scopes.clone().unwrap_or_default(),
            fields,
        }
    }

    /// Builds the final config from checked values.
    fn finish(self, parsed: Parsed, image_name: String) -> GoogleComputeConfig {
        let fields = self.fields;
        let zone = fields.zone.unwrap_or_default();
        let region = derive_region(&zone).to_string();
        let scopes = if self.scopes.is_empty() {
            DEFAULT_SCOPES.iter().map(|scope| (*scope).to_string()).collect()
        } else {
            self.scopes
        };
        GoogleComputeConfig {
            project_id: fields.project_id.unwrap_or_default(),
            account_file: fields.account_file.map(PathBuf::from),
            source_image: fields.source_image.unwrap_or_default(),
            source_image_family: fields.source_image_family.unwrap_or_default(),
            source_image_project_id: fields.source_image_project_id,
            zone,
            region,
            machine_type: self.machine_type,
            disk_size_gb: parsed.disk_size_gb,
            disk_type: self.disk_type,
            network: self.network,
            network_project_id: fields.network_project_id,
            subnetwork: fields.subnetwork,
            tags: fields.tags.unwrap_or_default(),
            metadata: fields.metadata.unwrap_or_default(),
            instance_name: fields.instance_name,
            private_key_file: fields.private_key_file.map(PathBuf::from),
            use_internal_ip: self.use_internal_ip,
            omit_external_ip: self.omit_external_ip,
            on_host_maintenance: parsed.on_host_maintenance.unwrap_or_default(),
            preemptible: self.preemptible,
            image_name,
            image_description: fields.image_description.unwrap_or_default(),
            image_family: fields.image_family.unwrap_or_default(),
            image_labels: fields.image_labels.unwrap_or_default(),
            scopes,
            service_account_email: fields.service_account_email,
            disable_default_service_account: self.disable_default_service_account,
            accelerator_type: self.accelerator_type,
            accelerator_count: parsed.accelerator_count,
            state_timeout: parsed.state_timeout,
            comm: CommunicatorConfig {
                kind: parsed.communicator,
                ssh_port: parsed.ssh_port,
                ssh_username: fields.ssh_username,
                ssh_password: fields.ssh_password,
                ssh_timeout: parsed.ssh_timeout,
            },
        }
    }
}

/// Trims surrounding whitespace; an empty result means unset.
fn normalize_identifier(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// SECTION: Required Fields
// ============================================================================

/// Reports required fields that are absent or empty.
fn check_required(draft: &Draft, errors: &mut Vec<ValidationError>) {
    let fields = &draft.fields;
    let required = [
        ("project_id", fields.project_id.as_deref()),
        ("source_image", fields.source_image.as_deref()),
        ("zone", fields.zone.as_deref()),
    ];
    for (field, value) in required {
        if fields.is_failed(field) {
            continue;
        }
        if value.is_none_or(|text| text.trim().is_empty()) {
            errors.push(ValidationError::RequiredFieldMissing {
                field,
            });
        }
    }
}

// ============================================================================
// SECTION: Format and Enum Checks
// ============================================================================

/// Typed values produced by the format stage; defaults stand in on failure.
struct Parsed {
    /// SSH connect timeout.
    ssh_timeout: Duration,
    /// State-poll timeout.
    state_timeout: Duration,
    /// Maintenance policy; `None` when the supplied literal was rejected.
    on_host_maintenance: Option<OnHostMaintenance>,
    /// Communicator type.
    communicator: CommunicatorKind,
    /// SSH port.
    ssh_port: u16,
    /// Boot disk size.
    disk_size_gb: u64,
    /// Accelerator count.
    accelerator_count: u32,
}

/// Runs format and enum checks in canonical field order.
fn check_formats(
    draft: &Draft,
    communicator: &dyn CommunicatorDefaults,
    errors: &mut Vec<ValidationError>,
) -> Parsed {
    let fields = &draft.fields;

    let disk_size_gb = match fields.disk_size {
        Some(0) => {
            errors.push(ValidationError::InvalidFormat {
                field: "disk_size",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
            DEFAULT_DISK_SIZE_GB
        }
        Some(size) => size,
        None => DEFAULT_DISK_SIZE_GB,
    };

    let ssh_timeout = parse_timeout("ssh_timeout", fields.ssh_timeout.as_deref(), errors)
        .unwrap_or_else(|| communicator.ssh_timeout());
    let state_timeout = parse_timeout("state_timeout", fields.state_timeout.as_deref(), errors)
        .unwrap_or(DEFAULT_STATE_TIMEOUT);

    let on_host_maintenance = match fields.on_host_maintenance.as_deref() {
        None => Some(OnHostMaintenance::default()),
        Some(literal) => {
            let parsed = OnHostMaintenance::parse(literal);
            if parsed.is_none() {
                errors.push(ValidationError::InvalidEnumValue {
                    field: "on_host_maintenance",
                    value: literal.to_string(),
                    allowed: OnHostMaintenance::LITERALS,
                });
            }
            parsed
        }
    };

    if let Some(family) = fields.image_family.as_deref()
        && !is_valid_image_family(family)
    {
        let reason = if family.len() > MAX_IMAGE_FAMILY_LENGTH {
            format!("must be at most {MAX_IMAGE_FAMILY_LENGTH} characters")
        } else {
            "must contain only lowercase letters, digits, and hyphens".to_string()
        };
        errors.push(ValidationError::InvalidFormat {
            field: "image_family",
            value: family.to_string(),
            reason,
        });
    }

    for scope in &draft.scopes {
        if let Err(reason) = check_scope(scope) {
            errors.push(ValidationError::InvalidFormat {
                field: "scopes",
                value: scope.clone(),
                reason,
            });
        }
    }

    let accelerator_count = u32::try_from(draft.accelerator_count).unwrap_or_else(|_| {
        errors.push(ValidationError::InvalidFormat {
            field: "accelerator_count",
            value: draft.accelerator_count.to_string(),
            reason: format!("must be at most {}", u32::MAX),
        });
        0
    });

    let kind = match fields.communicator.as_deref() {
        None => communicator.kind(),
        Some(literal) => CommunicatorKind::parse(literal).unwrap_or_else(|| {
            errors.push(ValidationError::InvalidEnumValue {
                field: "communicator",
                value: literal.to_string(),
                allowed: CommunicatorKind::LITERALS,
            });
            communicator.kind()
        }),
    };

    let ssh_port = match fields.ssh_port {
        None => communicator.ssh_port(),
        Some(port) => match u16::try_from(port) {
            Ok(port) if port > 0 => port,
            _ => {
                errors.push(ValidationError::InvalidFormat {
                    field: "ssh_port",
                    value: port.to_string(),
                    reason: "must be between 1 and 65535".to_string(),
                });
                communicator.ssh_port()
            }
        },
    };

    Parsed {
        ssh_timeout,
        state_timeout,
        on_host_maintenance,
        communicator: kind,
        ssh_port,
        disk_size_gb,
        accelerator_count,
    }
}

/// Parses an optional duration field, recording a format error on failure.
fn parse_timeout(
    field: &'static str,
    value: Option<&str>,
    errors: &mut Vec<ValidationError>,
) -> Option<Duration> {
    let text = value?;
    match humantime::parse_duration(text.trim()) {
        Ok(duration) => Some(duration),
        Err(err) => {
            errors.push(ValidationError::InvalidFormat {
                field,
                value: text.to_string(),
                reason: err.to_string(),
            });
            None
        }
    }
}

/// Checks that a scope is an absolute `https` URL.
fn check_scope(scope: &str) -> Result<(), String> {
    let url = Url::parse(scope).map_err(|err| err.to_string())?;
    if url.scheme() != "https" {
        return Err(format!("scheme must be https, got {}", url.scheme()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Cross-Field Rules
// ============================================================================

/// Evaluates jointly constrained fields in field-table order.
fn check_cross_field(
    draft: &Draft,
    on_host_maintenance: Option<OnHostMaintenance>,
    merged: &RawConfig,
    errors: &mut Vec<ValidationError>,
) {
    let fields = &draft.fields;

    let ip_decoded =
        !fields.is_failed("omit_external_ip") && !fields.is_failed("use_internal_ip");
    if ip_decoded && draft.omit_external_ip && !draft.use_internal_ip {
        errors.push(ValidationError::CrossFieldConstraint {
            rule: "omit_external_ip requires use_internal_ip",
            involved: involved_pairs(merged, &["omit_external_ip", "use_internal_ip"]),
        });
    }

    let has_service_account = fields.service_account_email.is_some();
    if !fields.is_failed("disable_default_service_account")
        && draft.disable_default_service_account
        && has_service_account
    {
        errors.push(ValidationError::CrossFieldConstraint {
            rule: "service_account_email cannot be set when disable_default_service_account is \
                   true",
            involved: involved_pairs(
                merged,
                &["disable_default_service_account", "service_account_email"],
            ),
        });
    }

    let accelerator_decoded = !ACCELERATOR_KEYS.iter().any(|key| fields.is_failed(key));
    if let (true, Some(maintenance)) = (accelerator_decoded, on_host_maintenance)
        && let Some(rule) = accelerator_violation(
            &draft.accelerator_type,
            draft.accelerator_count,
            maintenance,
        )
    {
        errors.push(ValidationError::CrossFieldConstraint {
            rule,
            involved: involved_pairs(merged, &ACCELERATOR_KEYS),
        });
    }
}

/// Returns the violated accelerator rule, if any.
fn accelerator_violation(
    accelerator_type: &str,
    accelerator_count: u64,
    maintenance: OnHostMaintenance,
) -> Option<&'static str> {
    let type_set = !accelerator_type.is_empty();
    let count_set = accelerator_count > 0;
    if !type_set && !count_set {
        return None;
    }
    if maintenance != OnHostMaintenance::Terminate {
        return Some("accelerators require on_host_maintenance to be TERMINATE");
    }
    if !type_set {
        return Some("accelerator_type must be set when accelerator_count is greater than zero");
    }
    if !count_set {
        return Some("accelerator_count must be greater than zero when accelerator_type is set");
    }
    None
}

/// Lists `keys` with their supplied values, in caller order.
///
/// Supplied keys come first in the order the caller wrote them; keys the
/// caller never supplied follow in `keys` order, rendered as `<unset>`.
fn involved_pairs(merged: &RawConfig, keys: &[&str]) -> Vec<(String, String)> {
    let mut involved: Vec<(String, String)> = merged
        .iter()
        .filter(|(key, value)| keys.contains(&key.as_str()) && !value.is_null())
        .map(|(key, value)| (key.clone(), render_value(value)))
        .collect();
    for key in keys {
        if !involved.iter().any(|(seen, _)| seen == key) {
            involved.push(((*key).to_string(), UNSET_VALUE.to_string()));
        }
    }
    involved
}

// ============================================================================
// SECTION: File Checks
// ============================================================================

/// Confirms referenced local files exist.
fn check_files(draft: &Draft, filesystem: &dyn PathProbe, errors: &mut Vec<ValidationError>) {
    let fields = &draft.fields;
    let files = [
        ("account_file", fields.account_file.as_deref()),
        ("private_key_file", fields.private_key_file.as_deref()),
    ];
    for (field, path) in files {
        let Some(path) = path.filter(|path| !path.trim().is_empty()) else {
            continue;
        };
        if !filesystem.exists(Path::new(path)) {
            errors.push(ValidationError::FileNotFound {
                field,
                path: path.to_string(),
            });
        }
    }
}

// ============================================================================
// SECTION: Derivation
// ============================================================================

/// Resolves the image name template into a concrete name.
fn resolve_image_name(clock: &dyn TimestampSource, errors: &mut Vec<ValidationError>) -> String {
    let token = clock.timestamp_token();
    let name = IMAGE_NAME_TEMPLATE.replace(TIMESTAMP_PLACEHOLDER, token.trim());
    if name.contains(TIMESTAMP_PLACEHOLDER) || name.len() == IMAGE_NAME_PREFIX.len() {
        errors.push(ValidationError::InvalidFormat {
            field: "image_name",
            value: name.clone(),
            reason: "timestamp placeholder did not resolve".to_string(),
        });
    }
    name
}

// ============================================================================
// SECTION: Tests
// ============================================================================
