// crates/gce-builder-config/src/fields.rs
// ============================================================================
// Module: Field Table and Decoding
// Description: Closed descriptor table mapping raw keys to typed setters.
// Purpose: Decode untyped layers into presence-tracking fields.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Every recognized key has exactly one [`FieldSpec`] row. Decoding walks the
//! merged raw map in caller order, rejects keys without a row, and feeds each
//! value through its row's typed setter. Decoded fields are `Option`s so that
//! an explicit `false` or `0` stays distinguishable from "not supplied".
//!
//! Scalars are coerced the way builder templates are weakly decoded: flags
//! accept `true`/`false`/`1`/`0` strings, integers accept digit strings, and
//! text fields accept numbers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::ValidationError;
use crate::raw::RawConfig;
use crate::raw::value_kind;

// ============================================================================
// SECTION: Decoded Fields
// ============================================================================

/// Presence-tracking decode target; `None` means "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFields {
    /// `project_id`.
    pub project_id: Option<String>,
    /// `account_file`.
    pub account_file: Option<String>,
    /// `source_image`.
    pub source_image: Option<String>,
    /// `source_image_family`.
    pub source_image_family: Option<String>,
    /// `source_image_project_id`.
    pub source_image_project_id: Option<String>,
    /// `zone`.
    pub zone: Option<String>,
    /// `machine_type`.
    pub machine_type: Option<String>,
    /// `disk_size`.
    pub disk_size: Option<u64>,
    /// `disk_type`.
    pub disk_type: Option<String>,
    /// `network`.
    pub network: Option<String>,
    /// `network_project_id`.
    pub network_project_id: Option<String>,
    /// `subnetwork`.
    pub subnetwork: Option<String>,
    /// `tags`.
    pub tags: Option<Vec<String>>,
    /// `metadata`.
    pub metadata: Option<BTreeMap<String, String>>,
    /// `instance_name`.
    pub instance_name: Option<String>,
    /// `private_key_file`.
    pub private_key_file: Option<String>,
    /// `ssh_timeout`.
    pub ssh_timeout: Option<String>,
    /// `state_timeout`.
    pub state_timeout: Option<String>,
    /// `use_internal_ip`.
    pub use_internal_ip: Option<bool>,
    /// `omit_external_ip`.
    pub omit_external_ip: Option<bool>,
    /// `on_host_maintenance`.
    pub on_host_maintenance: Option<String>,
    /// `preemptible`.
    pub preemptible: Option<bool>,
    /// `image_description`.
    pub image_description: Option<String>,
    /// `image_family`.
    pub image_family: Option<String>,
    /// `image_labels`.
    pub image_labels: Option<BTreeMap<String, String>>,
    /// `scopes`.
    pub scopes: Option<Vec<String>>,
    /// `service_account_email`.
    pub service_account_email: Option<String>,
    /// `disable_default_service_account`.
    pub disable_default_service_account: Option<bool>,
    /// `accelerator_type`.
    pub accelerator_type: Option<String>,
    /// `accelerator_count`.
    pub accelerator_count: Option<u64>,
    /// `communicator`.
    pub communicator: Option<String>,
    /// `ssh_username`.
    pub ssh_username: Option<String>,
    /// `ssh_password`.
    pub ssh_password: Option<String>,
    /// `ssh_port`.
    pub ssh_port: Option<u64>,
    /// Fields whose value failed type decoding; later stages skip them.
    pub failed: BTreeSet<&'static str>,
}

impl DecodedFields {
    /// Returns true when `field` failed type decoding.
    #[must_use]
    pub fn is_failed(&self, field: &str) -> bool {
        self.failed.contains(field)
    }
}

// ============================================================================
// SECTION: Field Table
// ============================================================================

/// Typed setter for one field.
#[derive(Clone, Copy)]
pub enum Setter {
    /// String value.
    Text(fn(&mut DecodedFields, String)),
    /// Boolean flag.
    Flag(fn(&mut DecodedFields, bool)),
    /// Non-negative integer.
    Integer(fn(&mut DecodedFields, u64)),
    /// Ordered list of strings.
    TextList(fn(&mut DecodedFields, Vec<String>)),
    /// String-to-string map.
    TextMap(fn(&mut DecodedFields, BTreeMap<String, String>)),
}

impl Setter {
    /// Describes the accepted shape for type-mismatch messages.
    #[must_use]
    pub const fn expected(self) -> &'static str {
        match self {
            Self::Text(_) => "a string",
            Self::Flag(_) => "a boolean",
            Self::Integer(_) => "a non-negative integer",
            Self::TextList(_) => "a list of strings",
            Self::TextMap(_) => "a map of strings",
        }
    }

    /// Decodes `value` and stores it; returns `false` on a shape mismatch.
    fn apply(self, fields: &mut DecodedFields, value: &Value) -> bool {
        match self {
            Self::Text(set) => {
                let Some(text) = decode_text(value) else {
                    return false;
                };
                set(fields, text);
            }
            Self::Flag(set) => {
                let Some(flag) = decode_flag(value) else {
                    return false;
                };
                set(fields, flag);
            }
            Self::Integer(set) => {
                let Some(int) = decode_integer(value) else {
                    return false;
                };
                set(fields, int);
            }
            Self::TextList(set) => {
                let Some(list) = decode_list(value) else {
                    return false;
                };
                set(fields, list);
            }
            Self::TextMap(set) => {
                let Some(map) = decode_map(value) else {
                    return false;
                };
                set(fields, map);
            }
        }
        true
    }
}

/// One recognized key and its typed setter.
#[derive(Clone, Copy)]
pub struct FieldSpec {
    /// Raw key name.
    pub name: &'static str,
    /// Typed setter.
    pub setter: Setter,
}

/// The closed set of recognized keys, in canonical field order.
pub const FIELD_TABLE: &[FieldSpec] = &[
    FieldSpec {
        name: "project_id",
        setter: Setter::Text(|f, v| f.project_id = Some(v)),
    },
    FieldSpec {
        name: "account_file",
        setter: Setter::Text(|f, v| f.account_file = Some(v)),
    },
    FieldSpec {
        name: "source_image",
        setter: Setter::Text(|f, v| f.source_image = Some(v)),
    },
    FieldSpec {
        name: "source_image_family",
        setter: Setter::Text(|f, v| f.source_image_family = Some(v)),
    },
    FieldSpec {
        name: "source_image_project_id",
        setter: Setter::Text(|f, v| f.source_image_project_id = Some(v)),
    },
    FieldSpec {
        name: "zone",
        setter: Setter::Text(|f, v| f.zone = Some(v)),
    },
    FieldSpec {
        name: "machine_type",
        setter: Setter::Text(|f, v| f.machine_type = Some(v)),
    },
    FieldSpec {
        name: "disk_size",
        setter: Setter::Integer(|f, v| f.disk_size = Some(v)),
    },
    FieldSpec {
        name: "disk_type",
        setter: Setter::Text(|f, v| f.disk_type = Some(v)),
    },
    FieldSpec {
        name: "network",
        setter: Setter::Text(|f, v| f.network = Some(v)),
    },
    FieldSpec {
        name: "network_project_id",
        setter: Setter::Text(|f, v| f.network_project_id = Some(v)),
    },
    FieldSpec {
        name: "subnetwork",
        setter: Setter::Text(|f, v| f.subnetwork = Some(v)),
    },
    FieldSpec {
        name: "tags",
        setter: Setter::TextList(|f, v| f.tags = Some(v)),
    },
    FieldSpec {
        name: "metadata",
        setter: Setter::TextMap(|f, v| f.metadata = Some(v)),
    },
    FieldSpec {
        name: "instance_name",
        setter: Setter::Text(|f, v| f.instance_name = Some(v)),
    },
    FieldSpec {
        name: "private_key_file",
        setter: Setter::Text(|f, v| f.private_key_file = Some(v)),
    },
    FieldSpec {
        name: "ssh_timeout",
        setter: Setter::Text(|f, v| f.ssh_timeout = Some(v)),
    },
    FieldSpec {
        name: "state_timeout",
        setter: Setter::Text(|f, v| f.state_timeout = Some(v)),
    },
    FieldSpec {
        name: "use_internal_ip",
        setter: Setter::Flag(|f, v| f.use_internal_ip = Some(v)),
    },
    FieldSpec {
        name: "omit_external_ip",
        setter: Setter::Flag(|f, v| f.omit_external_ip = Some(v)),
    },
    FieldSpec {
        name: "on_host_maintenance",
        setter: Setter::Text(|f, v| f.on_host_maintenance = Some(v)),
    },
    FieldSpec {
        name: "preemptible",
        setter: Setter::Flag(|f, v| f.preemptible = Some(v)),
    },
    FieldSpec {
        name: "image_description",
        setter: Setter::Text(|f, v| f.image_description = Some(v)),
    },
    FieldSpec {
        name: "image_family",
        setter: Setter::Text(|f, v| f.image_family = Some(v)),
    },
    FieldSpec {
        name: "image_labels",
        setter: Setter::TextMap(|f, v| f.image_labels = Some(v)),
    },
    FieldSpec {
        name: "scopes",
        setter: Setter::TextList(|f, v| f.scopes = Some(v)),
    },
    FieldSpec {
        name: "service_account_email",
        setter: Setter::Text(|f, v| f.service_account_email = Some(v)),
    },
    FieldSpec {
        name: "disable_default_service_account",
        setter: Setter::Flag(|f, v| f.disable_default_service_account = Some(v)),
    },
    FieldSpec {
        name: "accelerator_type",
        setter: Setter::Text(|f, v| f.accelerator_type = Some(v)),
    },
    FieldSpec {
        name: "accelerator_count",
        setter: Setter::Integer(|f, v| f.accelerator_count = Some(v)),
    },
    FieldSpec {
        name: "communicator",
        setter: Setter::Text(|f, v| f.communicator = Some(v)),
    },
    FieldSpec {
        name: "ssh_username",
        setter: Setter::Text(|f, v| f.ssh_username = Some(v)),
    },
    FieldSpec {
        name: "ssh_password",
        setter: Setter::Text(|f, v| f.ssh_password = Some(v)),
    },
    FieldSpec {
        name: "ssh_port",
        setter: Setter::Integer(|f, v| f.ssh_port = Some(v)),
    },
];

/// Looks up the descriptor for `key`.
#[must_use]
pub fn field_spec(key: &str) -> Option<&'static FieldSpec> {
    FIELD_TABLE.iter().find(|spec| spec.name == key)
}

/// Returns every recognized key in canonical field order.
pub fn recognized_keys() -> impl Iterator<Item = &'static str> {
    FIELD_TABLE.iter().map(|spec| spec.name)
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes a merged raw map, appending unknown-key and type errors in caller
/// key order.
pub fn decode(merged: &RawConfig, errors: &mut Vec<ValidationError>) -> DecodedFields {
    let mut fields = DecodedFields::default();
    for (key, value) in merged {
        let Some(spec) = field_spec(key) else {
            errors.push(ValidationError::UnknownKey {
                key: key.clone(),
            });
            continue;
        };
        if value.is_null() {
            continue;
        }
        if !spec.setter.apply(&mut fields, value) {
            errors.push(ValidationError::TypeMismatch {
                field: spec.name,
                expected: spec.setter.expected(),
                found: value_kind(value),
            });
            fields.failed.insert(spec.name);
        }
    }
    fields
}

/// Decodes a text value; numbers are accepted in their JSON form.
fn decode_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Decodes a flag from a boolean or a `true`/`false`/`1`/`0` string.
fn decode_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(number) => match number.as_u64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Decodes a non-negative integer from a number or a digit string.
fn decode_integer(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Decodes a list whose items are all strings.
fn decode_list(value: &Value) -> Option<Vec<String>> {
    let Value::Array(items) = value else {
        return None;
    };
    items.iter().map(|item| item.as_str().map(str::to_string)).collect()
}

/// Decodes a map whose values are all strings.
fn decode_map(value: &Value) -> Option<BTreeMap<String, String>> {
    let Value::Object(entries) = value else {
        return None;
    };
    entries
        .iter()
        .map(|(key, item)| item.as_str().map(|text| (key.clone(), text.to_string())))
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
