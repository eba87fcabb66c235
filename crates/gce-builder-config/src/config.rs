// crates/gce-builder-config/src/config.rs
// ============================================================================
// Module: Google Compute Builder Configuration
// Description: Validated configuration model, enums, and documented defaults.
// Purpose: Closed, statically shaped representation handed to the builder.
// Dependencies: serde, humantime
// ============================================================================

//! ## Overview
//! [`GoogleComputeConfig`] is produced by [`crate::ConfigValidator`] and never
//! mutated afterwards. Every optional field carries its documented default;
//! `region` and `image_name` are derived and cannot be supplied by callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default machine type for the build instance.
pub const DEFAULT_MACHINE_TYPE: &str = "n1-standard-1";
/// Default boot disk size in gigabytes.
pub const DEFAULT_DISK_SIZE_GB: u64 = 10;
/// Default boot disk type.
pub const DEFAULT_DISK_TYPE: &str = "pd-standard";
/// Default VPC network.
pub const DEFAULT_NETWORK: &str = "default";
/// Default state-poll timeout.
pub const DEFAULT_STATE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Default SSH connect timeout.
pub const DEFAULT_SSH_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;
/// Template for the generated image name; the placeholder is always resolved.
pub const IMAGE_NAME_TEMPLATE: &str = "packer-{{timestamp}}";
/// Literal prefix carried by every generated image name.
pub const IMAGE_NAME_PREFIX: &str = "packer-";
/// Placeholder substituted with the resolved timestamp token.
pub const TIMESTAMP_PLACEHOLDER: &str = "{{timestamp}}";
/// Maximum length of an image family name.
pub const MAX_IMAGE_FAMILY_LENGTH: usize = 63;

/// OAuth scopes granted to the build instance when none are supplied.
pub const DEFAULT_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/compute",
    "https://www.googleapis.com/auth/devstorage.full_control",
];

// ============================================================================
// SECTION: Enums
// ============================================================================

/// Provider behavior when the underlying host needs maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnHostMaintenance {
    /// Live-migrate the instance.
    #[default]
    Migrate,
    /// Stop the instance.
    Terminate,
}

impl OnHostMaintenance {
    /// Accepted literals, in declaration order.
    pub const LITERALS: &'static [&'static str] = &["MIGRATE", "TERMINATE"];

    /// Parses an exact (case-sensitive) literal.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MIGRATE" => Some(Self::Migrate),
            "TERMINATE" => Some(Self::Terminate),
            _ => None,
        }
    }

    /// Returns the literal accepted by the provider API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Migrate => "MIGRATE",
            Self::Terminate => "TERMINATE",
        }
    }
}

/// Remote-execution channel used after the instance boots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicatorKind {
    /// Secure shell.
    #[default]
    Ssh,
    /// Windows remote management.
    Winrm,
    /// No communicator.
    None,
}

impl CommunicatorKind {
    /// Accepted literals, in declaration order.
    pub const LITERALS: &'static [&'static str] = &["ssh", "winrm", "none"];

    /// Parses an exact literal.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ssh" => Some(Self::Ssh),
            "winrm" => Some(Self::Winrm),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Returns the literal form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Winrm => "winrm",
            Self::None => "none",
        }
    }
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Communicator sub-configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommunicatorConfig {
    /// Communicator type.
    #[serde(rename = "type")]
    pub kind: CommunicatorKind,
    /// SSH port.
    pub ssh_port: u16,
    /// SSH login user.
    pub ssh_username: Option<String>,
    /// SSH password (never serialized).
    #[serde(skip_serializing)]
    pub ssh_password: Option<String>,
    /// SSH connect timeout.
    #[serde(with = "humantime_serde")]
    pub ssh_timeout: Duration,
}

/// Fully validated, defaulted, and derived Google Compute builder config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoogleComputeConfig {
    /// Project that owns the build instance and the resulting image.
    pub project_id: String,
    /// Service account credentials file.
    pub account_file: Option<PathBuf>,
    /// Source image name.
    pub source_image: String,
    /// Source image family (empty when unset).
    pub source_image_family: String,
    /// Project hosting the source image.
    pub source_image_project_id: Option<String>,
    /// Zone the build instance runs in.
    pub zone: String,
    /// Region derived from `zone`.
    pub region: String,
    /// Machine type of the build instance.
    pub machine_type: String,
    /// Boot disk size in gigabytes.
    pub disk_size_gb: u64,
    /// Boot disk type.
    pub disk_type: String,
    /// VPC network.
    pub network: String,
    /// Project hosting a shared VPC network.
    pub network_project_id: Option<String>,
    /// Subnetwork within `network`.
    pub subnetwork: Option<String>,
    /// Network tags applied to the build instance.
    pub tags: Vec<String>,
    /// Instance metadata.
    pub metadata: BTreeMap<String, String>,
    /// Explicit build instance name.
    pub instance_name: Option<String>,
    /// SSH private key file for the communicator.
    pub private_key_file: Option<PathBuf>,
    /// Connect over the instance's internal IP.
    pub use_internal_ip: bool,
    /// Create the instance without an external IP.
    pub omit_external_ip: bool,
    /// Host maintenance policy.
    pub on_host_maintenance: OnHostMaintenance,
    /// Run the build on a preemptible instance.
    pub preemptible: bool,
    /// Generated image name.
    pub image_name: String,
    /// Image description (empty when unset).
    pub image_description: String,
    /// Output image family (empty when unset).
    pub image_family: String,
    /// Labels applied to the output image.
    pub image_labels: BTreeMap<String, String>,
    /// OAuth scopes granted to the build instance.
    pub scopes: Vec<String>,
    /// Service account attached to the build instance.
    pub service_account_email: Option<String>,
    /// Create the instance without the default service account.
    pub disable_default_service_account: bool,
    /// Accelerator type (empty when unset).
    pub accelerator_type: String,
    /// Number of attached accelerators.
    pub accelerator_count: u32,
    /// Timeout for provider state polling.
    #[serde(with = "humantime_serde")]
    pub state_timeout: Duration,
    /// Communicator sub-configuration.
    pub comm: CommunicatorConfig,
}

impl GoogleComputeConfig {
    /// Returns true when at least one accelerator is attached.
    #[must_use]
    pub const fn has_accelerators(&self) -> bool {
        self.accelerator_count > 0
    }
}

// ============================================================================
// SECTION: Derivations
// ============================================================================

/// Derives the region from a zone of the form `<region>-<suffix>`.
///
/// A zone without any `-` is its own region.
#[must_use]
pub fn derive_region(zone: &str) -> &str {
    zone.rsplit_once('-').map_or(zone, |(region, _)| region)
}

/// Returns true when `family` is a valid image family name.
#[must_use]
pub fn is_valid_image_family(family: &str) -> bool {
    family.len() <= MAX_IMAGE_FAMILY_LENGTH
        && family.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
}

// ============================================================================
// SECTION: Serde Helpers
// ============================================================================

/// Duration serialization using humantime format.
mod humantime_serde {
    use std::time::Duration;

    use serde::Serializer;

    /// Serializes a duration as a humantime string such as `5m`.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
