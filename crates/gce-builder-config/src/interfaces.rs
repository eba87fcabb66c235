// crates/gce-builder-config/src/interfaces.rs
// ============================================================================
// Module: Validator Collaborators
// Description: Contracts the validator needs from its environment.
// Purpose: Keep filesystem, clock, and communicator defaults swappable.
// Dependencies: time
// ============================================================================

//! ## Overview
//! The validator touches its environment through three narrow traits: a
//! synchronous path-existence predicate, a timestamp token resolver, and a
//! provider of communicator defaults. The local implementations here are the
//! ones used by [`crate::new_config`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::time::Duration;

use time::OffsetDateTime;

use crate::config::CommunicatorKind;
use crate::config::DEFAULT_SSH_PORT;
use crate::config::DEFAULT_SSH_TIMEOUT;

// ============================================================================
// SECTION: Filesystem
// ============================================================================

/// Synchronous path-existence predicate.
pub trait PathProbe: Send + Sync {
    /// Returns true when `path` exists.
    fn exists(&self, path: &Path) -> bool;
}

/// [`PathProbe`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl PathProbe for LocalFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.try_exists().unwrap_or(false)
    }
}

// ============================================================================
// SECTION: Timestamps
// ============================================================================

/// Resolves "now" into the token substituted for `{{timestamp}}`.
pub trait TimestampSource: Send + Sync {
    /// Returns the resolved timestamp token.
    fn timestamp_token(&self) -> String;
}

/// [`TimestampSource`] yielding the current unix time in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimestampSource for SystemClock {
    fn timestamp_token(&self) -> String {
        OffsetDateTime::now_utc().unix_timestamp().to_string()
    }
}

// ============================================================================
// SECTION: Communicator Defaults
// ============================================================================

/// Supplies defaults for the communicator sub-configuration.
pub trait CommunicatorDefaults: Send + Sync {
    /// Default communicator type.
    fn kind(&self) -> CommunicatorKind;
    /// Default SSH port.
    fn ssh_port(&self) -> u16;
    /// Default SSH connect timeout.
    fn ssh_timeout(&self) -> Duration;
}

/// Communicator defaults for SSH on port 22.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshCommunicatorDefaults;

impl CommunicatorDefaults for SshCommunicatorDefaults {
    fn kind(&self) -> CommunicatorKind {
        CommunicatorKind::Ssh
    }

    fn ssh_port(&self) -> u16 {
        DEFAULT_SSH_PORT
    }

    fn ssh_timeout(&self) -> Duration {
        DEFAULT_SSH_TIMEOUT
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_token_is_numeric() {
        let token = SystemClock.timestamp_token();
        assert!(!token.is_empty());
        assert!(token.chars().all(|ch| ch.is_ascii_digit()));
    }

    #[test]
    fn local_filesystem_reports_missing_paths() {
        assert!(!LocalFilesystem.exists(Path::new("/tmp/i/should/not/exist")));
    }
}
