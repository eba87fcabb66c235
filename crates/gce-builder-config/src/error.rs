// crates/gce-builder-config/src/error.rs
// ============================================================================
// Module: Configuration Errors
// Description: Validation error taxonomy and the aggregated error value.
// Purpose: Report every independent configuration problem from one call.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Each [`ValidationError`] names the field (or key) it concerns. A validation
//! call collects them in stage order into a [`ValidationErrors`] value whose
//! textual form lists one entry per violation. [`LoadError`] covers reading raw
//! layers from disk and is reported separately.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Validation Errors
// ============================================================================

/// A single configuration violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Key is not part of the recognized key set.
    #[error("unknown configuration key: {key}")]
    UnknownKey {
        /// Offending key as supplied.
        key: String,
    },
    /// Value is present but has the wrong shape for its field.
    #[error("{field}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Field name.
        field: &'static str,
        /// Description of the accepted shape.
        expected: &'static str,
        /// Shape of the supplied value.
        found: &'static str,
    },
    /// Required field is absent or empty after defaulting.
    #[error("{field} must be specified")]
    RequiredFieldMissing {
        /// Field name.
        field: &'static str,
    },
    /// Value is outside the field's allowed literal set.
    #[error("{field} must be one of [{}], got {value:?}", .allowed.join(", "))]
    InvalidEnumValue {
        /// Field name.
        field: &'static str,
        /// Supplied value.
        value: String,
        /// Allowed literals.
        allowed: &'static [&'static str],
    },
    /// Value fails a pattern, charset, range, or duration-grammar check.
    #[error("{field} has invalid value {value:?}: {reason}")]
    InvalidFormat {
        /// Field name.
        field: &'static str,
        /// Supplied value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// Jointly constrained fields violate their rule.
    #[error("{rule} ({})", render_pairs(.involved))]
    CrossFieldConstraint {
        /// Description of the violated rule.
        rule: &'static str,
        /// Involved `(key, value)` pairs in caller-supplied order.
        involved: Vec<(String, String)>,
    },
    /// Referenced local file does not exist.
    #[error("{field}: file {path} does not exist")]
    FileNotFound {
        /// Field name.
        field: &'static str,
        /// Path that was checked.
        path: String,
    },
}

impl ValidationError {
    /// Returns the field or key this error concerns.
    ///
    /// Cross-field errors report the first involved key.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::UnknownKey {
                key,
            } => key.as_str(),
            Self::TypeMismatch {
                field, ..
            }
            | Self::RequiredFieldMissing {
                field,
            }
            | Self::InvalidEnumValue {
                field, ..
            }
            | Self::InvalidFormat {
                field, ..
            }
            | Self::FileNotFound {
                field, ..
            } => *field,
            Self::CrossFieldConstraint {
                involved, ..
            } => involved.first().map_or("", |(key, _)| key.as_str()),
        }
    }

    /// Returns the `key:value, key:value` listing for cross-field errors.
    #[must_use]
    pub fn involved_pairs(&self) -> Option<String> {
        match self {
            Self::CrossFieldConstraint {
                involved, ..
            } => Some(render_pairs(involved)),
            _ => None,
        }
    }
}

/// Joins involved pairs as `key:value` entries separated by `", "`.
fn render_pairs(involved: &[(String, String)]) -> String {
    involved.iter().map(|(key, value)| format!("{key}:{value}")).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// SECTION: Aggregated Errors
// ============================================================================

/// Every violation found by a single validation call, in stage order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_errors(.errors))]
pub struct ValidationErrors {
    /// Collected violations.
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Wraps a non-empty list of violations.
    pub(crate) const fn new(errors: Vec<ValidationError>) -> Self {
        Self {
            errors,
        }
    }

    /// Returns the collected violations.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Returns the number of collected violations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true when no violations were collected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true when any violation concerns `field`.
    #[must_use]
    pub fn mentions(&self, field: &str) -> bool {
        self.errors.iter().any(|error| {
            error.field() == field
                || matches!(
                    error,
                    ValidationError::CrossFieldConstraint { involved, .. }
                        if involved.iter().any(|(key, _)| key == field)
                )
        })
    }
}

/// Renders the count line followed by one bullet per violation.
fn render_errors(errors: &[ValidationError]) -> String {
    let mut rendered = format!("{} error(s) occurred:", errors.len());
    for error in errors {
        rendered.push_str("\n* ");
        rendered.push_str(&error.to_string());
    }
    rendered
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

// ============================================================================
// SECTION: Load Errors
// ============================================================================

/// Errors raised while reading raw configuration layers from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML or JSON parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// File is readable but unusable as a raw layer.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
