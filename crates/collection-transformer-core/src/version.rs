//! Schema generation identifiers and exact-version dispatch.
//!
//! Engines are selected by exact semantic-version match: a version string
//! must be a well-formed `major.minor.patch` triple, and the triple must name
//! a registered generation. The two failure modes are reported separately so
//! callers can distinguish a typo from an unsupported generation.

use crate::error::TransformError;

/// Schema URL embedded in converted v2.0.0 documents.
pub const V2_SCHEMA_URL: &str =
    "https://schema.getpostman.com/json/collection/v2.0.0/collection.json";

/// Schema URL embedded in converted v2.1.0 documents.
pub const V21_SCHEMA_URL: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// A registered document generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    V1,
    V2,
    V21,
}

impl SchemaVersion {
    /// Look up a registered generation by its exact version string.
    pub fn lookup(s: &str) -> Option<Self> {
        match s {
            "1.0.0" => Some(SchemaVersion::V1),
            "2.0.0" => Some(SchemaVersion::V2),
            "2.1.0" => Some(SchemaVersion::V21),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1 => "1.0.0",
            SchemaVersion::V2 => "2.0.0",
            SchemaVersion::V21 => "2.1.0",
        }
    }
}

/// Check that a string is a plausible `major.minor.patch` semantic version.
fn is_semver(s: &str) -> bool {
    let mut parts = 0;
    for part in s.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        parts += 1;
    }
    parts == 3
}

/// Validate a version string from an options field.
///
/// Returns the string itself on success so the caller can thread it into a
/// pair-lookup error without re-borrowing the options.
pub(crate) fn require_semver<'a>(
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, TransformError> {
    let value = value.ok_or(TransformError::MissingVersion { field })?;
    if !is_semver(value) {
        return Err(TransformError::InvalidVersion {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_exact_match_only() {
        assert_eq!(SchemaVersion::lookup("1.0.0"), Some(SchemaVersion::V1));
        assert_eq!(SchemaVersion::lookup("2.0.0"), Some(SchemaVersion::V2));
        assert_eq!(SchemaVersion::lookup("2.1.0"), Some(SchemaVersion::V21));
        assert_eq!(SchemaVersion::lookup("2.1"), None);
        assert_eq!(SchemaVersion::lookup("v2.1.0"), None);
        assert_eq!(SchemaVersion::lookup("3.0.0"), None);
    }

    #[test]
    fn test_is_semver() {
        assert!(is_semver("1.0.0"));
        assert!(is_semver("10.20.30"));
        assert!(!is_semver("1.0"));
        assert!(!is_semver("1.0.0-beta"));
        assert!(!is_semver(""));
        assert!(!is_semver("a.b.c"));
    }

    #[test]
    fn test_require_semver_missing() {
        let err = require_semver("input-version", None).unwrap_err();
        assert!(matches!(err, TransformError::MissingVersion { .. }));
    }

    #[test]
    fn test_require_semver_invalid() {
        let err = require_semver("output-version", Some("latest")).unwrap_err();
        match err {
            TransformError::InvalidVersion { field, value } => {
                assert_eq!(field, "output-version");
                assert_eq!(value, "latest");
            }
            other => panic!("expected InvalidVersion, got: {:?}", other),
        }
    }

    #[test]
    fn test_require_semver_valid_but_unregistered() {
        // A well-formed version that names no generation passes validation;
        // pair lookup rejects it later.
        let v = require_semver("input-version", Some("3.0.0")).unwrap();
        assert_eq!(v, "3.0.0");
        assert_eq!(SchemaVersion::lookup(v), None);
    }
}
