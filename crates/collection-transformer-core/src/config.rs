//! Options for conversion and normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options for cross-generation conversion.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `input-version`,
/// `retain-ids`). This naming convention is part of the public API contract
/// for config files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConvertOptions {
    /// Declared generation of the input document (e.g. `"1.0.0"`).
    pub input_version: Option<String>,
    /// Requested generation of the output document (e.g. `"2.1.0"`).
    pub output_version: Option<String>,
    /// Keep existing identifiers instead of regenerating them.
    pub retain_ids: bool,
    /// Emit explicit `null` instead of omitting empty/absent optional fields.
    pub retain_empty_values: bool,
    /// When both legacy and modern representations of auth/events are
    /// present on an entity, prefer the modern shape.
    pub prioritize_v2: bool,
    /// Fallback values consulted when an entity defines none of its own.
    pub fallback: Fallback,
}

/// Fallback sources used when an entity is missing data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Fallback {
    /// Environment variable list (same item shape as collection variables)
    /// used when an entity defines no variables.
    pub env: Option<Value>,
}

/// Options for same-generation canonicalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NormalizeOptions {
    /// Generation of the document to canonicalize (only `"1.0.0"` is
    /// registered).
    pub normalize_version: Option<String>,
    /// Keep existing identifiers instead of regenerating them.
    pub retain_ids: bool,
    /// Emit explicit `null` instead of omitting empty/absent optional fields.
    pub retain_empty_values: bool,
    /// When both legacy and modern representations of auth/events are
    /// present on an entity, prefer the modern shape.
    pub prioritize_v2: bool,
    /// Only normalize values that some source data already justifies; never
    /// manufacture a field from nothing.
    pub no_defaults: bool,
    /// Fallback values consulted when an entity defines none of its own.
    pub fallback: Fallback,
}

/// Borrowed flag view shared by the converter and normalizer engines, so the
/// helper library does not need to know which options struct a call came
/// from. Exposed because the helper functions take it; not a stable contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct Policy<'a> {
    pub retain_ids: bool,
    pub retain_empty_values: bool,
    pub prioritize_v2: bool,
    pub no_defaults: bool,
    pub env: Option<&'a Value>,
}

impl ConvertOptions {
    pub(crate) fn policy(&self) -> Policy<'_> {
        Policy {
            retain_ids: self.retain_ids,
            retain_empty_values: self.retain_empty_values,
            prioritize_v2: self.prioritize_v2,
            no_defaults: false,
            env: self.fallback.env.as_ref(),
        }
    }
}

impl NormalizeOptions {
    pub(crate) fn policy(&self) -> Policy<'_> {
        Policy {
            retain_ids: self.retain_ids,
            retain_empty_values: self.retain_empty_values,
            prioritize_v2: self.prioritize_v2,
            no_defaults: self.no_defaults,
            env: self.fallback.env.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_options_serde_round_trip() {
        let opts = ConvertOptions {
            input_version: Some("1.0.0".to_string()),
            output_version: Some("2.1.0".to_string()),
            retain_ids: true,
            retain_empty_values: true,
            prioritize_v2: false,
            fallback: Fallback::default(),
        };

        let json = serde_json::to_string(&opts).unwrap();

        // Verify kebab-case field names are in the JSON
        assert!(json.contains("\"input-version\""));
        assert!(json.contains("\"retain-ids\""));

        let deserialized: ConvertOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.input_version.as_deref(), Some("1.0.0"));
        assert!(deserialized.retain_ids);
        assert!(deserialized.retain_empty_values);
    }

    #[test]
    fn test_normalize_options_default() {
        let opts = NormalizeOptions::default();
        assert!(opts.normalize_version.is_none());
        assert!(!opts.no_defaults);
        assert!(!opts.retain_empty_values);
    }
}
