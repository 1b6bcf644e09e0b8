//! Directional converter engines.
//!
//! Each direction is one builder set; the v2.1 variants are not separate
//! engines but a [`Variant`] tag threaded through the shared builders —
//! v2.1 differs from v2.0 only in its schema URL, structured request URLs,
//! and array-shaped auth parameters.

pub(crate) mod v1_to_v2;
pub(crate) mod v2_to_v1;

use crate::version::{V21_SCHEMA_URL, V2_SCHEMA_URL};

/// Output-generation tag for the v2 family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    V2,
    V21,
}

impl Variant {
    pub(crate) fn schema_url(&self) -> &'static str {
        match self {
            Variant::V2 => V2_SCHEMA_URL,
            Variant::V21 => V21_SCHEMA_URL,
        }
    }
}

/// Body mode vocabulary mapping: (v1 `dataMode`, v2 `body.mode`). The two
/// vocabularies map bijectively.
const BODY_MODES: &[(&str, &str)] = &[
    ("params", "formdata"),
    ("urlencoded", "urlencoded"),
    ("raw", "raw"),
    ("binary", "file"),
    ("graphql", "graphql"),
];

pub(crate) fn v2_mode_for(v1_mode: &str) -> Option<&'static str> {
    BODY_MODES
        .iter()
        .find(|(v1, _)| *v1 == v1_mode)
        .map(|(_, v2)| *v2)
}

pub(crate) fn v1_mode_for(v2_mode: &str) -> Option<&'static str> {
    BODY_MODES
        .iter()
        .find(|(_, v2)| *v2 == v2_mode)
        .map(|(v1, _)| *v1)
}
