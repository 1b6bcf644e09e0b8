//! Error types for collection transformation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing {field} in options")]
    MissingVersion { field: &'static str },

    #[error("unrecognized {field}: {value:?} is not a semantic version string")]
    InvalidVersion { field: &'static str, value: String },

    #[error("no converter registered for {input} -> {output}")]
    UnsupportedConversion { input: String, output: String },

    #[error("no normalizer registered for version {version}")]
    UnsupportedNormalization { version: String },

    #[error("malformed document: {message}")]
    MalformedDocument { message: String },
}
