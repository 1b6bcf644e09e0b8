//! Convert API collection documents between schema generations (v1.0.0,
//! v2.0.0, v2.1.0) and canonicalize v1 documents.
//!
//! Documents are untyped [`serde_json::Value`] trees: real collections are
//! deeply nested, partially legacy, and partially modern, and the engine's
//! job is to heal and translate them, not to reject them. Engines are
//! selected by exact semantic-version match on the options.
//!
//! Every entry point comes in two calling conventions: a `Result`-returning
//! pure function (the primitive) and a `*_with_callback` adapter that hands
//! the same `Result` to a callback, synchronously, for callers structured
//! around continuation style.
//!
//! ## Usage
//!
//! ```rust
//! use collection_transformer_core::{convert, ConvertOptions};
//! use serde_json::json;
//!
//! let collection = json!({
//!     "id": "c-1",
//!     "name": "Demo",
//!     "order": ["r-1"],
//!     "requests": [{ "id": "r-1", "name": "One", "method": "GET", "url": "http://example.com" }]
//! });
//! let options = ConvertOptions {
//!     input_version: Some("1.0.0".to_string()),
//!     output_version: Some("2.1.0".to_string()),
//!     retain_ids: true,
//!     ..ConvertOptions::default()
//! };
//! let converted = convert(&collection, &options).unwrap();
//! assert_eq!(converted["info"]["_postman_id"], "c-1");
//! assert_eq!(converted["item"][0]["name"], "One");
//! ```
//!
//! The URL grammar ([`url`]) and field helpers ([`util`], [`auth`]) are
//! exposed for direct reuse by external collaborators (schema validators,
//! corpus test suites) but are not a stable wire contract.

pub mod auth;
pub mod config;
pub mod error;
pub mod uid;
pub mod url;
pub mod util;
pub mod version;

mod converters;
mod normalizers;

use serde_json::Value;

pub use config::{ConvertOptions, Fallback, NormalizeOptions};
pub use error::TransformError;
pub use version::{SchemaVersion, V21_SCHEMA_URL, V2_SCHEMA_URL};

use converters::Variant;
use util::{get_truthy, is_truthy};
use version::require_semver;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

enum Route {
    Forward(Variant),
    Reverse(Variant),
}

/// Resolve the converter for the declared (input, output) pair. Version
/// errors are never silent: a missing or malformed version string and an
/// unregistered pair are reported as distinct errors.
fn route(options: &ConvertOptions) -> Result<Route, TransformError> {
    let input = require_semver("input-version", options.input_version.as_deref())?;
    let output = require_semver("output-version", options.output_version.as_deref())?;
    let pair = (
        SchemaVersion::lookup(input),
        SchemaVersion::lookup(output),
    );
    match pair {
        (Some(SchemaVersion::V1), Some(SchemaVersion::V2)) => Ok(Route::Forward(Variant::V2)),
        (Some(SchemaVersion::V1), Some(SchemaVersion::V21)) => Ok(Route::Forward(Variant::V21)),
        (Some(SchemaVersion::V2), Some(SchemaVersion::V1)) => Ok(Route::Reverse(Variant::V2)),
        (Some(SchemaVersion::V21), Some(SchemaVersion::V1)) => Ok(Route::Reverse(Variant::V21)),
        _ => Err(TransformError::UnsupportedConversion {
            input: input.to_string(),
            output: output.to_string(),
        }),
    }
}

fn normalizer_version(options: &NormalizeOptions) -> Result<(), TransformError> {
    let version = require_semver("normalize-version", options.normalize_version.as_deref())?;
    match SchemaVersion::lookup(version) {
        Some(SchemaVersion::V1) => Ok(()),
        _ => Err(TransformError::UnsupportedNormalization {
            version: version.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Convert a whole collection between generations.
pub fn convert(collection: &Value, options: &ConvertOptions) -> Result<Value, TransformError> {
    match route(options)? {
        Route::Forward(variant) => {
            converters::v1_to_v2::convert_collection(collection, variant, options)
        }
        Route::Reverse(variant) => {
            converters::v2_to_v1::convert_collection(collection, variant, options)
        }
    }
}

/// Convert a single request (v1) or item (v2) between generations.
pub fn convert_single(object: &Value, options: &ConvertOptions) -> Result<Value, TransformError> {
    match route(options)? {
        Route::Forward(variant) => converters::v1_to_v2::convert_single(object, variant, options),
        Route::Reverse(variant) => converters::v2_to_v1::convert_single(object, variant, options),
    }
}

/// Convert a single saved response between generations.
pub fn convert_response(object: &Value, options: &ConvertOptions) -> Result<Value, TransformError> {
    match route(options)? {
        Route::Forward(variant) => {
            converters::v1_to_v2::convert_response(object, variant, options)
        }
        Route::Reverse(variant) => {
            converters::v2_to_v1::convert_response(object, variant, options)
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Canonicalize a collection within its own generation.
pub fn normalize(collection: &Value, options: &NormalizeOptions) -> Result<Value, TransformError> {
    normalizer_version(options)?;
    normalizers::v1::normalize_collection(collection, options)
}

/// Canonicalize a single request.
pub fn normalize_single(
    request: &Value,
    options: &NormalizeOptions,
) -> Result<Value, TransformError> {
    normalizer_version(options)?;
    normalizers::v1::normalize_single(request, options)
}

/// Canonicalize a single saved response.
pub fn normalize_response(
    response: &Value,
    options: &NormalizeOptions,
) -> Result<Value, TransformError> {
    normalizer_version(options)?;
    normalizers::v1::normalize_response(response, options)
}

/// [`normalize`], editing through an exclusive borrow instead of returning a
/// new tree — the opt-in fast path for callers that own large documents.
pub fn normalize_in_place(
    collection: &mut Value,
    options: &NormalizeOptions,
) -> Result<(), TransformError> {
    normalizer_version(options)?;
    normalizers::v1::normalize_collection_in_place(collection, options)
}

/// [`normalize_single`], editing through an exclusive borrow.
pub fn normalize_single_in_place(
    request: &mut Value,
    options: &NormalizeOptions,
) -> Result<(), TransformError> {
    normalizer_version(options)?;
    normalizers::v1::normalize_single_in_place(request, options)
}

/// [`normalize_response`], editing through an exclusive borrow.
pub fn normalize_response_in_place(
    response: &mut Value,
    options: &NormalizeOptions,
) -> Result<(), TransformError> {
    normalizer_version(options)?;
    normalizers::v1::normalize_response_in_place(response, options)
}

// ---------------------------------------------------------------------------
// Callback adapters
// ---------------------------------------------------------------------------
//
// Compatibility shims for continuation-style callers. The callback is
// invoked synchronously, before the adapter returns; no work is deferred.

pub fn convert_with_callback<F>(collection: &Value, options: &ConvertOptions, callback: F)
where
    F: FnOnce(Result<Value, TransformError>),
{
    callback(convert(collection, options));
}

pub fn convert_single_with_callback<F>(object: &Value, options: &ConvertOptions, callback: F)
where
    F: FnOnce(Result<Value, TransformError>),
{
    callback(convert_single(object, options));
}

pub fn convert_response_with_callback<F>(object: &Value, options: &ConvertOptions, callback: F)
where
    F: FnOnce(Result<Value, TransformError>),
{
    callback(convert_response(object, options));
}

pub fn normalize_with_callback<F>(collection: &Value, options: &NormalizeOptions, callback: F)
where
    F: FnOnce(Result<Value, TransformError>),
{
    callback(normalize(collection, options));
}

pub fn normalize_single_with_callback<F>(request: &Value, options: &NormalizeOptions, callback: F)
where
    F: FnOnce(Result<Value, TransformError>),
{
    callback(normalize_single(request, options));
}

pub fn normalize_response_with_callback<F>(
    response: &Value,
    options: &NormalizeOptions,
    callback: F,
) where
    F: FnOnce(Result<Value, TransformError>),
{
    callback(normalize_response(response, options));
}

// ---------------------------------------------------------------------------
// Shape sniffers
// ---------------------------------------------------------------------------

/// True when the object looks like a v1 collection: truthy `name`, `order`,
/// and `requests`.
pub fn is_v1(value: &Value) -> bool {
    get_truthy(value, "name").is_some()
        && get_truthy(value, "order").is_some()
        && get_truthy(value, "requests").is_some()
}

/// True when the object looks like a v2-family collection: truthy
/// `info.schema`.
pub fn is_v2(value: &Value) -> bool {
    value
        .get("info")
        .and_then(|info| info.get("schema"))
        .is_some_and(is_truthy)
}

// ===========================================================================
// Tests
// ===========================================================================
