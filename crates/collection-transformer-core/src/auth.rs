//! Auth conversion between legacy and current representations.
//!
//! Three representations are in play:
//! - legacy v1: `currentHelper` (helper name) + `helperAttributes` (flat
//!   parameter object, sometimes JSON-encoded as a string)
//! - map shape: `{type, [type]: {key: value}}` (v2.0 documents)
//! - array shape: `{type, [type]: [{key, value, type}]}` (v2.1 documents and
//!   the modern v1 `auth` field)
//!
//! All lookup tables are immutable module constants; conversions are pure
//! functions that tolerate absent input by returning `None`.

use serde_json::{json, Map, Value};

use crate::util::{get_str, is_truthy};

/// Registered auth scheme names.
pub const AUTH_TYPES: &[&str] = &[
    "apikey", "awsv4", "basic", "bearer", "digest", "hawk", "noauth", "ntlm", "oauth1", "oauth2",
];

// ---------------------------------------------------------------------------
// Helper-name table (legacy `currentHelper` ⇄ auth type)
// ---------------------------------------------------------------------------

const HELPER_TYPES: &[(&str, &str)] = &[
    ("apikeyAuth", "apikey"),
    ("awsSigV4", "awsv4"),
    ("basicAuth", "basic"),
    ("bearerAuth", "bearer"),
    ("digestAuth", "digest"),
    ("hawkAuth", "hawk"),
    ("ntlmAuth", "ntlm"),
    ("oAuth1", "oauth1"),
    ("oAuth2", "oauth2"),
];

pub fn helper_for_type(auth_type: &str) -> Option<&'static str> {
    HELPER_TYPES
        .iter()
        .find(|(_, t)| *t == auth_type)
        .map(|(helper, _)| *helper)
}

pub fn type_for_helper(helper: &str) -> Option<&'static str> {
    HELPER_TYPES
        .iter()
        .find(|(h, _)| *h == helper)
        .map(|(_, t)| *t)
}

// ---------------------------------------------------------------------------
// Per-scheme attribute renaming tables (legacy key, current key)
// ---------------------------------------------------------------------------

const APIKEY_ATTRS: &[(&str, &str)] = &[("key", "key"), ("value", "value"), ("in", "in")];

const AWSV4_ATTRS: &[(&str, &str)] = &[
    ("accessKey", "accessKey"),
    ("secretKey", "secretKey"),
    ("region", "region"),
    ("service", "service"),
    ("sessionToken", "sessionToken"),
];

const BASIC_ATTRS: &[(&str, &str)] = &[
    ("username", "username"),
    ("password", "password"),
    ("showPassword", "showPassword"),
];

const BEARER_ATTRS: &[(&str, &str)] = &[("token", "token")];

const DIGEST_ATTRS: &[(&str, &str)] = &[
    ("username", "username"),
    ("password", "password"),
    ("realm", "realm"),
    ("nonce", "nonce"),
    ("nonceCount", "nonceCount"),
    ("algorithm", "algorithm"),
    ("qop", "qop"),
    ("clientNonce", "clientNonce"),
    ("opaque", "opaque"),
    ("disableRetryRequest", "disableRetryRequest"),
];

const HAWK_ATTRS: &[(&str, &str)] = &[
    ("hawk_id", "authId"),
    ("hawk_key", "authKey"),
    ("algorithm", "algorithm"),
    ("user", "user"),
    ("nonce", "nonce"),
    ("ext", "extraData"),
    ("app", "appId"),
    ("dlg", "delegation"),
    ("timestamp", "timestamp"),
];

const NTLM_ATTRS: &[(&str, &str)] = &[
    ("username", "username"),
    ("password", "password"),
    ("domain", "domain"),
    ("workstation", "workstation"),
    ("disableRetryRequest", "disableRetryRequest"),
];

const OAUTH1_ATTRS: &[(&str, &str)] = &[
    ("consumerKey", "consumerKey"),
    ("consumerSecret", "consumerSecret"),
    ("token", "token"),
    ("tokenSecret", "tokenSecret"),
    ("signatureMethod", "signatureMethod"),
    ("timestamp", "timestamp"),
    ("nonce", "nonce"),
    ("version", "version"),
    ("realm", "realm"),
    ("header", "addParamsToHeader"),
    ("auto", "autoAddParam"),
    ("includeEmptyParamsInSignature", "addEmptyParamsToSign"),
];

const OAUTH2_ATTRS: &[(&str, &str)] = &[
    ("accessToken", "accessToken"),
    ("addTokenTo", "addTokenTo"),
    ("callBackUrl", "callBackUrl"),
    ("authUrl", "authUrl"),
    ("accessTokenUrl", "accessTokenUrl"),
    ("clientId", "clientId"),
    ("clientSecret", "clientSecret"),
    ("scope", "scope"),
    ("requestAccessTokenLocally", "requestAccessTokenLocally"),
];

const ATTR_MAPS: &[(&str, &[(&str, &str)])] = &[
    ("apikey", APIKEY_ATTRS),
    ("awsv4", AWSV4_ATTRS),
    ("basic", BASIC_ATTRS),
    ("bearer", BEARER_ATTRS),
    ("digest", DIGEST_ATTRS),
    ("hawk", HAWK_ATTRS),
    ("ntlm", NTLM_ATTRS),
    ("oauth1", OAUTH1_ATTRS),
    ("oauth2", OAUTH2_ATTRS),
];

fn attr_map(auth_type: &str) -> Option<&'static [(&'static str, &'static str)]> {
    ATTR_MAPS
        .iter()
        .find(|(t, _)| *t == auth_type)
        .map(|(_, m)| *m)
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Shared gate applied before any auth conversion.
///
/// - `Some(null)` — an explicit no-auth-override marker, passed through.
/// - `None` — no auth data: the field is absent, falsy, or has no `type`.
/// - `noauth` collapses to `Some(null)` under `exclude_noauth`, otherwise
///   to a bare `{type: "noauth"}`.
/// - Anything else passes through cloned.
pub fn clean_auth(auth: Option<&Value>, exclude_noauth: bool) -> Option<Value> {
    match auth {
        Some(Value::Null) => Some(Value::Null),
        Some(auth) if is_truthy(auth) => {
            let auth_type = auth.get("type").and_then(Value::as_str)?;
            if auth_type == "noauth" {
                if exclude_noauth {
                    Some(Value::Null)
                } else {
                    Some(json!({ "type": "noauth" }))
                }
            } else {
                Some(auth.clone())
            }
        }
        _ => None,
    }
}

/// Parameter type inference: a declared `'text'` normalizes to `'string'`;
/// otherwise the type comes from the value's runtime kind.
fn param_type(declared: Option<&str>, value: &Value) -> &'static str {
    if declared == Some("text") {
        return "string";
    }
    match value {
        Value::String(_) => "string",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        _ => "any",
    }
}

// ---------------------------------------------------------------------------
// Map shape ⇄ array shape
// ---------------------------------------------------------------------------

/// Normalize an auth value to the array shape
/// (`{type, [type]: [{key, value, type}]}`). Tolerates input already in
/// array shape.
pub fn auth_map_to_array(auth: Option<&Value>, exclude_noauth: bool) -> Option<Value> {
    let cleaned = clean_auth(auth, exclude_noauth)?;
    if cleaned.is_null() {
        return Some(cleaned);
    }
    // type presence is guaranteed by the gate
    let auth_type = cleaned.get("type").and_then(Value::as_str)?.to_string();

    let mut out = Map::new();
    out.insert("type".to_string(), Value::String(auth_type.clone()));
    match cleaned.get(&auth_type) {
        Some(Value::Object(params)) => {
            let array: Vec<Value> = params
                .iter()
                .map(|(key, value)| {
                    json!({ "key": key, "value": value, "type": param_type(None, value) })
                })
                .collect();
            out.insert(auth_type, Value::Array(array));
        }
        Some(Value::Array(params)) => {
            // already array-shaped — re-infer parameter types
            let array: Vec<Value> = params
                .iter()
                .filter_map(|param| {
                    let key = param.get("key").and_then(Value::as_str)?;
                    let value = param.get("value").cloned().unwrap_or(Value::Null);
                    let declared = param.get("type").and_then(Value::as_str);
                    let inferred = param_type(declared, &value);
                    Some(json!({ "key": key, "value": value, "type": inferred }))
                })
                .collect();
            out.insert(auth_type, Value::Array(array));
        }
        _ => {}
    }
    Some(Value::Object(out))
}

/// Normalize an auth value to the map shape (`{type, [type]: {key: value}}`).
/// Tolerates input already in map shape.
pub fn auth_array_to_map(auth: Option<&Value>, exclude_noauth: bool) -> Option<Value> {
    let cleaned = clean_auth(auth, exclude_noauth)?;
    if cleaned.is_null() {
        return Some(cleaned);
    }
    let auth_type = cleaned.get("type").and_then(Value::as_str)?.to_string();

    let mut out = Map::new();
    out.insert("type".to_string(), Value::String(auth_type.clone()));
    match cleaned.get(&auth_type) {
        Some(Value::Array(params)) => {
            let mut map = Map::new();
            for param in params {
                if let Some(key) = param.get("key").and_then(Value::as_str) {
                    map.insert(
                        key.to_string(),
                        param.get("value").cloned().unwrap_or(Value::Null),
                    );
                }
            }
            out.insert(auth_type, Value::Object(map));
        }
        Some(Value::Object(map)) => {
            out.insert(auth_type, Value::Object(map.clone()));
        }
        _ => {}
    }
    Some(Value::Object(out))
}

// ---------------------------------------------------------------------------
// Legacy helper pair ⇄ modern auth
// ---------------------------------------------------------------------------

/// Legacy `helperAttributes` may arrive JSON-encoded as a string; a string
/// that fails to parse means "no auth data", not a hard failure.
pub fn coerce_helper_attributes(value: &Value) -> Option<Value> {
    match value {
        Value::Object(_) => Some(value.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(parsed @ Value::Object(_)) => Some(parsed),
            _ => {
                tracing::warn!("discarding helperAttributes string that failed to parse as JSON");
                None
            }
        },
        _ => None,
    }
}

/// Rename legacy flat helper attributes into current parameter names.
/// Unknown schemes and non-object input yield `None`.
pub fn legacy_attrs_to_current(auth_type: &str, attrs: &Value) -> Option<Value> {
    let table = attr_map(auth_type)?;
    let attrs = attrs.as_object()?;
    let mut out = Map::new();
    for (legacy, current) in table {
        if let Some(value) = attrs.get(*legacy) {
            out.insert((*current).to_string(), value.clone());
        }
    }
    Some(Value::Object(out))
}

/// Rename current parameters (map or array shape) back into the legacy flat
/// attribute names.
pub fn current_to_legacy_attrs(auth_type: &str, params: &Value) -> Option<Value> {
    let table = attr_map(auth_type)?;
    let params: Map<String, Value> = match params {
        Value::Object(map) => map.clone(),
        Value::Array(list) => {
            let mut map = Map::new();
            for param in list {
                if let Some(key) = param.get("key").and_then(Value::as_str) {
                    map.insert(
                        key.to_string(),
                        param.get("value").cloned().unwrap_or(Value::Null),
                    );
                }
            }
            map
        }
        _ => return None,
    };
    let mut out = Map::new();
    for (legacy, current) in table {
        if let Some(value) = params.get(*current) {
            out.insert((*legacy).to_string(), value.clone());
        }
    }
    Some(Value::Object(out))
}

/// Interpret an entity's legacy `currentHelper`/`helperAttributes` pair as a
/// current-shape (map form) auth object. `normal` means "explicitly no
/// auth"; unknown helper names yield `None`.
pub fn auth_from_legacy(entity: &Value) -> Option<Value> {
    let helper = get_str(entity, "currentHelper")?;
    if helper == "normal" {
        return Some(json!({ "type": "noauth" }));
    }
    let auth_type = type_for_helper(helper)?;
    let mut out = Map::new();
    out.insert("type".to_string(), Value::String(auth_type.to_string()));
    if let Some(attrs) = entity
        .get("helperAttributes")
        .and_then(coerce_helper_attributes)
    {
        if let Some(params) = legacy_attrs_to_current(auth_type, &attrs) {
            out.insert(auth_type.to_string(), params);
        }
    }
    Some(Value::Object(out))
}

/// Decompose a modern auth object into the legacy pair:
/// `(currentHelper, helperAttributes)`. `noauth` maps to `normal` with no
/// attributes.
pub fn auth_to_legacy(auth: &Value) -> Option<(String, Option<Value>)> {
    let auth_type = auth.get("type").and_then(Value::as_str)?;
    if auth_type == "noauth" {
        return Some(("normal".to_string(), None));
    }
    let helper = helper_for_type(auth_type)?;
    let attrs = auth
        .get(auth_type)
        .and_then(|params| current_to_legacy_attrs(auth_type, params));
    Some((helper.to_string(), attrs))
}

// ===========================================================================
// Tests
// ===========================================================================
