//! v1 canonicalization.
//!
//! A same-generation pass that converges partially-legacy v1 documents onto
//! one complete, predictable shape: the auth trio (`auth`, `currentHelper`,
//! `helperAttributes`) and the script trio (`events`, `tests`,
//! `preRequestScript`) are reconciled under a "legacy is source of truth
//! unless told otherwise" rule, raw header strings gain their parsed
//! `headerData` counterpart, and known legacy data corruptions are guarded.
//!
//! With `no_defaults` set, a value is only normalized when some source data
//! already justifies it — nothing is manufactured from thin air. Otherwise
//! absent auth/events resolve to explicit `null` placeholders so every
//! request carries the full field set.
//!
//! The in-place functions are the primitives; the pure entry points clone
//! and delegate, so callers choose between owned-in/owned-out (safe default)
//! and exclusive-borrow editing (opt-in fast path).

use serde_json::{Map, Value};

use crate::auth::{
    auth_from_legacy, auth_map_to_array, auth_to_legacy, clean_auth, coerce_helper_attributes,
};
use crate::config::{NormalizeOptions, Policy};
use crate::error::TransformError;
use crate::uid::uid;
use crate::util::{
    aggregate_script, build_header_string, clean_empty_value, events_from_legacy, get_str,
    get_truthy, handle_vars, is_truthy, parse_header_string, LegacyKind, not_legacy, VarModifiers,
};

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub(crate) fn normalize_collection(
    collection: &Value,
    options: &NormalizeOptions,
) -> Result<Value, TransformError> {
    let mut out = collection.clone();
    normalize_collection_in_place(&mut out, options)?;
    Ok(out)
}

pub(crate) fn normalize_single(
    request: &Value,
    options: &NormalizeOptions,
) -> Result<Value, TransformError> {
    let mut out = request.clone();
    normalize_single_in_place(&mut out, options)?;
    Ok(out)
}

pub(crate) fn normalize_response(
    response: &Value,
    options: &NormalizeOptions,
) -> Result<Value, TransformError> {
    let mut out = response.clone();
    normalize_response_in_place(&mut out, options)?;
    Ok(out)
}

pub(crate) fn normalize_collection_in_place(
    collection: &mut Value,
    options: &NormalizeOptions,
) -> Result<(), TransformError> {
    let policy = options.policy();
    let Some(obj) = collection.as_object_mut() else {
        return Err(TransformError::MalformedDocument {
            message: "collection root must be a JSON object".to_string(),
        });
    };

    fill_id(obj, &policy);
    clean_empty_value(obj, "description", policy.retain_empty_values);
    normalize_plain_auth(obj, &policy);
    normalize_order_lists(obj, &policy);
    normalize_variables(obj, &policy);

    if let Some(folders) = obj.get_mut("folders").and_then(Value::as_array_mut) {
        for folder in folders {
            if let Some(folder) = folder.as_object_mut() {
                normalize_folder(folder, &policy);
            }
        }
    }
    if let Some(requests) = obj.get_mut("requests").and_then(Value::as_array_mut) {
        for request in requests {
            if let Some(request) = request.as_object_mut() {
                normalize_request(request, &policy);
            }
        }
    }

    Ok(())
}

pub(crate) fn normalize_single_in_place(
    request: &mut Value,
    options: &NormalizeOptions,
) -> Result<(), TransformError> {
    let policy = options.policy();
    let Some(obj) = request.as_object_mut() else {
        return Err(TransformError::MalformedDocument {
            message: "request must be a JSON object".to_string(),
        });
    };
    normalize_request(obj, &policy);
    Ok(())
}

pub(crate) fn normalize_response_in_place(
    response: &mut Value,
    options: &NormalizeOptions,
) -> Result<(), TransformError> {
    let policy = options.policy();
    let Some(obj) = response.as_object_mut() else {
        return Err(TransformError::MalformedDocument {
            message: "response must be a JSON object".to_string(),
        });
    };
    fill_id(obj, &policy);
    Ok(())
}

// ---------------------------------------------------------------------------
// Entity passes
// ---------------------------------------------------------------------------

/// Existing identifiers are never rewritten here — order lists reference
/// them, and rewriting one without the other corrupts the linkage (the
/// documented limitation of identifier regeneration). Missing ones are
/// filled in unless `no_defaults` forbids manufacturing.
fn fill_id(entity: &mut Map<String, Value>, policy: &Policy<'_>) {
    let present = entity
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty());
    if !present && !policy.no_defaults {
        entity.insert("id".to_string(), Value::String(uid()));
    }
}

fn normalize_folder(folder: &mut Map<String, Value>, policy: &Policy<'_>) {
    fill_id(folder, policy);
    clean_empty_value(folder, "description", policy.retain_empty_values);
    normalize_plain_auth(folder, policy);
    normalize_order_lists(folder, policy);
    normalize_variables(folder, policy);
}

fn normalize_request(request: &mut Map<String, Value>, policy: &Policy<'_>) {
    fill_id(request, policy);
    clean_empty_value(request, "description", policy.retain_empty_values);
    normalize_headers(request, policy);
    normalize_body_data(request);
    normalize_path_variables(request, policy);
    normalize_auth_trio(request, policy);
    normalize_events_trio(request, policy);
    normalize_variables(request, policy);

    if let Some(responses) = request.get_mut("responses").and_then(Value::as_array_mut) {
        for response in responses {
            if let Some(response) = response.as_object_mut() {
                fill_id(response, policy);
            }
        }
    }
}

/// Ensure `order`/`folders_order` are arrays; absent lists default to empty
/// under the defaulting mode.
fn normalize_order_lists(entity: &mut Map<String, Value>, policy: &Policy<'_>) {
    for field in ["order", "folders_order"] {
        match entity.get(field) {
            Some(Value::Array(_)) => {}
            Some(_) | None if policy.no_defaults => {}
            _ => {
                entity.insert(field.to_string(), Value::Array(Vec::new()));
            }
        }
    }
}

fn normalize_variables(entity: &mut Map<String, Value>, policy: &Policy<'_>) {
    let snapshot = Value::Object(entity.clone());
    if entity.get("variables").is_some() {
        if let Some(variables) = handle_vars(&snapshot, policy, &VarModifiers::default()) {
            entity.insert("variables".to_string(), variables);
        } else {
            entity.remove("variables");
        }
    }
}

/// Collections and folders carry only the modern `auth` field — no legacy
/// helper pair — so their normalization is the plain shape/default rule.
fn normalize_plain_auth(entity: &mut Map<String, Value>, policy: &Policy<'_>) {
    match entity.get("auth") {
        Some(Value::Null) => {}
        Some(auth) if is_truthy(auth) => {
            if let Some(normalized) = auth_map_to_array(Some(&auth.clone()), false) {
                entity.insert("auth".to_string(), normalized);
            } else {
                // auth without a usable type — treated as no auth data
                entity.remove("auth");
                if !policy.no_defaults {
                    entity.insert("auth".to_string(), Value::Null);
                }
            }
        }
        _ if policy.no_defaults => {}
        _ => {
            entity.insert("auth".to_string(), Value::Null);
        }
    }
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// A raw `headers` string is authoritative: `headerData` is rebuilt from it.
/// Without one, an existing `headerData` list regenerates the raw string.
/// Neither is manufactured when both are absent.
fn normalize_headers(request: &mut Map<String, Value>, _policy: &Policy<'_>) {
    if let Some(raw) = request.get("headers").and_then(Value::as_str) {
        if !raw.is_empty() {
            let data: Vec<Value> = parse_header_string(raw)
                .into_iter()
                .map(|line| {
                    let mut header = Map::new();
                    header.insert("key".to_string(), Value::String(line.key));
                    header.insert("value".to_string(), Value::String(line.value));
                    if line.commented {
                        header.insert("enabled".to_string(), Value::Bool(false));
                    }
                    Value::Object(header)
                })
                .collect();
            request.insert("headerData".to_string(), Value::Array(data));
            return;
        }
    }
    if let Some(data) = request.get("headerData").and_then(Value::as_array) {
        let raw = build_header_string(data);
        request.insert("headers".to_string(), Value::String(raw));
    }
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Guard against a known legacy-client corruption: a `data` entry of type
/// `file` whose value is neither a string nor an array is forced to `null`
/// rather than passed through as arbitrary garbage.
fn normalize_body_data(request: &mut Map<String, Value>) {
    let Some(data) = request.get_mut("data").and_then(Value::as_array_mut) else {
        return;
    };
    for entry in data {
        let Some(obj) = entry.as_object_mut() else {
            continue;
        };
        if obj.get("type").and_then(Value::as_str) != Some("file") {
            continue;
        }
        let ok = matches!(obj.get("value"), Some(Value::String(_)) | Some(Value::Array(_)));
        if !ok && obj.contains_key("value") {
            obj.insert("value".to_string(), Value::Null);
        }
    }
}

// ---------------------------------------------------------------------------
// Path variables
// ---------------------------------------------------------------------------

fn normalize_path_variables(request: &mut Map<String, Value>, policy: &Policy<'_>) {
    let source: Option<Value> = match request.get("pathVariableData") {
        Some(Value::Array(data)) if !data.is_empty() => Some(Value::Array(data.clone())),
        _ => request
            .get("pathVariables")
            .and_then(Value::as_object)
            .filter(|map| !map.is_empty())
            .map(|map| {
                Value::Array(
                    map.iter()
                        .map(|(key, value)| {
                            let mut var = Map::new();
                            var.insert("key".to_string(), Value::String(key.clone()));
                            var.insert("value".to_string(), value.clone());
                            Value::Object(var)
                        })
                        .collect(),
                )
            }),
    };
    let Some(source) = source else {
        return;
    };
    let normalized = handle_vars(
        &Value::Null,
        policy,
        &VarModifiers {
            legacy: false,
            fallback: Some(&source),
        },
    );
    if let Some(normalized) = normalized {
        request.insert("pathVariableData".to_string(), normalized);
    }
}

// ---------------------------------------------------------------------------
// Auth trio
// ---------------------------------------------------------------------------

/// Reconcile `auth` / `currentHelper` / `helperAttributes` on a request.
///
/// Resolution order: an explicit `prioritize_v2` makes a present modern
/// `auth` authoritative; otherwise legacy wins when `currentHelper` names a
/// real helper; `normal` (and an explicit `auth: null`) collapse all three
/// to `null` regardless of `no_defaults`; a lone modern `auth` regenerates
/// the legacy pair; and when nothing is present the trio becomes explicit
/// nulls unless `no_defaults` leaves it absent.
fn normalize_auth_trio(request: &mut Map<String, Value>, policy: &Policy<'_>) {
    let snapshot = Value::Object(request.clone());

    if policy.prioritize_v2 && get_truthy(&snapshot, "auth").is_some() {
        modern_authoritative(request, policy, &snapshot);
        return;
    }

    if let Some(helper) = get_str(&snapshot, "currentHelper") {
        if helper == "normal" {
            trio_null(request);
            return;
        }
        match auth_from_legacy(&snapshot) {
            Some(current) => {
                legacy_authoritative(request, policy, &snapshot, &current);
                return;
            }
            None => {
                tracing::warn!(helper, "unknown auth helper treated as no auth data");
                trio_absent_or_null(request, policy);
                return;
            }
        }
    }

    match snapshot.get("auth") {
        Some(Value::Null) => trio_null(request),
        Some(auth) if is_truthy(auth) => modern_authoritative(request, policy, &snapshot),
        _ => trio_absent_or_null(request, policy),
    }
}

fn trio_null(request: &mut Map<String, Value>) {
    request.insert("auth".to_string(), Value::Null);
    request.insert("currentHelper".to_string(), Value::Null);
    request.insert("helperAttributes".to_string(), Value::Null);
}

fn trio_absent_or_null(request: &mut Map<String, Value>, policy: &Policy<'_>) {
    if policy.no_defaults {
        // nothing justifies these fields — make sure stale legacy leftovers
        // (e.g. falsy currentHelper) do not survive either
        return;
    }
    trio_null(request);
}

fn modern_authoritative(
    request: &mut Map<String, Value>,
    policy: &Policy<'_>,
    snapshot: &Value,
) {
    let Some(cleaned) = clean_auth(snapshot.get("auth"), false) else {
        // auth without a usable type — no auth data
        trio_absent_or_null(request, policy);
        return;
    };
    if cleaned.is_null() {
        trio_null(request);
        return;
    }
    let normalized = auth_map_to_array(Some(&cleaned), false).unwrap_or(cleaned);
    match auth_to_legacy(&normalized) {
        Some((helper, attrs)) => {
            request.insert("currentHelper".to_string(), Value::String(helper));
            request.insert(
                "helperAttributes".to_string(),
                attrs.unwrap_or(Value::Null),
            );
        }
        None => {
            if !policy.no_defaults {
                request.insert("currentHelper".to_string(), Value::Null);
                request.insert("helperAttributes".to_string(), Value::Null);
            }
        }
    }
    request.insert("auth".to_string(), normalized);
}

fn legacy_authoritative(
    request: &mut Map<String, Value>,
    policy: &Policy<'_>,
    snapshot: &Value,
    current: &Value,
) {
    // the modern array is regenerated from the legacy pair
    if let Some(auth) = auth_map_to_array(Some(current), false) {
        request.insert("auth".to_string(), auth);
    }
    // keep currentHelper; helperAttributes settle into object form
    match snapshot
        .get("helperAttributes")
        .and_then(coerce_helper_attributes)
    {
        Some(attrs) => {
            request.insert("helperAttributes".to_string(), attrs);
        }
        None => {
            request.remove("helperAttributes");
            if !policy.no_defaults {
                request.insert("helperAttributes".to_string(), Value::Null);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Events trio
// ---------------------------------------------------------------------------

/// Reconcile `events` / `tests` / `preRequestScript`, mirroring the auth
/// rules with one wrinkle: `events: null` is a valid, preserved sentinel
/// distinct from "absent".
fn normalize_events_trio(request: &mut Map<String, Value>, policy: &Policy<'_>) {
    let snapshot = Value::Object(request.clone());
    let events_array = snapshot
        .get("events")
        .and_then(Value::as_array)
        .filter(|events| !events.is_empty());

    if policy.prioritize_v2 && events_array.is_some() {
        modern_events(request, policy, &snapshot);
        return;
    }

    if !not_legacy(&snapshot, LegacyKind::Event) {
        // legacy authoritative: events regenerated from the script strings
        if let Some(events) = events_from_legacy(&snapshot) {
            request.insert("events".to_string(), events);
        }
        for field in ["tests", "preRequestScript"] {
            if get_truthy(&snapshot, field).is_none() && !policy.no_defaults {
                request.insert(field.to_string(), Value::Null);
            }
        }
        return;
    }

    match snapshot.get("events") {
        Some(Value::Null) => {
            // preserved sentinel
            if !policy.no_defaults {
                request.insert("tests".to_string(), Value::Null);
                request.insert("preRequestScript".to_string(), Value::Null);
            }
        }
        _ if events_array.is_some() => modern_events(request, policy, &snapshot),
        _ => {
            if !policy.no_defaults {
                request.insert("events".to_string(), Value::Null);
                request.insert("tests".to_string(), Value::Null);
                request.insert("preRequestScript".to_string(), Value::Null);
            }
        }
    }
}

fn modern_events(request: &mut Map<String, Value>, policy: &Policy<'_>, snapshot: &Value) {
    let events = snapshot
        .get("events")
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    match aggregate_script(&events, "test") {
        Some(tests) => {
            request.insert("tests".to_string(), Value::String(tests));
        }
        None if !policy.no_defaults => {
            request.insert("tests".to_string(), Value::Null);
        }
        None => {}
    }
    match aggregate_script(&events, "prerequest") {
        Some(script) => {
            request.insert("preRequestScript".to_string(), Value::String(script));
        }
        None if !policy.no_defaults => {
            request.insert("preRequestScript".to_string(), Value::Null);
        }
        None => {}
    }
    request.insert("events".to_string(), events);
}

// ===========================================================================
// Tests
// ===========================================================================
