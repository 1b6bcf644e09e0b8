//! v1 normalization through the public dispatch surface.
//!
//! Unit coverage for the per-field rules lives next to the normalizer; these
//! tests exercise the version-dispatched entry points and the headline
//! scenarios end to end.

use collection_transformer_core::{
    normalize, normalize_in_place, normalize_single, normalize_single_with_callback,
    NormalizeOptions,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn options() -> NormalizeOptions {
    NormalizeOptions {
        normalize_version: Some("1.0.0".to_string()),
        ..NormalizeOptions::default()
    }
}

fn no_defaults() -> NormalizeOptions {
    NormalizeOptions {
        no_defaults: true,
        ..options()
    }
}

#[test]
fn header_string_scenario() {
    let request = json!({ "id": "r", "headers": "A:B\nC:D\n// E: F" });
    let out = normalize_single(&request, &options()).unwrap();
    assert_eq!(
        out["headerData"],
        json!([
            { "key": "A", "value": "B" },
            { "key": "C", "value": "D" },
            { "key": "E", "value": "F", "enabled": false }
        ])
    );
}

#[test]
fn current_helper_normal_scenario() {
    // `currentHelper: 'normal'` collapses the trio regardless of no-defaults;
    // the id is only manufactured under the defaulting mode.
    let request = json!({ "currentHelper": "normal" });

    let out = normalize_single(&request, &no_defaults()).unwrap();
    assert_eq!(out.get("id"), None);
    assert_eq!(out["auth"], Value::Null);
    assert_eq!(out["currentHelper"], Value::Null);
    assert_eq!(out["helperAttributes"], Value::Null);

    let with_id = json!({ "id": "r", "currentHelper": "normal" });
    let out = normalize_single(&with_id, &no_defaults()).unwrap();
    assert_eq!(out["id"], "r");
    assert_eq!(out["auth"], Value::Null);
}

#[test]
fn no_defaults_manufactures_nothing() {
    let request = json!({ "id": "r", "name": "bare" });
    let out = normalize_single(&request, &no_defaults()).unwrap();
    assert_eq!(out, json!({ "id": "r", "name": "bare" }));
}

#[test]
fn defaults_produce_complete_field_set() {
    let request = json!({ "id": "r" });
    let out = normalize_single(&request, &options()).unwrap();
    for field in [
        "auth",
        "currentHelper",
        "helperAttributes",
        "events",
        "tests",
        "preRequestScript",
    ] {
        assert_eq!(out[field], Value::Null, "expected explicit null {}", field);
    }
}

#[test]
fn legacy_only_request_keeps_only_legacy_derived_fields() {
    // a request with only currentHelper keeps currentHelper-derived fields
    // under no-defaults — nothing else appears
    let request = json!({
        "id": "r",
        "currentHelper": "bearerAuth",
        "helperAttributes": { "token": "t" }
    });
    let out = normalize_single(&request, &no_defaults()).unwrap();
    assert_eq!(out["currentHelper"], "bearerAuth");
    assert_eq!(out["helperAttributes"], json!({ "token": "t" }));
    assert_eq!(out["auth"]["type"], "bearer");
    assert_eq!(out.get("events"), None);
    assert_eq!(out.get("tests"), None);
}

#[test]
fn normalize_is_idempotent() {
    let collection = json!({
        "id": "c-1",
        "name": "C",
        "order": ["r-1"],
        "requests": [{
            "id": "r-1",
            "headers": "A:B\n// E: F",
            "currentHelper": "hawkAuth",
            "helperAttributes": { "hawk_id": "h" },
            "tests": "t();",
            "pathVariables": { "id": "1" },
            "data": [{ "key": "f", "value": true, "type": "file" }],
            "dataMode": "params"
        }],
        "folders": [{ "id": "f-1", "name": "F" }]
    });

    for opts in [options(), no_defaults()] {
        let once = normalize(&collection, &opts).unwrap();
        let twice = normalize(&once, &opts).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn file_value_guard_applies() {
    let collection = json!({
        "id": "c-1",
        "name": "C",
        "order": ["r-1"],
        "requests": [{
            "id": "r-1",
            "dataMode": "params",
            "data": [{ "key": "f", "value": { "bad": 1 }, "type": "file" }]
        }]
    });
    let out = normalize(&collection, &options()).unwrap();
    assert_eq!(out["requests"][0]["data"][0]["value"], Value::Null);
}

#[test]
fn in_place_variant_edits_through_the_borrow() {
    let mut collection = json!({
        "id": "c-1",
        "name": "C",
        "requests": [{ "id": "r-1", "headers": "A:B" }]
    });
    normalize_in_place(&mut collection, &options()).unwrap();
    assert_eq!(collection["requests"][0]["headerData"][0]["key"], "A");
    assert_eq!(collection["order"], json!([]));
}

#[test]
fn callback_adapter_matches_pure_result() {
    let request = json!({ "id": "r", "headers": "A:B" });
    let pure = normalize_single(&request, &options()).unwrap();

    let mut via_callback = None;
    normalize_single_with_callback(&request, &options(), |result| {
        via_callback = Some(result.unwrap());
    });
    assert_eq!(via_callback.unwrap(), pure);
}

#[test]
fn events_null_sentinel_survives() {
    let request = json!({ "id": "r", "events": null });
    let out = normalize_single(&request, &no_defaults()).unwrap();
    assert_eq!(out["events"], Value::Null);
    assert_eq!(out.get("tests"), None);
}
