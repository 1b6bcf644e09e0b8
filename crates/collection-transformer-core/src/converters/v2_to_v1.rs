//! Reverse conversion: v2 family documents back to v1.
//!
//! The nested `item` tree is flattened into `requests[]` + `folders[]` with
//! parallel `order`/`folders_order` index lists. Each folder's own lists are
//! derived from its direct children — never from any pre-existing flat list —
//! which is what heals structurally valid but differently-ordered input.
//!
//! The v2.0/v2.1 split matters only for how auth parameters are shaped on
//! the way in; the shape-tolerant auth helpers absorb that difference, so
//! both versions share one builder set.

use serde_json::{json, Map, Value};

use crate::auth::{auth_map_to_array, auth_to_legacy};
use crate::config::{ConvertOptions, Policy};
use crate::error::TransformError;
use crate::uid::uid;
use crate::url;
use crate::util::{
    add_protocol_profile_behavior, aggregate_script, build_header_string, get_str, get_truthy,
    handle_vars, is_falsy, is_truthy, VarModifiers,
};

use super::{v1_mode_for, Variant};

/// Convert a whole v2/v2.1 collection to v1.
pub(crate) fn convert_collection(
    collection: &Value,
    _variant: Variant,
    options: &ConvertOptions,
) -> Result<Value, TransformError> {
    if !collection.is_object() {
        return Err(TransformError::MalformedDocument {
            message: "collection root must be a JSON object".to_string(),
        });
    }

    let builders = Builders {
        policy: options.policy(),
    };

    let info = collection.get("info").cloned().unwrap_or(Value::Null);
    let collection_id = match builders.policy.retain_ids {
        true => get_str(&info, "_postman_id")
            .or_else(|| get_str(&info, "id"))
            .map(str::to_string)
            .unwrap_or_else(uid),
        false => uid(),
    };

    // Identifier pre-pass: every item carries an `id` before the tree is
    // flattened, because order lists are keyed off identifiers.
    let mut items = collection.get("item").cloned().unwrap_or(Value::Null);
    ensure_item_ids(&mut items, builders.policy.retain_ids);

    let mut state = FlattenState::default();
    let (order, folders_order) = builders.flatten_items(&items, Some(&collection_id), &mut state);

    let mut out = Map::new();
    out.insert("id".to_string(), Value::String(collection_id));
    if let Some(name) = info.get("name") {
        out.insert("name".to_string(), name.clone());
    }
    builders.description(&info, &mut out);
    out.insert("order".to_string(), ids_to_value(order));
    out.insert("folders_order".to_string(), ids_to_value(folders_order));
    out.insert("folders".to_string(), Value::Array(state.folders));
    out.insert("requests".to_string(), Value::Array(state.requests));
    if let Some(auth) = auth_map_to_array(collection.get("auth"), false) {
        out.insert("auth".to_string(), auth);
    }
    if let Some(events) = collection.get("event").filter(|e| e.is_array()) {
        out.insert("events".to_string(), events.clone());
    }
    if let Some(variables) = handle_vars(collection, &builders.policy, &VarModifiers::default()) {
        out.insert("variables".to_string(), variables);
    }
    add_protocol_profile_behavior(collection, &mut out);

    Ok(Value::Object(out))
}

/// Convert a single v2 item (or bare request object) to a v1 request.
pub(crate) fn convert_single(
    item: &Value,
    _variant: Variant,
    options: &ConvertOptions,
) -> Result<Value, TransformError> {
    if !item.is_object() {
        return Err(TransformError::MalformedDocument {
            message: "item must be a JSON object".to_string(),
        });
    }
    let builders = Builders {
        policy: options.policy(),
    };
    let id = effective_id(item, builders.policy.retain_ids);
    Ok(builders.request_from_item(item, &id, None))
}

/// Convert a single v2 saved response to v1.
pub(crate) fn convert_response(
    response: &Value,
    _variant: Variant,
    options: &ConvertOptions,
) -> Result<Value, TransformError> {
    if !response.is_object() {
        return Err(TransformError::MalformedDocument {
            message: "response must be a JSON object".to_string(),
        });
    }
    let builders = Builders {
        policy: options.policy(),
    };
    Ok(builders.response(response))
}

// ---------------------------------------------------------------------------
// Identifier pre-pass
// ---------------------------------------------------------------------------

/// Promote `_postman_id` to `id` and generate identifiers for items that
/// carry none. With `retain_ids` unset, every identifier is regenerated.
fn ensure_item_ids(items: &mut Value, retain_ids: bool) {
    let Some(items) = items.as_array_mut() else {
        return;
    };
    for item in items {
        let Some(obj) = item.as_object_mut() else {
            continue;
        };
        let id = if retain_ids {
            obj.get("id")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    obj.get("_postman_id")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                })
                .map(str::to_string)
                .unwrap_or_else(uid)
        } else {
            uid()
        };
        obj.insert("id".to_string(), Value::String(id));
        if let Some(children) = obj.get_mut("item") {
            ensure_item_ids(children, retain_ids);
        }
    }
}

fn effective_id(entity: &Value, retain_ids: bool) -> String {
    if retain_ids {
        get_str(entity, "id")
            .or_else(|| get_str(entity, "_postman_id"))
            .map(str::to_string)
            .unwrap_or_else(uid)
    } else {
        uid()
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FlattenState {
    folders: Vec<Value>,
    requests: Vec<Value>,
}

struct Builders<'a> {
    policy: Policy<'a>,
}

impl Builders<'_> {
    fn description(&self, entity: &Value, out: &mut Map<String, Value>) {
        match get_truthy(entity, "description") {
            Some(description) => {
                out.insert("description".to_string(), description.clone());
            }
            None if self.policy.retain_empty_values => {
                out.insert("description".to_string(), Value::Null);
            }
            None => {}
        }
    }

    // -- tree flattening ----------------------------------------------------

    /// Walk one level of the item tree. Returns this level's
    /// (`order`, `folders_order`) — direct child request ids and direct child
    /// folder ids — while folders and requests accumulate into `state`.
    fn flatten_items(
        &self,
        items: &Value,
        collection_id: Option<&str>,
        state: &mut FlattenState,
    ) -> (Vec<String>, Vec<String>) {
        let mut order = Vec::new();
        let mut folders_order = Vec::new();
        let Some(items) = items.as_array() else {
            return (order, folders_order);
        };

        for item in items {
            if !item.is_object() {
                tracing::warn!("skipping non-object entry in item tree");
                continue;
            }
            // the pre-pass guarantees this
            let Some(id) = get_str(item, "id").map(str::to_string) else {
                continue;
            };

            if item.get("item").is_some_and(Value::is_array) {
                let empty = Value::Array(Vec::new());
                let children = item.get("item").unwrap_or(&empty);
                let (child_order, child_folders) =
                    self.flatten_items(children, collection_id, state);
                state
                    .folders
                    .push(self.folder(item, &id, collection_id, child_order, child_folders));
                folders_order.push(id);
            } else {
                state
                    .requests
                    .push(self.request_from_item(item, &id, collection_id));
                order.push(id);
            }
        }

        (order, folders_order)
    }

    fn folder(
        &self,
        item: &Value,
        id: &str,
        collection_id: Option<&str>,
        order: Vec<String>,
        folders_order: Vec<String>,
    ) -> Value {
        let mut folder = Map::new();
        folder.insert("id".to_string(), Value::String(id.to_string()));
        if let Some(name) = item.get("name") {
            folder.insert("name".to_string(), name.clone());
        }
        self.description(item, &mut folder);
        folder.insert("order".to_string(), ids_to_value(order));
        folder.insert("folders_order".to_string(), ids_to_value(folders_order));
        if let Some(collection_id) = collection_id {
            folder.insert(
                "collectionId".to_string(),
                Value::String(collection_id.to_string()),
            );
        }
        if let Some(auth) = auth_map_to_array(item.get("auth"), false) {
            folder.insert("auth".to_string(), auth);
        }
        if let Some(events) = item.get("event").filter(|e| e.is_array()) {
            folder.insert("events".to_string(), events.clone());
        }
        if let Some(variables) = handle_vars(item, &self.policy, &VarModifiers::default()) {
            folder.insert("variables".to_string(), variables);
        }
        add_protocol_profile_behavior(item, &mut folder);
        Value::Object(folder)
    }

    // -- requests -----------------------------------------------------------

    /// Build a v1 request from an item. Bare request objects (no `request`
    /// wrapper) are accepted for single conversions.
    fn request_from_item(&self, item: &Value, id: &str, collection_id: Option<&str>) -> Value {
        let request = match item.get("request") {
            Some(Value::String(raw)) => json!({ "url": raw }),
            Some(request @ Value::Object(_)) => request.clone(),
            _ => item.clone(),
        };

        let mut out = Map::new();
        out.insert("id".to_string(), Value::String(id.to_string()));
        if let Some(name) = item.get("name") {
            out.insert("name".to_string(), name.clone());
        }
        self.description(&request, &mut out);
        if let Some(collection_id) = collection_id {
            out.insert(
                "collectionId".to_string(),
                Value::String(collection_id.to_string()),
            );
        }
        self.request_fields(&request, &mut out);
        self.events(item, &mut out);

        let responses = item
            .get("response")
            .and_then(Value::as_array)
            .map(|responses| {
                responses
                    .iter()
                    .filter(|r| r.is_object())
                    .map(|r| self.response(r))
                    .collect()
            })
            .unwrap_or_default();
        out.insert("responses".to_string(), Value::Array(responses));

        add_protocol_profile_behavior(item, &mut out);
        Value::Object(out)
    }

    /// The wire-level request fields shared by requests and embedded
    /// original requests: method, url, headers, body, auth.
    fn request_fields(&self, request: &Value, out: &mut Map<String, Value>) {
        if let Some(method) = request.get("method") {
            out.insert("method".to_string(), method.clone());
        }
        self.url_fields(request, out);
        self.header_fields(request, out);
        self.body_fields(request, out);
        self.auth_fields(request, out);
    }

    fn url_fields(&self, request: &Value, out: &mut Map<String, Value>) {
        let Some(url) = request.get("url") else {
            return;
        };
        if let Some(raw) = url::unparse_value(url) {
            out.insert("url".to_string(), Value::String(raw));
        }

        let Some(url) = url.as_object() else {
            return;
        };
        if let Some(variables) = url.get("variable").and_then(Value::as_array) {
            if !variables.is_empty() {
                let mut map = Map::new();
                for variable in variables {
                    if let Some(key) = get_str(variable, "key") {
                        map.insert(
                            key.to_string(),
                            variable.get("value").cloned().unwrap_or(Value::Null),
                        );
                    }
                }
                out.insert("pathVariables".to_string(), Value::Object(map));
                out.insert(
                    "pathVariableData".to_string(),
                    Value::Array(variables.clone()),
                );
            }
        }
        if let Some(query) = url.get("query").and_then(Value::as_array) {
            if !query.is_empty() {
                let params: Vec<Value> = query
                    .iter()
                    .filter_map(|entry| {
                        let obj = entry.as_object()?;
                        let mut param = Map::new();
                        param.insert(
                            "key".to_string(),
                            obj.get("key").cloned().unwrap_or_default(),
                        );
                        param.insert(
                            "value".to_string(),
                            obj.get("value").cloned().unwrap_or_default(),
                        );
                        if obj.get("disabled").is_some_and(is_truthy) {
                            param.insert("enabled".to_string(), Value::Bool(false));
                        }
                        if let Some(description) =
                            obj.get("description").filter(|d| !is_falsy(d))
                        {
                            param.insert("description".to_string(), description.clone());
                        }
                        Some(Value::Object(param))
                    })
                    .collect();
                out.insert("queryParams".to_string(), Value::Array(params));
            }
        }
    }

    fn header_fields(&self, request: &Value, out: &mut Map<String, Value>) {
        let Some(headers) = request.get("header").and_then(Value::as_array) else {
            return;
        };
        out.insert(
            "headers".to_string(),
            Value::String(build_header_string(headers)),
        );
        let data: Vec<Value> = headers
            .iter()
            .filter_map(|entry| {
                let obj = entry.as_object()?;
                let mut header = Map::new();
                header.insert(
                    "key".to_string(),
                    obj.get("key").cloned().unwrap_or_default(),
                );
                header.insert(
                    "value".to_string(),
                    obj.get("value").cloned().unwrap_or_default(),
                );
                if obj.get("disabled").is_some_and(is_truthy) {
                    header.insert("enabled".to_string(), Value::Bool(false));
                }
                if let Some(description) = obj.get("description").filter(|d| !is_falsy(d)) {
                    header.insert("description".to_string(), description.clone());
                }
                Some(Value::Object(header))
            })
            .collect();
        out.insert("headerData".to_string(), Value::Array(data));
    }

    fn body_fields(&self, request: &Value, out: &mut Map<String, Value>) {
        let retain = self.policy.retain_empty_values;
        let body = match request.get("body") {
            Some(body @ Value::Object(_)) => body,
            // absent or explicit null — no body
            _ => {
                if retain {
                    out.insert("dataMode".to_string(), Value::Null);
                    out.insert("data".to_string(), Value::Null);
                    out.insert("rawModeData".to_string(), Value::Null);
                }
                return;
            }
        };

        let Some(mode) = body.get("mode").and_then(Value::as_str).and_then(v1_mode_for) else {
            tracing::warn!("skipping body with unrecognized mode");
            return;
        };
        out.insert("dataMode".to_string(), Value::String(mode.to_string()));

        match mode {
            "raw" => {
                if let Some(raw) = body.get("raw") {
                    out.insert("rawModeData".to_string(), raw.clone());
                }
            }
            "binary" => {
                let src = body
                    .get("file")
                    .and_then(|file| file.get("src"))
                    .cloned()
                    .unwrap_or(Value::Null);
                out.insert("rawModeData".to_string(), src);
            }
            "graphql" => {
                if let Some(graphql) = body.get("graphql") {
                    out.insert("graphqlModeData".to_string(), graphql.clone());
                }
            }
            "urlencoded" | "params" => {
                let source = if mode == "params" {
                    body.get("formdata")
                } else {
                    body.get("urlencoded")
                };
                let data: Vec<Value> = source
                    .and_then(Value::as_array)
                    .map(|params| {
                        params
                            .iter()
                            .filter_map(|entry| {
                                let obj = entry.as_object()?;
                                let mut param = Map::new();
                                param.insert(
                                    "key".to_string(),
                                    obj.get("key").cloned().unwrap_or_default(),
                                );
                                let is_file =
                                    obj.get("type").and_then(Value::as_str) == Some("file");
                                let value = if is_file {
                                    obj.get("src").cloned().unwrap_or(Value::Null)
                                } else {
                                    obj.get("value").cloned().unwrap_or_default()
                                };
                                param.insert("value".to_string(), value);
                                if let Some(t) = obj.get("type") {
                                    param.insert("type".to_string(), t.clone());
                                }
                                if obj.get("disabled").is_some_and(is_truthy) {
                                    param.insert("enabled".to_string(), Value::Bool(false));
                                }
                                if let Some(description) =
                                    obj.get("description").filter(|d| !is_falsy(d))
                                {
                                    param.insert("description".to_string(), description.clone());
                                }
                                Some(Value::Object(param))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                out.insert("data".to_string(), Value::Array(data));
            }
            _ => {}
        }
    }

    fn auth_fields(&self, request: &Value, out: &mut Map<String, Value>) {
        let retain = self.policy.retain_empty_values;
        match auth_map_to_array(request.get("auth"), false) {
            Some(Value::Null) => {
                out.insert("auth".to_string(), Value::Null);
                if retain {
                    out.insert("currentHelper".to_string(), Value::Null);
                    out.insert("helperAttributes".to_string(), Value::Null);
                }
            }
            Some(auth) => {
                if let Some((helper, attrs)) = auth_to_legacy(&auth) {
                    out.insert("currentHelper".to_string(), Value::String(helper));
                    match attrs {
                        Some(attrs) => {
                            out.insert("helperAttributes".to_string(), attrs);
                        }
                        None if retain => {
                            out.insert("helperAttributes".to_string(), Value::Null);
                        }
                        None => {}
                    }
                }
                out.insert("auth".to_string(), auth);
            }
            None if retain => {
                out.insert("auth".to_string(), Value::Null);
                out.insert("currentHelper".to_string(), Value::Null);
                out.insert("helperAttributes".to_string(), Value::Null);
            }
            None => {}
        }
    }

    fn events(&self, item: &Value, out: &mut Map<String, Value>) {
        let retain = self.policy.retain_empty_values;
        let Some(events) = item.get("event").filter(|e| e.is_array()) else {
            if retain {
                out.insert("events".to_string(), Value::Null);
                out.insert("tests".to_string(), Value::Null);
                out.insert("preRequestScript".to_string(), Value::Null);
            }
            return;
        };
        out.insert("events".to_string(), events.clone());
        match aggregate_script(events, "test") {
            Some(tests) => {
                out.insert("tests".to_string(), Value::String(tests));
            }
            None if retain => {
                out.insert("tests".to_string(), Value::Null);
            }
            None => {}
        }
        match aggregate_script(events, "prerequest") {
            Some(script) => {
                out.insert("preRequestScript".to_string(), Value::String(script));
            }
            None if retain => {
                out.insert("preRequestScript".to_string(), Value::Null);
            }
            None => {}
        }
    }

    // -- responses ----------------------------------------------------------

    fn response(&self, response: &Value) -> Value {
        let mut out = Map::new();
        out.insert(
            "id".to_string(),
            Value::String(effective_id(response, self.policy.retain_ids)),
        );
        if let Some(name) = response.get("name") {
            out.insert("name".to_string(), name.clone());
        }

        // The embedded original request is converted back to request fields
        // only — response recursion is disabled by construction, so a
        // response's request can never carry further nested responses.
        if let Some(original @ Value::Object(_)) = response.get("originalRequest") {
            let mut request = Map::new();
            self.request_fields(original, &mut request);
            out.insert("request".to_string(), Value::Object(request));
        }

        let mut response_code = Map::new();
        if let Some(code) = response.get("code") {
            response_code.insert("code".to_string(), code.clone());
        }
        if let Some(status) = response.get("status") {
            response_code.insert("name".to_string(), status.clone());
        }
        if !response_code.is_empty() {
            out.insert("responseCode".to_string(), Value::Object(response_code));
        }
        if let Some(time) = response.get("responseTime") {
            out.insert("time".to_string(), time.clone());
        }
        if let Some(headers) = response.get("header").filter(|h| h.is_array()) {
            out.insert("headers".to_string(), headers.clone());
        }
        if let Some(body) = response.get("body") {
            out.insert("text".to_string(), body.clone());
        }
        if let Some(language) = get_truthy(response, "_postman_previewlanguage") {
            out.insert("language".to_string(), language.clone());
        }
        Value::Object(out)
    }
}

fn ids_to_value(ids: Vec<String>) -> Value {
    Value::Array(ids.into_iter().map(Value::String).collect())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn retain() -> ConvertOptions {
        ConvertOptions {
            retain_ids: true,
            ..ConvertOptions::default()
        }
    }

    fn convert(collection: Value, options: ConvertOptions) -> Value {
        convert_collection(&collection, Variant::V21, &options).unwrap()
    }

    // -----------------------------------------------------------------------
    // Test 1: flattening derives per-folder order lists from direct children
    // -----------------------------------------------------------------------
    #[test]
    fn test_flatten_nested_items() {
        let collection = json!({
            "info": { "_postman_id": "c-1", "name": "Tree", "schema": "x" },
            "item": [
                {
                    "_postman_id": "f-1",
                    "name": "Top",
                    "item": [
                        {
                            "_postman_id": "f-2",
                            "name": "Inner",
                            "item": [{
                                "_postman_id": "r-2",
                                "name": "Two",
                                "request": { "method": "GET", "url": "http://c" }
                            }]
                        },
                        {
                            "_postman_id": "r-1",
                            "name": "One",
                            "request": { "method": "GET", "url": "http://b" }
                        }
                    ]
                },
                {
                    "_postman_id": "r-loose",
                    "name": "Loose",
                    "request": { "method": "GET", "url": "http://a" }
                }
            ]
        });

        let out = convert(collection, retain());
        assert_eq!(out["id"], "c-1");
        assert_eq!(out["name"], "Tree");
        assert_eq!(out["order"], json!(["r-loose"]));
        assert_eq!(out["folders_order"], json!(["f-1"]));

        let folders = out["folders"].as_array().unwrap();
        assert_eq!(folders.len(), 2);
        // depth-first: inner folder lands first in the flat list
        assert_eq!(folders[0]["id"], "f-2");
        assert_eq!(folders[0]["order"], json!(["r-2"]));
        assert_eq!(folders[0]["folders_order"], json!([]));
        assert_eq!(folders[1]["id"], "f-1");
        assert_eq!(folders[1]["order"], json!(["r-1"]));
        assert_eq!(folders[1]["folders_order"], json!(["f-2"]));

        let requests = out["requests"].as_array().unwrap();
        assert_eq!(requests.len(), 3);
        for request in requests {
            assert_eq!(request["collectionId"], "c-1");
        }
    }

    // -----------------------------------------------------------------------
    // Test 2: identifier pre-pass — promotion and regeneration
    // -----------------------------------------------------------------------
    #[test]
    fn test_postman_id_promotion() {
        let collection = json!({
            "info": { "_postman_id": "c-1", "name": "P", "schema": "x" },
            "item": [{
                "_postman_id": "r-1",
                "name": "R",
                "request": { "method": "GET", "url": "http://a" }
            }]
        });

        let out = convert(collection.clone(), retain());
        assert_eq!(out["requests"][0]["id"], "r-1");
        assert_eq!(out["order"], json!(["r-1"]));

        // without retain_ids everything is regenerated, and the order list
        // follows the regenerated identifiers in lockstep
        let out = convert(collection, ConvertOptions::default());
        let new_id = out["requests"][0]["id"].as_str().unwrap();
        assert_ne!(new_id, "r-1");
        assert_eq!(out["order"], json!([new_id]));
    }

    #[test]
    fn test_items_without_ids_get_generated_ones() {
        let collection = json!({
            "info": { "name": "NoIds", "schema": "x" },
            "item": [{
                "name": "R",
                "request": { "method": "GET", "url": "http://a" }
            }]
        });
        let out = convert(collection, retain());
        let id = out["requests"][0]["id"].as_str().unwrap();
        assert_eq!(id.len(), 36);
        assert_eq!(out["order"][0], *id);
    }

    // -----------------------------------------------------------------------
    // Test 3: request fields — url object, headers, body
    // -----------------------------------------------------------------------
    #[test]
    fn test_structured_url_unparsed_with_metadata() {
        let item = json!({
            "id": "r-1",
            "name": "R",
            "request": {
                "method": "POST",
                "url": {
                    "raw": "http://example.com/:id?a=1",
                    "protocol": "http",
                    "host": ["example", "com"],
                    "path": [":id"],
                    "query": [
                        { "key": "a", "value": "1" },
                        { "key": "b", "value": "2", "disabled": true }
                    ],
                    "variable": [{ "key": "id", "value": "42" }]
                }
            }
        });
        let out = convert_single(&item, Variant::V21, &retain()).unwrap();
        assert_eq!(out["url"], "http://example.com/:id?a=1&b=2");
        assert_eq!(out["pathVariables"], json!({ "id": "42" }));
        assert_eq!(out["pathVariableData"], json!([{ "key": "id", "value": "42" }]));
        assert_eq!(
            out["queryParams"],
            json!([
                { "key": "a", "value": "1" },
                { "key": "b", "value": "2", "enabled": false }
            ])
        );
    }

    #[test]
    fn test_headers_rebuilt_as_string_and_data() {
        let item = json!({
            "id": "r-1",
            "request": {
                "method": "GET",
                "url": "http://a",
                "header": [
                    { "key": "A", "value": "B" },
                    { "key": "E", "value": "F", "disabled": true }
                ]
            }
        });
        let out = convert_single(&item, Variant::V2, &retain()).unwrap();
        assert_eq!(out["headers"], "A: B\n// E: F");
        assert_eq!(
            out["headerData"],
            json!([
                { "key": "A", "value": "B" },
                { "key": "E", "value": "F", "enabled": false }
            ])
        );
    }

    #[test]
    fn test_body_modes_reverse_mapping() {
        let raw = json!({
            "id": "r",
            "request": {
                "url": "http://a",
                "body": { "mode": "raw", "raw": "hello" }
            }
        });
        let out = convert_single(&raw, Variant::V2, &retain()).unwrap();
        assert_eq!(out["dataMode"], "raw");
        assert_eq!(out["rawModeData"], "hello");

        let file = json!({
            "id": "r",
            "request": {
                "url": "http://a",
                "body": { "mode": "file", "file": { "src": "/tmp/x.bin" } }
            }
        });
        let out = convert_single(&file, Variant::V2, &retain()).unwrap();
        assert_eq!(out["dataMode"], "binary");
        assert_eq!(out["rawModeData"], "/tmp/x.bin");

        let formdata = json!({
            "id": "r",
            "request": {
                "url": "http://a",
                "body": {
                    "mode": "formdata",
                    "formdata": [
                        { "key": "name", "value": "n", "type": "text" },
                        { "key": "up", "src": "/tmp/a", "type": "file", "disabled": true }
                    ]
                }
            }
        });
        let out = convert_single(&formdata, Variant::V2, &retain()).unwrap();
        assert_eq!(out["dataMode"], "params");
        assert_eq!(
            out["data"],
            json!([
                { "key": "name", "value": "n", "type": "text" },
                { "key": "up", "value": "/tmp/a", "type": "file", "enabled": false }
            ])
        );

        let graphql = json!({
            "id": "r",
            "request": {
                "url": "http://a",
                "body": { "mode": "graphql", "graphql": { "query": "{ x }" } }
            }
        });
        let out = convert_single(&graphql, Variant::V2, &retain()).unwrap();
        assert_eq!(out["dataMode"], "graphql");
        assert_eq!(out["graphqlModeData"], json!({ "query": "{ x }" }));
    }

    #[test]
    fn test_absent_body_retain_empty_values() {
        let item = json!({ "id": "r", "request": { "url": "http://a" } });

        let out = convert_single(&item, Variant::V2, &retain()).unwrap();
        assert_eq!(out.get("dataMode"), None);

        let options = ConvertOptions {
            retain_empty_values: true,
            ..retain()
        };
        let out = convert_single(&item, Variant::V2, &options).unwrap();
        assert_eq!(out["dataMode"], Value::Null);
        assert_eq!(out["data"], Value::Null);
        assert_eq!(out["rawModeData"], Value::Null);
    }

    // -----------------------------------------------------------------------
    // Test 4: auth trio
    // -----------------------------------------------------------------------
    #[test]
    fn test_auth_trio_from_v21_array() {
        let item = json!({
            "id": "r",
            "request": {
                "url": "http://a",
                "auth": {
                    "type": "hawk",
                    "hawk": [
                        { "key": "authId", "value": "h", "type": "string" },
                        { "key": "extraData", "value": "x", "type": "string" }
                    ]
                }
            }
        });
        let out = convert_single(&item, Variant::V21, &retain()).unwrap();
        assert_eq!(out["currentHelper"], "hawkAuth");
        assert_eq!(out["helperAttributes"], json!({ "hawk_id": "h", "ext": "x" }));
        assert_eq!(out["auth"]["type"], "hawk");
        assert_eq!(out["auth"]["hawk"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_auth_trio_from_v2_map() {
        let item = json!({
            "id": "r",
            "request": {
                "url": "http://a",
                "auth": { "type": "basic", "basic": { "username": "u" } }
            }
        });
        let out = convert_single(&item, Variant::V2, &retain()).unwrap();
        assert_eq!(out["currentHelper"], "basicAuth");
        assert_eq!(out["helperAttributes"], json!({ "username": "u" }));
        // the modern v1 auth field carries the array shape
        assert_eq!(
            out["auth"]["basic"],
            json!([{ "key": "username", "value": "u", "type": "string" }])
        );
    }

    #[test]
    fn test_auth_noauth_becomes_normal() {
        let item = json!({
            "id": "r",
            "request": { "url": "http://a", "auth": { "type": "noauth" } }
        });
        let out = convert_single(&item, Variant::V2, &retain()).unwrap();
        assert_eq!(out["currentHelper"], "normal");
        assert_eq!(out["auth"], json!({ "type": "noauth" }));
    }

    #[test]
    fn test_auth_null_and_absent() {
        let null_auth = json!({ "id": "r", "request": { "url": "http://a", "auth": null } });
        let out = convert_single(&null_auth, Variant::V2, &retain()).unwrap();
        assert_eq!(out["auth"], Value::Null);
        assert_eq!(out.get("currentHelper"), None);

        let absent = json!({ "id": "r", "request": { "url": "http://a" } });
        let out = convert_single(&absent, Variant::V2, &retain()).unwrap();
        assert_eq!(out.get("auth"), None);

        let options = ConvertOptions {
            retain_empty_values: true,
            ..retain()
        };
        let out = convert_single(&absent, Variant::V2, &options).unwrap();
        assert_eq!(out["auth"], Value::Null);
        assert_eq!(out["currentHelper"], Value::Null);
        assert_eq!(out["helperAttributes"], Value::Null);
    }

    // -----------------------------------------------------------------------
    // Test 5: events aggregate back to legacy strings
    // -----------------------------------------------------------------------
    #[test]
    fn test_events_aggregate_to_legacy_strings() {
        let item = json!({
            "id": "r",
            "request": { "url": "http://a" },
            "event": [
                { "listen": "test", "script": { "exec": ["a();"] } },
                { "listen": "test", "script": { "exec": ["b();"] } },
                { "listen": "prerequest", "script": { "exec": ["setup();"] } }
            ]
        });
        let out = convert_single(&item, Variant::V2, &retain()).unwrap();
        assert_eq!(out["tests"], "a();\nb();");
        assert_eq!(out["preRequestScript"], "setup();");
        assert_eq!(out["events"], item["event"]);
    }

    // -----------------------------------------------------------------------
    // Test 6: responses — embedded request carries no nested responses
    // -----------------------------------------------------------------------
    #[test]
    fn test_response_reverse_conversion() {
        let response = json!({
            "id": "resp-1",
            "name": "OK",
            "status": "OK",
            "code": 200,
            "responseTime": 88,
            "_postman_previewlanguage": "json",
            "header": [{ "key": "Content-Type", "value": "application/json" }],
            "body": "{}",
            "originalRequest": {
                "method": "GET",
                "url": "http://example.com/x",
                "body": { "mode": "raw", "raw": "q" }
            }
        });
        let out = convert_response(&response, Variant::V2, &retain()).unwrap();
        assert_eq!(out["id"], "resp-1");
        assert_eq!(out["responseCode"], json!({ "code": 200, "name": "OK" }));
        assert_eq!(out["time"], 88);
        assert_eq!(out["language"], "json");
        assert_eq!(out["text"], "{}");
        let embedded = &out["request"];
        assert_eq!(embedded["method"], "GET");
        assert_eq!(embedded["url"], "http://example.com/x");
        assert_eq!(embedded["dataMode"], "raw");
        assert_eq!(embedded.get("responses"), None);
    }

    // -----------------------------------------------------------------------
    // Test 7: self-healing — junk entries in the item tree
    // -----------------------------------------------------------------------
    #[test]
    fn test_junk_items_skipped() {
        let collection = json!({
            "info": { "_postman_id": "c-1", "name": "J", "schema": "x" },
            "item": [
                null,
                42,
                { "_postman_id": "r-1", "name": "R", "request": { "url": "http://a" } }
            ]
        });
        let out = convert(collection, retain());
        assert_eq!(out["requests"].as_array().unwrap().len(), 1);
        assert_eq!(out["order"], json!(["r-1"]));
    }

    // -----------------------------------------------------------------------
    // Test 8: collection-level auth, events, variables
    // -----------------------------------------------------------------------
    #[test]
    fn test_collection_level_fields() {
        let collection = json!({
            "info": { "_postman_id": "c-1", "name": "C", "schema": "x" },
            "item": [],
            "auth": { "type": "bearer", "bearer": [{ "key": "token", "value": "t" }] },
            "event": [{ "listen": "prerequest", "script": { "exec": ["boot();"] } }],
            "variable": [{ "id": "v-1", "key": "host", "value": "example.com" }]
        });
        let out = convert(collection, retain());
        assert_eq!(out["auth"]["type"], "bearer");
        assert_eq!(out["events"][0]["listen"], "prerequest");
        assert_eq!(out["variables"][0]["key"], "host");
        assert_eq!(out["folders"], json!([]));
        assert_eq!(out["requests"], json!([]));
    }
}
