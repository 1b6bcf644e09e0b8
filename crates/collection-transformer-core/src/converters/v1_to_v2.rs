//! Forward conversion: v1 documents to the v2 family.
//!
//! v1 collections are flat — `folders[]` and `requests[]` with parallel
//! `order`/`folders_order` index lists describing nesting. The builders here
//! reassemble that into the v2 nested `item` tree, healing structural
//! anomalies on the way: falsy, duplicate, and unresolvable order references
//! are skipped (with a log note), and cyclic folder references cannot recurse
//! because every folder is linked into at most one group per call.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};

use crate::auth::{auth_array_to_map, auth_from_legacy, auth_map_to_array, clean_auth};
use crate::config::{ConvertOptions, Policy};
use crate::error::TransformError;
use crate::uid::uid;
use crate::url;
use crate::util::{
    add_protocol_profile_behavior, events_from_legacy, get_str, get_truthy, handle_vars, is_falsy,
    is_truthy, not_legacy, parse_header_string, set_or_retain, LegacyKind, VarModifiers,
};

use super::{v2_mode_for, Variant};

/// Convert a whole v1 collection.
pub(crate) fn convert_collection(
    collection: &Value,
    variant: Variant,
    options: &ConvertOptions,
) -> Result<Value, TransformError> {
    if !collection.is_object() {
        return Err(TransformError::MalformedDocument {
            message: "collection root must be a JSON object".to_string(),
        });
    }

    let mut builders = Builders::new(collection, variant, options.policy());

    let mut out = Map::new();
    out.insert("info".to_string(), builders.info(collection));
    out.insert("item".to_string(), builders.items(collection));
    if let Some(auth) = builders.auth(collection) {
        out.insert("auth".to_string(), auth);
    }
    if let Some(events) = builders.events(collection) {
        out.insert("event".to_string(), events);
    }
    if let Some(variables) = builders.variables(collection) {
        out.insert("variable".to_string(), variables);
    }
    add_protocol_profile_behavior(collection, &mut out);

    Ok(Value::Object(out))
}

/// Convert a single v1 request into a v2 item.
pub(crate) fn convert_single(
    request: &Value,
    variant: Variant,
    options: &ConvertOptions,
) -> Result<Value, TransformError> {
    if !request.is_object() {
        return Err(TransformError::MalformedDocument {
            message: "request must be a JSON object".to_string(),
        });
    }
    let detached = Value::Null;
    let builders = Builders::new(&detached, variant, options.policy());
    Ok(builders.request_item(request))
}

/// Convert a single v1 saved response.
pub(crate) fn convert_response(
    response: &Value,
    variant: Variant,
    options: &ConvertOptions,
) -> Result<Value, TransformError> {
    if !response.is_object() {
        return Err(TransformError::MalformedDocument {
            message: "response must be a JSON object".to_string(),
        });
    }
    let detached = Value::Null;
    let builders = Builders::new(&detached, variant, options.policy());
    Ok(builders.response(response))
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Throwaway per-call builder state. The lookup maps and consumed sets live
/// only for one top-level conversion; no state crosses calls.
struct Builders<'a> {
    variant: Variant,
    policy: Policy<'a>,
    /// id → entity lookups over the flat v1 lists.
    folders: HashMap<String, &'a Value>,
    requests: HashMap<String, &'a Value>,
    /// ids already linked into a group — duplicate references are dropped,
    /// which also makes cyclic `folders_order` references terminate.
    consumed_folders: HashSet<String>,
    consumed_requests: HashSet<String>,
}

impl<'a> Builders<'a> {
    fn new(collection: &'a Value, variant: Variant, policy: Policy<'a>) -> Self {
        let mut folders = HashMap::new();
        if let Some(list) = collection.get("folders").and_then(Value::as_array) {
            for folder in list {
                if let Some(id) = get_str(folder, "id") {
                    folders.insert(id.to_string(), folder);
                }
            }
        }
        let mut requests = HashMap::new();
        if let Some(list) = collection.get("requests").and_then(Value::as_array) {
            for request in list {
                if let Some(id) = get_str(request, "id") {
                    requests.insert(id.to_string(), request);
                }
            }
        }
        Self {
            variant,
            policy,
            folders,
            requests,
            consumed_folders: HashSet::new(),
            consumed_requests: HashSet::new(),
        }
    }

    fn entity_id(&self, entity: &Value) -> String {
        match get_str(entity, "id") {
            Some(id) if self.policy.retain_ids => id.to_string(),
            _ => uid(),
        }
    }

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

    // -- info ---------------------------------------------------------------

    fn info(&self, collection: &Value) -> Value {
        let mut info = Map::new();
        info.insert(
            "_postman_id".to_string(),
            Value::String(self.entity_id(collection)),
        );
        if let Some(name) = collection.get("name") {
            info.insert("name".to_string(), name.clone());
        }
        self.description(collection, &mut info);
        info.insert(
            "schema".to_string(),
            Value::String(self.variant.schema_url().to_string()),
        );
        Value::Object(info)
    }

    // -- item tree ----------------------------------------------------------

    fn items(&mut self, collection: &Value) -> Value {
        let top_folders = match collection.get("folders_order").and_then(Value::as_array) {
            Some(order) => string_ids(order),
            None => self.unclaimed_folder_ids(collection),
        };
        let top_requests = match collection.get("order").and_then(Value::as_array) {
            Some(order) => string_ids(order),
            None => self.unclaimed_request_ids(collection),
        };

        let mut items = Vec::new();
        for folder_id in &top_folders {
            if let Some(item) = self.folder_item(folder_id) {
                items.push(item);
            }
        }
        for request_id in &top_requests {
            if let Some(item) = self.request_item_by_id(request_id) {
                items.push(item);
            }
        }
        Value::Array(items)
    }

    /// Folders declared top-level by omission: every folder that no other
    /// folder claims as a child, in `folders[]` order.
    fn unclaimed_folder_ids(&self, collection: &Value) -> Vec<String> {
        let Some(folders) = collection.get("folders").and_then(Value::as_array) else {
            return Vec::new();
        };
        let mut claimed = HashSet::new();
        for folder in folders {
            if let Some(order) = folder.get("folders_order").and_then(Value::as_array) {
                for id in order.iter().filter_map(Value::as_str) {
                    claimed.insert(id);
                }
            }
        }
        folders
            .iter()
            .filter_map(|folder| get_str(folder, "id"))
            .filter(|id| !claimed.contains(id))
            .map(str::to_string)
            .collect()
    }

    /// Loose requests recovered when the collection declares no `order`:
    /// every request no folder claims, in `requests[]` order.
    fn unclaimed_request_ids(&self, collection: &Value) -> Vec<String> {
        let Some(requests) = collection.get("requests").and_then(Value::as_array) else {
            return Vec::new();
        };
        let mut claimed = HashSet::new();
        if let Some(folders) = collection.get("folders").and_then(Value::as_array) {
            for folder in folders {
                if let Some(order) = folder.get("order").and_then(Value::as_array) {
                    for id in order.iter().filter_map(Value::as_str) {
                        claimed.insert(id);
                    }
                }
            }
        }
        requests
            .iter()
            .filter_map(|request| get_str(request, "id"))
            .filter(|id| !claimed.contains(id))
            .map(str::to_string)
            .collect()
    }

    fn folder_item(&mut self, folder_id: &str) -> Option<Value> {
        if !self.consumed_folders.insert(folder_id.to_string()) {
            tracing::warn!(folder = folder_id, "skipping duplicate folder reference");
            return None;
        }
        let Some(folder) = self.folders.get(folder_id).copied() else {
            tracing::warn!(folder = folder_id, "skipping unresolvable folder reference");
            return None;
        };

        let child_folders = folder
            .get("folders_order")
            .and_then(Value::as_array)
            .map(|order| string_ids(order))
            .unwrap_or_default();
        let child_requests = folder
            .get("order")
            .and_then(Value::as_array)
            .map(|order| string_ids(order))
            .unwrap_or_default();

        let mut children = Vec::new();
        for id in &child_folders {
            if let Some(item) = self.folder_item(id) {
                children.push(item);
            }
        }
        for id in &child_requests {
            if let Some(item) = self.request_item_by_id(id) {
                children.push(item);
            }
        }

        let mut item = Map::new();
        item.insert(
            "_postman_id".to_string(),
            Value::String(self.entity_id(folder)),
        );
        if let Some(name) = folder.get("name") {
            item.insert("name".to_string(), name.clone());
        }
        self.description(folder, &mut item);
        item.insert("item".to_string(), Value::Array(children));
        if let Some(auth) = self.auth(folder) {
            item.insert("auth".to_string(), auth);
        }
        if let Some(events) = self.events(folder) {
            item.insert("event".to_string(), events);
        }
        if let Some(variables) = self.variables(folder) {
            item.insert("variable".to_string(), variables);
        }
        add_protocol_profile_behavior(folder, &mut item);
        Some(Value::Object(item))
    }

    fn request_item_by_id(&mut self, request_id: &str) -> Option<Value> {
        if !self.consumed_requests.insert(request_id.to_string()) {
            tracing::warn!(request = request_id, "skipping duplicate request reference");
            return None;
        }
        let Some(request) = self.requests.get(request_id).copied() else {
            tracing::warn!(request = request_id, "skipping unresolvable request reference");
            return None;
        };
        Some(self.request_item(request))
    }

    fn request_item(&self, request: &Value) -> Value {
        let mut item = Map::new();
        item.insert(
            "_postman_id".to_string(),
            Value::String(self.entity_id(request)),
        );
        if let Some(name) = request.get("name") {
            item.insert("name".to_string(), name.clone());
        }
        if let Some(events) = self.events(request) {
            item.insert("event".to_string(), events);
        }
        item.insert("request".to_string(), self.request(request));
        item.insert("response".to_string(), self.responses(request));
        add_protocol_profile_behavior(request, &mut item);
        Value::Object(item)
    }

    // -- request fields -----------------------------------------------------

    fn request(&self, request: &Value) -> Value {
        let mut out = Map::new();
        if let Some(url) = self.url(request) {
            out.insert("url".to_string(), url);
        }
        if let Some(method) = request.get("method") {
            out.insert("method".to_string(), method.clone());
        }
        if let Some(header) = self.header(request) {
            out.insert("header".to_string(), header);
        }
        set_or_retain(
            &mut out,
            "body",
            self.body(request),
            self.policy.retain_empty_values,
        );
        if let Some(auth) = self.auth(request) {
            out.insert("auth".to_string(), auth);
        }
        self.description(request, &mut out);
        Value::Object(out)
    }

    fn url(&self, request: &Value) -> Option<Value> {
        let raw = get_str(request, "url")?;

        let path_var_source = path_variable_source(request);
        let query_source = request
            .get("queryParams")
            .and_then(Value::as_array)
            .filter(|params| !params.is_empty());

        // v2.0 keeps a plain string unless there is structured data to carry;
        // v2.1 always re-parses into an object.
        if self.variant == Variant::V2 && path_var_source.is_none() && query_source.is_none() {
            return Some(Value::String(raw.to_string()));
        }

        let mut value = url::parse(raw).to_value();
        let obj = value.as_object_mut()?;

        if let Some(params) = query_source {
            obj.insert("query".to_string(), query_from_params(params));
        }
        let variables = path_var_source.as_ref().and_then(|source| {
            handle_vars(
                &Value::Null,
                &self.policy,
                &VarModifiers {
                    legacy: false,
                    fallback: Some(source),
                },
            )
        });
        if let Some(variables) = variables {
            obj.insert("variable".to_string(), variables);
        }

        Some(value)
    }

    fn header(&self, request: &Value) -> Option<Value> {
        if let Some(data) = request.get("headerData").and_then(Value::as_array) {
            if !data.is_empty() {
                let list: Vec<Value> = data
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
                        if is_disabled(obj) {
                            header.insert("disabled".to_string(), Value::Bool(true));
                        }
                        if let Some(description) = obj.get("description").filter(|d| !is_falsy(d))
                        {
                            header.insert("description".to_string(), description.clone());
                        }
                        Some(Value::Object(header))
                    })
                    .collect();
                return Some(Value::Array(list));
            }
        }

        let raw = get_str(request, "headers")?;
        let list: Vec<Value> = parse_header_string(raw)
            .into_iter()
            .map(|line| {
                let mut header = Map::new();
                header.insert("key".to_string(), Value::String(line.key));
                header.insert("value".to_string(), Value::String(line.value));
                if line.commented {
                    header.insert("disabled".to_string(), Value::Bool(true));
                }
                Value::Object(header)
            })
            .collect();
        (!list.is_empty()).then_some(Value::Array(list))
    }

    fn body(&self, request: &Value) -> Option<Value> {
        // An explicit `dataMode: null` means "no body" — inference only runs
        // when the field is wholly absent.
        if matches!(request.get("dataMode"), Some(Value::Null)) {
            return None;
        }

        let mode = match request.get("dataMode").and_then(Value::as_str) {
            Some(declared) => match v2_mode_for(declared) {
                Some(mode) => mode,
                None => {
                    tracing::warn!(mode = declared, "skipping body with unrecognized data mode");
                    return None;
                }
            },
            None => infer_mode(request)?,
        };

        let mut body = Map::new();
        body.insert("mode".to_string(), Value::String(mode.to_string()));
        match mode {
            "raw" => {
                body.insert("raw".to_string(), raw_mode_data(request));
            }
            "urlencoded" => {
                body.insert("urlencoded".to_string(), self.body_params(request, false));
            }
            "formdata" => {
                body.insert("formdata".to_string(), self.body_params(request, true));
            }
            "file" => {
                let src = match request.get("rawModeData") {
                    Some(Value::String(s)) => Value::String(s.clone()),
                    _ => Value::Null,
                };
                body.insert("file".to_string(), json!({ "src": src }));
            }
            "graphql" => {
                if let Some(graphql) = request.get("graphqlModeData") {
                    body.insert("graphql".to_string(), graphql.clone());
                }
            }
            _ => {}
        }
        Some(Value::Object(body))
    }

    fn body_params(&self, request: &Value, formdata: bool) -> Value {
        let Some(data) = request.get("data").and_then(Value::as_array) else {
            return Value::Array(Vec::new());
        };
        let params: Vec<Value> = data
            .iter()
            .filter_map(|entry| {
                let obj = entry.as_object()?;
                let mut param = Map::new();
                param.insert("key".to_string(), obj.get("key").cloned().unwrap_or_default());
                let param_type = obj.get("type").and_then(Value::as_str);
                if formdata && param_type == Some("file") {
                    param.insert(
                        "src".to_string(),
                        obj.get("value").cloned().unwrap_or(Value::Null),
                    );
                } else if let Some(value) = obj.get("value") {
                    param.insert("value".to_string(), value.clone());
                }
                if let Some(t) = param_type {
                    param.insert("type".to_string(), Value::String(t.to_string()));
                }
                if is_disabled(obj) {
                    param.insert("disabled".to_string(), Value::Bool(true));
                }
                if let Some(description) = obj.get("description").filter(|d| !is_falsy(d)) {
                    param.insert("description".to_string(), description.clone());
                }
                Some(Value::Object(param))
            })
            .collect();
        Value::Array(params)
    }

    // -- shared entity fields -----------------------------------------------

    fn auth(&self, entity: &Value) -> Option<Value> {
        let use_modern = (self.policy.prioritize_v2 && get_truthy(entity, "auth").is_some())
            || not_legacy(entity, LegacyKind::Auth);
        let current = if use_modern {
            clean_auth(entity.get("auth"), false)
        } else {
            auth_from_legacy(entity)
        }?;
        if current.is_null() {
            return Some(Value::Null);
        }
        match self.variant {
            Variant::V2 => auth_array_to_map(Some(&current), false),
            Variant::V21 => auth_map_to_array(Some(&current), false),
        }
    }

    fn events(&self, entity: &Value) -> Option<Value> {
        let use_modern = (self.policy.prioritize_v2 && get_truthy(entity, "events").is_some())
            || not_legacy(entity, LegacyKind::Event);
        if use_modern {
            entity
                .get("events")
                .and_then(Value::as_array)
                .filter(|events| !events.is_empty())
                .map(|events| Value::Array(events.clone()))
        } else {
            events_from_legacy(entity)
        }
    }

    fn variables(&self, entity: &Value) -> Option<Value> {
        handle_vars(entity, &self.policy, &VarModifiers::default())
    }

    // -- responses ----------------------------------------------------------

    fn responses(&self, request: &Value) -> Value {
        let Some(responses) = request.get("responses").and_then(Value::as_array) else {
            return Value::Array(Vec::new());
        };
        Value::Array(
            responses
                .iter()
                .filter(|r| r.is_object())
                .map(|r| self.response(r))
                .collect(),
        )
    }

    fn response(&self, response: &Value) -> Value {
        let mut out = Map::new();
        out.insert("id".to_string(), Value::String(self.entity_id(response)));
        if let Some(name) = response.get("name") {
            out.insert("name".to_string(), name.clone());
        }

        if let Some(original) = embedded_request(response) {
            out.insert("originalRequest".to_string(), self.request(&original));
        }

        if let Some(code) = response.get("responseCode") {
            if let Some(status) = code.get("name") {
                out.insert("status".to_string(), status.clone());
            }
            if let Some(code) = code.get("code") {
                out.insert("code".to_string(), code.clone());
            }
        }
        if let Some(language) = get_truthy(response, "language") {
            out.insert("_postman_previewlanguage".to_string(), language.clone());
        }
        if let Some(headers) = response.get("headers").filter(|h| h.is_array()) {
            out.insert("header".to_string(), headers.clone());
        }
        out.insert("cookie".to_string(), Value::Array(Vec::new()));
        if let Some(time) = response.get("time") {
            out.insert("responseTime".to_string(), time.clone());
        }
        if let Some(text) = response.get("text") {
            out.insert("body".to_string(), text.clone());
        }
        Value::Object(out)
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

fn string_ids(order: &[Value]) -> Vec<String> {
    order
        .iter()
        .filter_map(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Legacy `enabled: false` and modern `disabled: true` both mean disabled.
fn is_disabled(entry: &Map<String, Value>) -> bool {
    entry.get("disabled").is_some_and(is_truthy)
        || matches!(entry.get("enabled"), Some(Value::Bool(false)))
}

/// Path-variable data for the URL: `pathVariableData` (array) wins, falling
/// back to the older `pathVariables` map.
fn path_variable_source(request: &Value) -> Option<Value> {
    if let Some(data) = request
        .get("pathVariableData")
        .and_then(Value::as_array)
        .filter(|data| !data.is_empty())
    {
        return Some(Value::Array(data.clone()));
    }
    let map = request
        .get("pathVariables")
        .and_then(Value::as_object)
        .filter(|map| !map.is_empty())?;
    Some(Value::Array(
        map.iter()
            .map(|(key, value)| json!({ "key": key, "value": value }))
            .collect(),
    ))
}

fn query_from_params(params: &[Value]) -> Value {
    Value::Array(
        params
            .iter()
            .filter_map(|entry| {
                let obj = entry.as_object()?;
                let mut param = Map::new();
                param.insert("key".to_string(), obj.get("key").cloned().unwrap_or_default());
                param.insert(
                    "value".to_string(),
                    obj.get("value").cloned().unwrap_or_default(),
                );
                if is_disabled(obj) {
                    param.insert("disabled".to_string(), Value::Bool(true));
                }
                if let Some(description) = obj.get("description").filter(|d| !is_falsy(d)) {
                    param.insert("description".to_string(), description.clone());
                }
                Some(Value::Object(param))
            })
            .collect(),
    )
}

fn raw_mode_data(request: &Value) -> Value {
    match request.get("rawModeData") {
        Some(Value::String(s)) => Value::String(s.clone()),
        Some(Value::Array(lines)) => {
            // some legacy clients stored raw bodies pre-split into lines
            let text: Vec<&str> = lines.iter().filter_map(Value::as_str).collect();
            Value::String(text.join("\n"))
        }
        _ => Value::String(String::new()),
    }
}

/// Body-mode inference for requests with no `dataMode`: a raw string wins,
/// then array data (formdata), then graphql data; any other truthy raw
/// payload defaults to raw. `None` when there is no body data at all.
fn infer_mode(request: &Value) -> Option<&'static str> {
    if get_str(request, "rawModeData").is_some() {
        return Some("raw");
    }
    if request
        .get("data")
        .and_then(Value::as_array)
        .is_some_and(|data| !data.is_empty())
    {
        return Some("formdata");
    }
    if get_truthy(request, "graphqlModeData").is_some() {
        return Some("graphql");
    }
    if get_truthy(request, "rawModeData").is_some() {
        return Some("raw");
    }
    None
}

/// A response's embedded original request — either an inline object or a
/// JSON-encoded string (older clients stringified it).
fn embedded_request(response: &Value) -> Option<Value> {
    match response.get("request") {
        Some(Value::Object(obj)) => Some(Value::Object(obj.clone())),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(parsed @ Value::Object(_)) => Some(parsed),
            _ => {
                tracing::warn!("discarding embedded response request that failed to parse");
                None
            }
        },
        _ => None,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
