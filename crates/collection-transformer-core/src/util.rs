//! Field-normalization helpers shared by the converter and normalizer
//! engines.
//!
//! These are the small per-field rules that make partially-legacy documents
//! converge: empty-description handling, variable-list canonicalization,
//! raw header strings ⇄ structured lists, legacy script strings ⇄ event
//! arrays, and the "is this entity still legacy" tie-break.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::config::Policy;
use crate::uid::uid;

// ---------------------------------------------------------------------------
// Truthiness
// ---------------------------------------------------------------------------

/// Document-level falsiness: `null`, `false`, `0`, and `""` count as empty.
/// Arrays and objects are never falsy, even when empty.
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    !is_falsy(value)
}

/// Fetch a field only if it is present and truthy.
pub(crate) fn get_truthy<'a>(entity: &'a Value, field: &str) -> Option<&'a Value> {
    entity.get(field).filter(|v| is_truthy(v))
}

pub(crate) fn get_str<'a>(entity: &'a Value, field: &str) -> Option<&'a str> {
    get_truthy(entity, field).and_then(Value::as_str)
}

// ---------------------------------------------------------------------------
// Empty-value policy
// ---------------------------------------------------------------------------

/// If `field` is present and falsy, delete it — or pin it to explicit `null`
/// when `retain_empty` is set. The uniform empty-description policy applied
/// across all entity types.
pub fn clean_empty_value(entity: &mut Map<String, Value>, field: &str, retain_empty: bool) {
    if let Some(value) = entity.get(field) {
        if is_falsy(value) {
            if retain_empty {
                entity.insert(field.to_string(), Value::Null);
            } else {
                entity.remove(field);
            }
        }
    }
}

/// Insert `field: value` when `Some`, or `field: null` under the
/// retain-empty policy; otherwise leave the field out entirely.
pub(crate) fn set_or_retain(
    entity: &mut Map<String, Value>,
    field: &str,
    value: Option<Value>,
    retain_empty: bool,
) {
    match value {
        Some(value) => {
            entity.insert(field.to_string(), value);
        }
        None if retain_empty => {
            entity.insert(field.to_string(), Value::Null);
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Variable lists
// ---------------------------------------------------------------------------

/// Per-call modifiers for [`handle_vars`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VarModifiers<'a> {
    /// Also consult the legacy `pathVariableData` field on the entity.
    pub legacy: bool,
    /// Fallback list used when the entity defines no variables of its own.
    pub fallback: Option<&'a Value>,
}

/// Canonicalize an entity's variable list.
///
/// Reads `variables`/`variable` (and, in legacy mode, `pathVariableData`),
/// falling back to the modifier list and then the options-supplied `env`.
/// Each entry gets an `id` (generated unless `no_defaults`), a `key`
/// (falling back to the id), its `value`, a `type` with `'text'` mapped to
/// `'string'`, `disabled` only when truthy, and a `description` under the
/// clean-empty policy.
///
/// Returns `None` when the resulting list is empty — callers must not set
/// the field in that case.
pub fn handle_vars(
    entity: &Value,
    policy: &Policy<'_>,
    modifiers: &VarModifiers<'_>,
) -> Option<Value> {
    let source = entity
        .get("variables")
        .filter(|v| v.is_array())
        .or_else(|| entity.get("variable").filter(|v| v.is_array()))
        .or_else(|| {
            if modifiers.legacy {
                entity.get("pathVariableData").filter(|v| v.is_array())
            } else {
                None
            }
        })
        .or_else(|| modifiers.fallback.filter(|v| v.is_array()))
        .or_else(|| policy.env.filter(|v| v.is_array()))?;

    let mut out = Vec::new();
    for item in source.as_array()?.iter() {
        let Some(obj) = item.as_object() else {
            continue;
        };

        let mut var = Map::new();
        let id = match obj.get("id").and_then(Value::as_str).filter(|s| !s.is_empty()) {
            Some(id) => Some(id.to_string()),
            None if policy.no_defaults => None,
            None => Some(uid()),
        };
        if let Some(id) = &id {
            var.insert("id".to_string(), Value::String(id.clone()));
        }
        match obj.get("key").and_then(Value::as_str) {
            Some(key) => {
                var.insert("key".to_string(), Value::String(key.to_string()));
            }
            None => {
                if let Some(id) = &id {
                    var.insert("key".to_string(), Value::String(id.clone()));
                }
            }
        }
        if let Some(value) = obj.get("value") {
            var.insert("value".to_string(), value.clone());
        }
        match obj.get("type").and_then(Value::as_str) {
            Some("text") => {
                var.insert("type".to_string(), Value::String("string".to_string()));
            }
            Some(t) => {
                var.insert("type".to_string(), Value::String(t.to_string()));
            }
            None => {}
        }
        if obj.get("disabled").is_some_and(is_truthy) {
            var.insert("disabled".to_string(), Value::Bool(true));
        }
        match obj.get("description") {
            Some(d) if !is_falsy(d) => {
                var.insert("description".to_string(), d.clone());
            }
            Some(_) if policy.retain_empty_values => {
                var.insert("description".to_string(), Value::Null);
            }
            _ => {}
        }
        out.push(Value::Object(var));
    }

    (!out.is_empty()).then_some(Value::Array(out))
}

// ---------------------------------------------------------------------------
// Header strings
// ---------------------------------------------------------------------------

/// One parsed line of a raw `headers` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    pub key: String,
    pub value: String,
    /// Line was `//`-commented out in the raw string.
    pub commented: bool,
}

static HEADER_LINE_RE: OnceLock<Regex> = OnceLock::new();

fn header_line_re() -> &'static Regex {
    HEADER_LINE_RE.get_or_init(|| {
        Regex::new(r"^\s*(//\s*)?([^:]+?)\s*:\s*(.*?)\s*$").expect("header line pattern")
    })
}

/// Parse a raw multi-line header string. Lines without a `:` are skipped;
/// `// Key: Value` lines parse as commented-out entries.
pub fn parse_header_string(raw: &str) -> Vec<HeaderLine> {
    raw.lines()
        .filter_map(|line| {
            let caps = header_line_re().captures(line)?;
            Some(HeaderLine {
                key: caps[2].to_string(),
                value: caps[3].to_string(),
                commented: caps.get(1).is_some(),
            })
        })
        .collect()
}

/// Compose a raw header string from a structured header list. Entries marked
/// `disabled` (or legacy `enabled: false`) become `//`-commented lines.
pub fn build_header_string(headers: &[Value]) -> String {
    headers
        .iter()
        .filter_map(|header| {
            let obj = header.as_object()?;
            let key = obj.get("key").and_then(Value::as_str).unwrap_or("");
            let value = obj.get("value").and_then(Value::as_str).unwrap_or("");
            let disabled = obj.get("disabled").is_some_and(is_truthy)
                || matches!(obj.get("enabled"), Some(Value::Bool(false)));
            Some(if disabled {
                format!("// {}: {}", key, value)
            } else {
                format!("{}: {}", key, value)
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Scripts
// ---------------------------------------------------------------------------

/// Build one event entry from a legacy multi-line script source.
pub fn script_event(listen: &str, source: &str) -> Value {
    json!({
        "listen": listen,
        "script": {
            "type": "text/javascript",
            "exec": source.split('\n').collect::<Vec<_>>(),
        }
    })
}

/// Build a modern event array from legacy `preRequestScript`/`tests` fields.
/// Returns `None` when neither is present.
pub fn events_from_legacy(entity: &Value) -> Option<Value> {
    let mut events = Vec::new();
    if let Some(script) = get_str(entity, "preRequestScript") {
        events.push(script_event("prerequest", script));
    }
    if let Some(script) = get_str(entity, "tests") {
        events.push(script_event("test", script));
    }
    (!events.is_empty()).then_some(Value::Array(events))
}

/// Aggregate every event with the given `listen` kind back into one legacy
/// script string, joining multiple scripts (and their lines) with `\n`.
pub fn aggregate_script(events: &Value, listen: &str) -> Option<String> {
    let events = events.as_array()?;
    let mut chunks = Vec::new();
    for event in events {
        if event.get("listen").and_then(Value::as_str) != Some(listen) {
            continue;
        }
        match event.get("script").and_then(|s| s.get("exec")) {
            Some(Value::Array(lines)) => {
                let text: Vec<&str> = lines.iter().filter_map(Value::as_str).collect();
                chunks.push(text.join("\n"));
            }
            Some(Value::String(source)) => chunks.push(source.clone()),
            _ => {}
        }
    }
    (!chunks.is_empty()).then(|| chunks.join("\n"))
}

// ---------------------------------------------------------------------------
// Legacy detection
// ---------------------------------------------------------------------------

/// Which legacy representation to test for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyKind {
    Event,
    Auth,
}

/// True when the entity already uses the modern representation exclusively.
///
/// - `Event`: neither `tests` nor `preRequestScript` is present.
/// - `Auth`: an `auth` field exists and neither `currentHelper` nor
///   `helperAttributes` is present.
///
/// Used as the tie-break for which representation is authoritative; the
/// `prioritize_v2` option overrides it when both are present.
pub fn not_legacy(entity: &Value, kind: LegacyKind) -> bool {
    match kind {
        LegacyKind::Event => {
            get_truthy(entity, "tests").is_none()
                && get_truthy(entity, "preRequestScript").is_none()
        }
        LegacyKind::Auth => {
            entity.get("auth").is_some()
                && get_truthy(entity, "currentHelper").is_none()
                && get_truthy(entity, "helperAttributes").is_none()
        }
    }
}

// ---------------------------------------------------------------------------
// Behavior flags
// ---------------------------------------------------------------------------

/// Copy the opaque `protocolProfileBehavior` bag across when the source
/// carries one as a non-null object. Returns whether a copy happened.
pub fn add_protocol_profile_behavior(source: &Value, destination: &mut Map<String, Value>) -> bool {
    match source.get("protocolProfileBehavior") {
        Some(Value::Object(behavior)) => {
            destination.insert(
                "protocolProfileBehavior".to_string(),
                Value::Object(behavior.clone()),
            );
            true
        }
        _ => false,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
