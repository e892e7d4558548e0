//! Record normalizer: brings every stored record up to the current schema.
//!
//! Older documents were written by revisions that knew fewer fields (the very
//! first feedback records carried only `id`, `message` and `created_at`). All
//! defaults live in [`SCHEMA`]; nothing else in the crate fills fields in.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::models::{
    CollectionKind, Priority, Record, RecordId, Timestamp, TicketStatus, DEFAULT_CATEGORY,
};

/// How a missing or malformed field is filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldDefault {
    /// The collection's domain text key (`message` / `query`).
    DomainText,
    EmptyText,
    Text(&'static str),
    EmptyList,
    Counter,
    Reactions,
    Priority,
    CreatedAt,
    UpdatedAt,
    OptionalTimestamp,
    Status,
    Labels,
    Replies,
    History,
    Attachments,
}

/// Schema-with-defaults table. Order matters: `updated_at` and undated
/// replies/history entries fall back to the already-normalized `created_at`.
const SCHEMA: &[(&str, FieldDefault)] = &[
    ("created_at", FieldDefault::CreatedAt),
    ("updated_at", FieldDefault::UpdatedAt),
    ("", FieldDefault::DomainText),
    ("status", FieldDefault::Status),
    ("category", FieldDefault::Text(DEFAULT_CATEGORY)),
    ("priority", FieldDefault::Priority),
    ("labels", FieldDefault::Labels),
    ("assigned_to", FieldDefault::EmptyText),
    ("admin_notes", FieldDefault::EmptyText),
    ("reactions", FieldDefault::Reactions),
    ("votes", FieldDefault::Counter),
    ("deleted_at", FieldDefault::OptionalTimestamp),
    ("replies", FieldDefault::Replies),
    ("history", FieldDefault::History),
    ("attachments", FieldDefault::Attachments),
];

const REACTION_KEYS: [&str; 3] = ["like", "helpful", "agree"];
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Normalize a decoded document (expected to be a JSON array).
///
/// A non-array document is treated as an empty collection.
pub fn normalize_document(kind: CollectionKind, document: Value, now: Timestamp) -> Vec<Record> {
    match document {
        Value::Array(items) => normalize(kind, items, now),
        other => {
            tracing::warn!(
                "{} document is not a JSON array (found {}); treating as empty",
                kind,
                json_type_name(&other)
            );
            Vec::new()
        }
    }
}

/// Normalize a raw list of record objects.
///
/// Fills every recognized field with its default when missing or malformed,
/// repairs nested replies, history entries, labels and attachments, assigns
/// ids to records without a usable (or with a duplicated) id, keeps unknown
/// keys, and drops elements that are not objects. Idempotent.
pub fn normalize(kind: CollectionKind, raw: Vec<Value>, now: Timestamp) -> Vec<Record> {
    let mut objects: Vec<Map<String, Value>> = Vec::with_capacity(raw.len());
    for (index, item) in raw.into_iter().enumerate() {
        match item {
            Value::Object(map) => objects.push(map),
            other => tracing::warn!(
                "Dropping {} entry {} that is not an object ({})",
                kind,
                index,
                json_type_name(&other)
            ),
        }
    }

    assign_ids(&mut objects);

    objects
        .into_iter()
        .filter_map(|mut object| {
            for (key, default) in SCHEMA {
                apply_default(kind, &mut object, key, *default, now);
            }
            // The other collection's text key must not pick the body variant.
            let foreign_key = foreign_text_key(kind);
            let foreign_text = object.remove(foreign_key);
            let id = object.get("id").cloned();
            match serde_json::from_value::<Record>(Value::Object(object)) {
                Ok(mut record) => {
                    if let Some(value) = foreign_text {
                        record.extra.insert(foreign_key.to_string(), value);
                    }
                    Some(record)
                }
                Err(error) => {
                    tracing::warn!("Dropping malformed {} record {:?}: {}", kind, id, error);
                    None
                }
            }
        })
        .collect()
}

/// Give every object a unique positive integer id. Existing unique ids are
/// kept; missing, invalid, or repeated ids get `max + 1`, `max + 2`, ...
fn assign_ids(objects: &mut [Map<String, Value>]) {
    let mut next = objects
        .iter()
        .filter_map(|object| object.get("id").and_then(Value::as_u64))
        .max()
        .map_or(RecordId::new(1), |max| RecordId::new(max).next());

    let mut seen = HashSet::new();
    for object in objects.iter_mut() {
        let existing = object.get("id").and_then(Value::as_u64);
        let keep = existing.is_some_and(|id| id > 0 && seen.insert(id));
        if !keep {
            tracing::warn!("Assigning id {} to record with id {:?}", next, existing);
            object.insert("id".to_string(), json!(next.get()));
            seen.insert(next.get());
            next = next.next();
        }
    }
}

fn apply_default(
    kind: CollectionKind,
    object: &mut Map<String, Value>,
    key: &str,
    default: FieldDefault,
    now: Timestamp,
) {
    let key = match default {
        FieldDefault::DomainText => kind.text_key(),
        _ => key,
    };
    let current = object.get(key);
    let record_created_at = || {
        object
            .get("created_at")
            .cloned()
            .unwrap_or_else(|| json!(now.to_string()))
    };

    let replacement = match default {
        FieldDefault::DomainText | FieldDefault::EmptyText => {
            (!current.is_some_and(Value::is_string)).then(|| json!(""))
        }
        FieldDefault::Text(fallback) => {
            let usable = current
                .and_then(Value::as_str)
                .is_some_and(|text| !text.trim().is_empty());
            (!usable).then(|| json!(fallback))
        }
        FieldDefault::EmptyList => (!current.is_some_and(Value::is_array)).then(|| json!([])),
        FieldDefault::Counter => (!current.is_some_and(is_counter)).then(|| json!(0)),
        FieldDefault::Reactions => normalize_reactions(current),
        FieldDefault::Priority => {
            let valid = current
                .and_then(Value::as_str)
                .is_some_and(|value| Priority::ALL.iter().any(|p| p.as_str() == value));
            (!valid).then(|| json!(Priority::default().as_str()))
        }
        FieldDefault::CreatedAt => {
            (!current.is_some_and(is_timestamp)).then(|| json!(now.to_string()))
        }
        FieldDefault::UpdatedAt => (!current.is_some_and(is_timestamp)).then(record_created_at),
        FieldDefault::OptionalTimestamp => {
            let valid = current.is_some_and(|value| value.is_null() || is_timestamp(value));
            (!valid).then(|| Value::Null)
        }
        FieldDefault::Status => {
            let valid = current
                .and_then(Value::as_str)
                .is_some_and(|value| TicketStatus::ALL.iter().any(|s| s.as_str() == value));
            match (valid, kind.default_status()) {
                (true, _) => None,
                (false, Some(status)) => Some(json!(status.as_str())),
                (false, None) => {
                    object.remove(key);
                    None
                }
            }
        }
        FieldDefault::Labels => repair_list(current, repair_label),
        FieldDefault::Replies => {
            let fallback_at = record_created_at();
            repair_list(current, |entry| repair_reply(entry, &fallback_at))
        }
        FieldDefault::History => {
            let fallback_at = record_created_at();
            repair_list(current, |entry| repair_history_entry(entry, &fallback_at))
        }
        FieldDefault::Attachments => repair_list(current, repair_attachment),
    };

    if let Some(value) = replacement {
        object.insert(key.to_string(), value);
    }
}

const fn foreign_text_key(kind: CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Feedback => CollectionKind::Tickets.text_key(),
        CollectionKind::Tickets => CollectionKind::Feedback.text_key(),
    }
}

/// Repair each element of a nested list, dropping elements beyond repair.
/// Returns `None` when the list is already in shape.
fn repair_list(
    current: Option<&Value>,
    repair: impl Fn(&Value) -> Option<Value>,
) -> Option<Value> {
    let Some(Value::Array(items)) = current else {
        return Some(json!([]));
    };

    let repaired = items.iter().filter_map(repair).collect::<Vec<_>>();
    (repaired != *items).then_some(Value::Array(repaired))
}

fn repair_label(label: &Value) -> Option<Value> {
    match label {
        Value::String(_) => Some(label.clone()),
        Value::Number(number) => Some(json!(number.to_string())),
        Value::Bool(flag) => Some(json!(flag.to_string())),
        _ => None,
    }
}

fn repair_reply(reply: &Value, fallback_at: &Value) -> Option<Value> {
    let mut reply = match reply {
        Value::Object(fields) => fields.clone(),
        Value::String(message) => {
            let mut fields = Map::new();
            fields.insert("message".to_string(), json!(message));
            fields
        }
        _ => return None,
    };
    fill_text(&mut reply, "message", "");
    fill_timestamp(&mut reply, "created_at", fallback_at);
    Some(Value::Object(reply))
}

fn repair_history_entry(entry: &Value, fallback_at: &Value) -> Option<Value> {
    let mut entry = entry.as_object()?.clone();
    fill_text(&mut entry, "action", "");
    fill_text(&mut entry, "author", "");
    fill_timestamp(&mut entry, "at", fallback_at);
    Some(Value::Object(entry))
}

fn repair_attachment(attachment: &Value) -> Option<Value> {
    let mut attachment = attachment.as_object()?.clone();
    fill_text(&mut attachment, "filename", "");
    fill_text(&mut attachment, "content_base64", "");
    fill_text(&mut attachment, "type", FALLBACK_CONTENT_TYPE);
    Some(Value::Object(attachment))
}

fn fill_text(fields: &mut Map<String, Value>, key: &str, fallback: &str) {
    if !fields.get(key).is_some_and(Value::is_string) {
        fields.insert(key.to_string(), json!(fallback));
    }
}

fn fill_timestamp(fields: &mut Map<String, Value>, key: &str, fallback: &Value) {
    if !fields.get(key).is_some_and(is_timestamp) {
        fields.insert(key.to_string(), fallback.clone());
    }
}

fn normalize_reactions(current: Option<&Value>) -> Option<Value> {
    let Some(Value::Object(existing)) = current else {
        return Some(json!({"like": 0, "helpful": 0, "agree": 0}));
    };

    let complete = REACTION_KEYS
        .iter()
        .all(|key| existing.get(*key).is_some_and(is_counter));
    if complete {
        return None;
    }

    let mut fixed = existing.clone();
    for key in REACTION_KEYS {
        if !fixed.get(key).is_some_and(is_counter) {
            fixed.insert(key.to_string(), json!(0));
        }
    }
    Some(Value::Object(fixed))
}

fn is_counter(value: &Value) -> bool {
    value
        .as_u64()
        .is_some_and(|count| u32::try_from(count).is_ok())
}

fn is_timestamp(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|text| Timestamp::parse(text).is_ok())
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
