//! Decoding raw API resources into entities.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::link::id_string;
use crate::{Entity, EntitySchema, FieldSpec, FieldType, FieldValue, LinkDescriptor};

/// Why a raw resource could not become an entity. Either way the record is
/// skipped and the rest of its batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("resource has no usable id")]
    MissingId,

    #[error("resource is not a JSON object")]
    NotAnObject,
}

/// Extracts a resource's `id`. String ids are taken as-is; integer ids are
/// rendered in decimal. Empty strings and other JSON types are rejected.
pub fn extract_id(raw: &Map<String, Value>) -> Option<String> {
    raw.get("id").and_then(id_string)
}

/// Generic schema-driven decoder used by most collections.
///
/// Every declared field is read from its JSON pointer. Missing or mistyped
/// values fall back to the field's default, so a decoder never rejects a
/// record for anything other than a missing id. The result is stamped with
/// the schema's current revision.
pub fn decode_object(schema: &EntitySchema, raw: &Map<String, Value>) -> Result<Entity, DecodeError> {
    let id = extract_id(raw).ok_or(DecodeError::MissingId)?;
    let mut entity = Entity::new(schema.collection, id, schema.version);

    for spec in &schema.fields {
        let value = lookup(raw, &spec.json_path)
            .and_then(|v| json_to_field(spec, v))
            .unwrap_or_else(|| spec.default.clone());
        entity.fields.insert(spec.name.clone(), value);
    }

    if let Some(Value::Object(links)) = raw.get("links") {
        for (relation, value) in links {
            match LinkDescriptor::from_json(relation, value) {
                Some(link) => {
                    entity.links.insert(relation.clone(), link);
                }
                None => debug!("Ignoring unreadable link {} on {}", relation, entity.key()),
            }
        }
    }

    Ok(entity)
}

/// Resolves a JSON pointer against a borrowed object: the first segment
/// through the map, the rest through [`Value::pointer`].
fn lookup<'a>(raw: &'a Map<String, Value>, pointer: &str) -> Option<&'a Value> {
    let path = pointer.strip_prefix('/')?;
    let (head, rest) = match path.find('/') {
        Some(i) => path.split_at(i),
        None => (path, ""),
    };
    let key = head.replace("~1", "/").replace("~0", "~");
    raw.get(&key)?.pointer(rest)
}

/// Converts a JSON value into a field value of the declared type.
/// Returns `None` when the value is absent, `null` on a non-nullable field,
/// or of the wrong shape.
fn json_to_field(spec: &FieldSpec, value: &Value) -> Option<FieldValue> {
    if value.is_null() {
        return spec.is_nullable().then_some(FieldValue::Null);
    }
    match spec.field_type {
        FieldType::Text => value.as_str().map(|s| FieldValue::Text(s.to_string())),
        FieldType::Int => value.as_i64().map(FieldValue::Int),
        FieldType::Float => value.as_f64().map(FieldValue::Float),
        FieldType::Bool => value.as_bool().map(FieldValue::Bool),
        FieldType::Timestamp => value.as_i64().map(FieldValue::Timestamp),
        FieldType::List => value
            .as_array()
            .map(|items| FieldValue::List(items.iter().filter_map(id_string).collect())),
    }
}
