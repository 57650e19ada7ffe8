use linkstore_model::{CollectionType, Entity, EntitySchema, FieldSpec, FieldValue, LinkDescriptor, Registry};
use linkstore_types::Version;
use tracing::warn;

use crate::error::CodecError;
use crate::limits::{MAX_FIELDS, MAX_LINKS, MAX_LIST_LEN, MAX_STRING_LEN};
use crate::primitives::{Reader, Writer};
use crate::FORMAT;

const TAG_NULL: u8 = 0x00;
const TAG_BOOL: u8 = 0x01;
const TAG_INT: u8 = 0x02;
const TAG_FLOAT: u8 = 0x03;
const TAG_TEXT: u8 = 0x04;
const TAG_TIMESTAMP: u8 = 0x05;
const TAG_LIST: u8 = 0x06;

const LINK_OBJECT: u8 = 0x00;
const LINK_ARRAY: u8 = 0x01;

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes `entity` at the schema's current revision.
pub fn encode(entity: &Entity, schema: &EntitySchema) -> Vec<u8> {
    encode_at(entity, schema, schema.version)
}

/// Encodes `entity` as a record of revision `version`, writing only the
/// fields that existed at that revision.
///
/// Fields missing from the entity, or holding a value their declaration
/// does not allow, are written as the declared default. Fields the schema
/// does not declare are not persisted.
pub fn encode_at(entity: &Entity, schema: &EntitySchema, version: Version) -> Vec<u8> {
    debug_assert_eq!(entity.collection, schema.collection, "encoding with another kind's schema");

    let mut w = Writer::with_capacity(64 + entity.id.len());
    w.write_byte(FORMAT);
    w.write_varint(u64::from(version));
    w.write_string(entity.collection.as_str());
    w.write_string(&entity.id);

    let specs: Vec<&FieldSpec> = schema.fields_at(version).collect();
    w.write_varint(specs.len() as u64);
    for spec in specs {
        let value = match entity.field(&spec.name) {
            Some(v) if storable(spec, v) => v,
            Some(_) => {
                warn!("Field {} on {} does not match its declaration; storing default", spec.name, entity.key());
                &spec.default
            }
            None => &spec.default,
        };
        write_value(&mut w, value);
    }

    w.write_varint(entity.links.len() as u64);
    for (relation, link) in &entity.links {
        w.write_string(relation);
        match link {
            LinkDescriptor::Object { id, collection } => {
                w.write_byte(LINK_OBJECT);
                w.write_string(collection.as_str());
                w.write_string(id);
            }
            LinkDescriptor::Array { ids, collection } => {
                w.write_byte(LINK_ARRAY);
                w.write_string(collection.as_str());
                w.write_string_vec(ids);
            }
        }
    }

    w.into_bytes()
}

fn storable(spec: &FieldSpec, value: &FieldValue) -> bool {
    match value {
        FieldValue::Null => spec.is_nullable(),
        FieldValue::Float(f) if f.is_nan() => false,
        v => v.conforms_to(spec.field_type),
    }
}

fn write_value(w: &mut Writer, value: &FieldValue) {
    match value {
        FieldValue::Null => w.write_byte(TAG_NULL),
        FieldValue::Bool(b) => {
            w.write_byte(TAG_BOOL);
            w.write_byte(u8::from(*b));
        }
        FieldValue::Int(v) => {
            w.write_byte(TAG_INT);
            w.write_signed_varint(*v);
        }
        FieldValue::Float(v) => {
            w.write_byte(TAG_FLOAT);
            w.write_f64(*v);
        }
        FieldValue::Text(s) => {
            w.write_byte(TAG_TEXT);
            w.write_string(s);
        }
        FieldValue::Timestamp(v) => {
            w.write_byte(TAG_TIMESTAMP);
            w.write_signed_varint(*v);
        }
        FieldValue::List(items) => {
            w.write_byte(TAG_LIST);
            w.write_string_vec(items);
        }
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Reads a record's revision and collection without decoding the body.
pub fn peek_header(bytes: &[u8]) -> Result<(Version, CollectionType), CodecError> {
    read_header(&mut Reader::new(bytes))
}

/// Decodes a record, finding its schema in `registry`.
pub fn decode(bytes: &[u8], registry: &Registry) -> Result<Entity, CodecError> {
    let (_, collection) = peek_header(bytes)?;
    let schema = registry
        .schema_for(collection)
        .ok_or_else(|| linkstore_types::Error::UnknownCollection(collection.to_string()))?;
    decode_with_schema(bytes, schema)
}

/// Decodes a record of `schema`'s collection.
///
/// Fields introduced after the record's revision take their declared
/// defaults. Trailing fields from a newer revision are skipped. The
/// returned entity keeps the revision it was stored at.
pub fn decode_with_schema(bytes: &[u8], schema: &EntitySchema) -> Result<Entity, CodecError> {
    let mut r = Reader::new(bytes);
    let (version, collection) = read_header(&mut r)?;
    if collection != schema.collection {
        return Err(CodecError::CollectionMismatch {
            expected: schema.collection.to_string(),
            found: collection.to_string(),
        });
    }
    let id = r.read_string(MAX_STRING_LEN, "id")?;
    let mut entity = Entity::new(collection, id, version);

    let count = r.read_len(MAX_FIELDS, "field count")?;
    let expected = schema.fields_at(version).count();
    if count < expected {
        return Err(CodecError::MissingFields {
            version,
            found: count,
            expected,
        });
    }
    for i in 0..count {
        let value = read_value(&mut r)?;
        let Some(spec) = schema.fields.get(i) else {
            continue;
        };
        if !value.conforms_to(spec.field_type) {
            return Err(CodecError::FieldTypeMismatch {
                field: spec.name.clone(),
            });
        }
        entity.fields.insert(spec.name.clone(), value);
    }
    for spec in schema.fields.iter().skip(count) {
        entity.fields.insert(spec.name.clone(), spec.default.clone());
    }

    let link_count = r.read_len(MAX_LINKS, "link count")?;
    for _ in 0..link_count {
        let relation = r.read_string(MAX_STRING_LEN, "relation")?;
        let kind = r.read_byte("link kind")?;
        let collection: CollectionType = r.read_string(MAX_STRING_LEN, "link collection")?.parse()?;
        let link = match kind {
            LINK_OBJECT => LinkDescriptor::Object {
                id: r.read_string(MAX_STRING_LEN, "link id")?,
                collection,
            },
            LINK_ARRAY => LinkDescriptor::Array {
                ids: r.read_string_vec(MAX_LIST_LEN, MAX_STRING_LEN, "link ids")?,
                collection,
            },
            kind => return Err(CodecError::InvalidLinkKind { kind }),
        };
        entity.links.insert(relation, link);
    }

    if !r.is_empty() {
        return Err(CodecError::TrailingBytes(r.remaining_len()));
    }
    Ok(entity)
}

fn read_header(r: &mut Reader<'_>) -> Result<(Version, CollectionType), CodecError> {
    let format = r.read_byte("format")?;
    if format != FORMAT {
        return Err(CodecError::UnsupportedFormat { found: format });
    }
    let raw = r.read_varint("version")?;
    let version = Version::try_from(raw)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(linkstore_types::Error::InvalidVersion(raw.min(u64::from(u32::MAX)) as u32))?;
    let collection = r.read_string(MAX_STRING_LEN, "collection")?.parse()?;
    Ok((version, collection))
}

fn read_value(r: &mut Reader<'_>) -> Result<FieldValue, CodecError> {
    let tag = r.read_byte("field tag")?;
    Ok(match tag {
        TAG_NULL => FieldValue::Null,
        TAG_BOOL => match r.read_byte("bool")? {
            0 => FieldValue::Bool(false),
            1 => FieldValue::Bool(true),
            _ => return Err(CodecError::InvalidFieldTag { tag }),
        },
        TAG_INT => FieldValue::Int(r.read_signed_varint("int")?),
        TAG_FLOAT => FieldValue::Float(r.read_f64("float")?),
        TAG_TEXT => FieldValue::Text(r.read_string(MAX_STRING_LEN, "text")?),
        TAG_TIMESTAMP => FieldValue::Timestamp(r.read_signed_varint("timestamp")?),
        TAG_LIST => FieldValue::List(r.read_string_vec(MAX_LIST_LEN, MAX_STRING_LEN, "list")?),
        tag => return Err(CodecError::InvalidFieldTag { tag }),
    })
}
