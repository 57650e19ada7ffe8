//! Property tests for the record codec.
//!
//! For every kind and every revision it has declared, a record encoded at
//! that revision decodes to the same values for the fields that revision
//! knows, and to the declared defaults for everything newer.

use linkstore_codec::{decode_with_schema, encode, encode_at};
use linkstore_model::{CollectionType, Entity, EntitySchema, FieldType, FieldValue, kinds};
use proptest::prelude::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 _\u{e9}\u{1F600}]{0,24}").unwrap()
}

fn value_strategy(ty: FieldType, nullable: bool) -> BoxedStrategy<FieldValue> {
    let value = match ty {
        FieldType::Text => text_strategy().prop_map(FieldValue::Text).boxed(),
        FieldType::Int => any::<i64>().prop_map(FieldValue::Int).boxed(),
        FieldType::Float => (-1.0e12f64..1.0e12).prop_map(FieldValue::Float).boxed(),
        FieldType::Bool => any::<bool>().prop_map(FieldValue::Bool).boxed(),
        FieldType::Timestamp => any::<i64>().prop_map(FieldValue::Timestamp).boxed(),
        FieldType::List => prop::collection::vec(text_strategy(), 0..5)
            .prop_map(FieldValue::List)
            .boxed(),
    };
    if nullable {
        prop_oneof![Just(FieldValue::Null), value].boxed()
    } else {
        value
    }
}

fn entity_strategy(schema: EntitySchema) -> impl Strategy<Value = Entity> {
    let specs: Vec<_> = schema
        .fields
        .iter()
        .map(|f| (f.name.clone(), value_strategy(f.field_type, f.is_nullable())))
        .collect();
    let names: Vec<String> = specs.iter().map(|(n, _)| n.clone()).collect();
    let values: Vec<_> = specs.into_iter().map(|(_, s)| s).collect();
    (
        "[a-z0-9]{1,12}",
        values,
        prop::collection::vec("[a-z0-9]{1,6}", 0..6),
        prop::option::of("[a-z0-9]{1,6}"),
    )
        .prop_map(move |(id, values, ids, author)| {
            let mut entity = Entity::new(schema.collection, id, schema.version);
            for (name, value) in names.iter().zip(values) {
                entity.fields.insert(name.clone(), value);
            }
            entity.add_link_array("related", ids, CollectionType::Posts);
            if let Some(author) = author {
                entity.add_link_object("author", author, CollectionType::Users);
            }
            entity
        })
}

fn kind_strategy() -> impl Strategy<Value = EntitySchema> {
    prop::sample::select(kinds::all().into_iter().map(|(s, _)| s).collect::<Vec<_>>())
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn current_revision_round_trips(entity in kind_strategy().prop_flat_map(entity_strategy)) {
        let schema = kinds::all()
            .into_iter()
            .map(|(s, _)| s)
            .find(|s| s.collection == entity.collection)
            .unwrap();
        let decoded = decode_with_schema(&encode(&entity, &schema), &schema).unwrap();
        prop_assert_eq!(decoded, entity);
    }

    #[test]
    fn every_revision_round_trips_known_fields_and_defaults_the_rest(
        (entity, version) in kind_strategy()
            .prop_flat_map(|s| {
                let max = s.version;
                (entity_strategy(s), 1..=max)
            })
    ) {
        let schema = kinds::all()
            .into_iter()
            .map(|(s, _)| s)
            .find(|s| s.collection == entity.collection)
            .unwrap();
        let decoded = decode_with_schema(&encode_at(&entity, &schema, version), &schema).unwrap();

        prop_assert_eq!(decoded.version, version);
        prop_assert_eq!(&decoded.links, &entity.links);
        for spec in &schema.fields {
            let got = decoded.field(&spec.name);
            if spec.since <= version {
                prop_assert_eq!(got, entity.field(&spec.name), "field {}", spec.name);
            } else {
                prop_assert_eq!(got, Some(&spec.default), "field {}", spec.name);
            }
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_with_schema(&bytes, &kinds::posts());
    }
}
