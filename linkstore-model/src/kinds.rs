//! Schema tables for every entity kind the feed client stores.
//!
//! Appending a field means bumping the kind's revision and declaring the
//! field `.since(new_revision)`; records written before the bump decode
//! with the field's default.

use linkstore_types::CollectionType;
use serde_json::{Map, Value};

use crate::{DecodeError, DecodeFn, Entity, EntitySchema, FieldSpec, decode_object};

/// Every kind with its decoder, in registration order.
pub fn all() -> Vec<(EntitySchema, DecodeFn)> {
    vec![
        (users(), decode_object as DecodeFn),
        (posts(), decode_authored as DecodeFn),
        (comments(), decode_authored as DecodeFn),
        (categories(), decode_object as DecodeFn),
        (tags(), decode_object as DecodeFn),
        (images(), decode_object as DecodeFn),
        (notifications(), decode_object as DecodeFn),
        (messages(), decode_message as DecodeFn),
    ]
}

pub fn users() -> EntitySchema {
    EntitySchema::new(CollectionType::Users, 3)
        .field(FieldSpec::text("username"))
        .field(FieldSpec::text("display_name").keep_existing())
        .field(FieldSpec::text("avatar_url").keep_existing())
        .field(FieldSpec::text("bio").keep_existing().since(2))
        .field(FieldSpec::int("follower_count").since(2))
        .field(FieldSpec::int("following_count").since(2))
        .field(FieldSpec::bool("verified").since(3))
        .protect_link("followed_categories")
}

pub fn posts() -> EntitySchema {
    EntitySchema::new(CollectionType::Posts, 2)
        .field(FieldSpec::text("title"))
        .field(FieldSpec::text("body"))
        .field(FieldSpec::text("author_id").nullable())
        .field(FieldSpec::timestamp("created_at"))
        .field(FieldSpec::int("like_count"))
        .field(FieldSpec::int("comment_count"))
        .field(FieldSpec::bool("liked").at("/viewer/liked"))
        .field(FieldSpec::text("excerpt").keep_existing().since(2))
        .field(FieldSpec::list("tag_names").since(2))
        .protect_link("comments")
        .protect_link("images")
        .protect_link("tags")
}

pub fn comments() -> EntitySchema {
    EntitySchema::new(CollectionType::Comments, 2)
        .field(FieldSpec::text("body"))
        .field(FieldSpec::text("author_id").nullable())
        .field(FieldSpec::text("post_id").nullable())
        .field(FieldSpec::timestamp("created_at"))
        .field(FieldSpec::int("like_count"))
        .field(FieldSpec::bool("edited").since(2))
        .protect_link("replies")
}

pub fn categories() -> EntitySchema {
    EntitySchema::new(CollectionType::Categories, 1)
        .field(FieldSpec::text("name"))
        .field(FieldSpec::text("slug"))
        .field(FieldSpec::text("description").keep_existing())
        .field(FieldSpec::int("post_count"))
        .protect_link("posts")
}

pub fn tags() -> EntitySchema {
    EntitySchema::new(CollectionType::Tags, 1)
        .field(FieldSpec::text("name"))
        .field(FieldSpec::int("usage_count"))
}

pub fn images() -> EntitySchema {
    EntitySchema::new(CollectionType::Images, 2)
        .field(FieldSpec::text("url"))
        .field(FieldSpec::int("width"))
        .field(FieldSpec::int("height"))
        .field(FieldSpec::text("alt_text").keep_existing().since(2))
}

pub fn notifications() -> EntitySchema {
    EntitySchema::new(CollectionType::Notifications, 1)
        .field(FieldSpec::text("kind"))
        .field(FieldSpec::text("message").nullable())
        .field(FieldSpec::bool("read"))
        .field(FieldSpec::timestamp("created_at"))
}

pub fn messages() -> EntitySchema {
    EntitySchema::new(CollectionType::Messages, 2)
        .field(FieldSpec::text("body"))
        .field(FieldSpec::text("sender_id").nullable())
        .field(FieldSpec::timestamp("created_at"))
        .field(FieldSpec::timestamp("read_at").nullable().since(2))
}

/// Posts and comments: when the payload has no explicit `links.author`,
/// derive it from the flat `author_id` attribute.
fn decode_authored(schema: &EntitySchema, raw: &Map<String, Value>) -> Result<Entity, DecodeError> {
    let mut entity = decode_object(schema, raw)?;
    link_from_field(&mut entity, "author", "author_id", CollectionType::Users);
    Ok(entity)
}

/// Messages: `links.sender` from `sender_id`.
fn decode_message(schema: &EntitySchema, raw: &Map<String, Value>) -> Result<Entity, DecodeError> {
    let mut entity = decode_object(schema, raw)?;
    link_from_field(&mut entity, "sender", "sender_id", CollectionType::Users);
    Ok(entity)
}

fn link_from_field(entity: &mut Entity, relation: &str, field: &str, target: CollectionType) {
    if entity.link(relation).is_some() {
        return;
    }
    if let Some(id) = entity.get_str(field).filter(|s| !s.is_empty()).map(str::to_string) {
        entity.add_link_object(relation, id, target);
    }
}
