//! Reconciles an incoming record with the one already stored at its key.
//!
//! The incoming record wins outright except for what the kind's schema
//! protects: nullable fields marked [`MergeRule::KeepExisting`] and the
//! relations listed in [`EntitySchema::protected_links`]. Those keep the
//! stored value when the incoming record leaves them empty, so a sparse or
//! paginated payload never erases what the store already knew.

use tracing::{debug, warn};

use crate::{Entity, EntitySchema, MergeRule};

/// Merges `incoming` over `existing` using `schema`'s declarations.
///
/// Never fails. Records of different kinds are a configuration bug: this
/// panics in debug builds and lets `incoming` through in release builds.
pub fn merge(schema: &EntitySchema, existing: &Entity, incoming: Entity) -> Entity {
    if existing.collection != incoming.collection || schema.collection != incoming.collection {
        if cfg!(debug_assertions) {
            panic!(
                "merge across kinds: stored {} vs incoming {} (schema {})",
                existing.collection, incoming.collection, schema.collection
            );
        }
        warn!(
            "Merge kind mismatch for id {}: stored {}, incoming {}; keeping incoming",
            incoming.id, existing.collection, incoming.collection
        );
        return incoming;
    }

    let mut merged = incoming;

    for spec in schema.fields.iter().filter(|f| f.merge == MergeRule::KeepExisting) {
        let incoming_empty = merged.field(&spec.name).is_none_or(|v| v.is_null());
        if !incoming_empty {
            continue;
        }
        if let Some(stored) = existing.field(&spec.name).filter(|v| !v.is_null()) {
            debug!("Keeping stored {} on {}", spec.name, merged.key());
            merged.fields.insert(spec.name.clone(), stored.clone());
        }
    }

    for relation in &schema.protected_links {
        if merged.links.contains_key(relation) {
            continue;
        }
        if let Some(stored) = existing.link(relation) {
            debug!("Keeping stored link {} on {}", relation, merged.key());
            merged.links.insert(relation.clone(), stored.clone());
        }
    }

    merged
}
