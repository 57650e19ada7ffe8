use linkstore_types::{CollectionType, Version};
use serde::{Deserialize, Serialize};

use crate::{Entity, FieldType, FieldValue};

/// Declares an entity kind's fields, their history and their merge rules.
///
/// Field order is significant: the binary codec writes fields in this order,
/// so new fields must only ever be appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySchema {
    pub collection: CollectionType,
    /// Current schema revision. Every field's `since` is at most this.
    pub version: Version,
    pub fields: Vec<FieldSpec>,
    /// Relations copied from the stored record when an incoming record
    /// omits them.
    #[serde(default)]
    pub protected_links: Vec<String>,
}

/// One declared field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name on [`Entity::fields`].
    pub name: String,
    /// JSON pointer into the raw API object (e.g., "/username", "/meta/likes").
    pub json_path: String,
    pub field_type: FieldType,
    /// Revision that introduced the field.
    pub since: Version,
    /// Value used when the field is absent: older records, sparse payloads,
    /// or JSON of the wrong type. `Null` marks the field as nullable.
    pub default: FieldValue,
    pub merge: MergeRule,
}

/// What happens to a field when an incoming record replaces a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeRule {
    /// The incoming value always wins, including when it is empty.
    #[default]
    Overwrite,
    /// A `Null` incoming value keeps the stored value. Only meaningful for
    /// nullable fields, whose payloads cannot tell "absent" from "cleared".
    KeepExisting,
}

impl FieldSpec {
    fn simple(name: &str, field_type: FieldType, default: FieldValue) -> Self {
        Self {
            name: name.into(),
            json_path: format!("/{name}"),
            field_type,
            since: 1,
            default,
            merge: MergeRule::Overwrite,
        }
    }

    /// Text field defaulting to the empty string.
    pub fn text(name: &str) -> Self {
        Self::simple(name, FieldType::Text, FieldValue::Text(String::new()))
    }

    /// Integer field defaulting to zero.
    pub fn int(name: &str) -> Self {
        Self::simple(name, FieldType::Int, FieldValue::Int(0))
    }

    /// Float field defaulting to zero.
    pub fn float(name: &str) -> Self {
        Self::simple(name, FieldType::Float, FieldValue::Float(0.0))
    }

    /// Boolean field defaulting to `false`.
    pub fn bool(name: &str) -> Self {
        Self::simple(name, FieldType::Bool, FieldValue::Bool(false))
    }

    /// Timestamp field defaulting to the epoch.
    pub fn timestamp(name: &str) -> Self {
        Self::simple(name, FieldType::Timestamp, FieldValue::Timestamp(0))
    }

    /// String list field defaulting to empty.
    pub fn list(name: &str) -> Self {
        Self::simple(name, FieldType::List, FieldValue::List(Vec::new()))
    }

    /// Makes the field nullable (default `Null`).
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.default = FieldValue::Null;
        self
    }

    /// Nullable field whose stored value survives a sparse payload.
    #[must_use]
    pub fn keep_existing(mut self) -> Self {
        self.default = FieldValue::Null;
        self.merge = MergeRule::KeepExisting;
        self
    }

    /// Marks the revision that introduced the field.
    #[must_use]
    pub fn since(mut self, version: Version) -> Self {
        self.since = version;
        self
    }

    /// Reads the field from a different JSON pointer than `/<name>`.
    #[must_use]
    pub fn at(mut self, json_path: &str) -> Self {
        self.json_path = json_path.into();
        self
    }

    /// Overrides the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<FieldValue>) -> Self {
        self.default = default.into();
        self
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.default.is_null()
    }
}

impl EntitySchema {
    /// Starts a schema at the given revision with no fields.
    pub fn new(collection: CollectionType, version: Version) -> Self {
        Self {
            collection,
            version,
            fields: Vec::new(),
            protected_links: Vec::new(),
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Declares a relation that survives payloads omitting it.
    #[must_use]
    pub fn protect_link(mut self, relation: &str) -> Self {
        self.protected_links.push(relation.into());
        self
    }

    /// Looks up a field declaration by name.
    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields present in records written at `version`, in codec order.
    pub fn fields_at(&self, version: Version) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.since <= version)
    }

    /// Checks the table for mistakes that would corrupt persisted records:
    /// duplicate names, fields from the future, defaults of the wrong type,
    /// and fields appended out of revision order.
    pub fn validate(&self) -> Result<(), String> {
        if self.version == 0 {
            return Err(format!("{}: schema version must be at least 1", self.collection));
        }
        let mut last_since = 1;
        for (i, f) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|g| g.name == f.name) {
                return Err(format!("{}: duplicate field {}", self.collection, f.name));
            }
            if f.since == 0 || f.since > self.version {
                return Err(format!(
                    "{}: field {} introduced at {} outside 1..={}",
                    self.collection, f.name, f.since, self.version
                ));
            }
            if f.since < last_since {
                return Err(format!(
                    "{}: field {} (since {}) declared after a field from revision {}",
                    self.collection, f.name, f.since, last_since
                ));
            }
            if !f.default.conforms_to(f.field_type) {
                return Err(format!("{}: default of {} does not match its type", self.collection, f.name));
            }
            if f.merge == MergeRule::KeepExisting && !f.is_nullable() {
                return Err(format!("{}: merge-protected field {} must be nullable", self.collection, f.name));
            }
            last_since = f.since;
        }
        Ok(())
    }

    /// Builds an entity at the current revision with every field set to its
    /// default.
    pub fn new_entity(&self, id: impl Into<String>) -> Entity {
        let mut entity = Entity::new(self.collection, id, self.version);
        for f in &self.fields {
            entity.fields.insert(f.name.clone(), f.default.clone());
        }
        entity
    }
}
