//! The wire shape handed to the pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IngestError;

/// Key of the side-loaded section in a full API response.
pub const LINKED_SECTION: &str = "linked";

/// Collection name to raw resource objects.
///
/// Deserializes straight from `{"users": [...], "posts": [...]}`. Use
/// [`LinkedPayload::from_response`] for full responses that mix primary
/// arrays, a `linked` section and unrelated keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkedPayload {
    collections: BTreeMap<String, Vec<Value>>,
}

impl LinkedPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gathers every array under the top level and under `linked`.
    ///
    /// Primary resources come first when a collection appears in both
    /// places. Values that are not arrays (paging metadata, counts) are
    /// ignored.
    pub fn from_response(response: &Value) -> Self {
        let mut payload = Self::new();
        let Some(top) = response.as_object() else {
            return payload;
        };
        for (name, value) in top {
            if let Value::Array(objects) = value {
                payload.extend(name.clone(), objects.iter().cloned());
            }
        }
        if let Some(linked) = top.get(LINKED_SECTION).and_then(Value::as_object) {
            for (name, value) in linked {
                if let Value::Array(objects) = value {
                    payload.extend(name.clone(), objects.iter().cloned());
                }
            }
        }
        payload
    }

    /// Parses raw response bytes, then applies [`LinkedPayload::from_response`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IngestError> {
        let response: Value = serde_json::from_slice(bytes)?;
        if !response.is_object() {
            return Err(IngestError::NotAnObject);
        }
        Ok(Self::from_response(&response))
    }

    /// Appends raw objects under `name`.
    pub fn extend(&mut self, name: impl Into<String>, objects: impl IntoIterator<Item = Value>) {
        self.collections.entry(name.into()).or_default().extend(objects);
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, objects: impl IntoIterator<Item = Value>) -> Self {
        self.extend(name, objects);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.collections.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.collections
            .iter()
            .map(|(name, objects)| (name.as_str(), objects.as_slice()))
    }

    /// Total number of raw objects.
    pub fn object_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.object_count() == 0
    }
}
