//! The closed set of collection names known to this client.
//!
//! Collection tags are the wire names used by the API's side-loaded
//! payloads. They are also the partition names in the persistent store, so
//! renaming a tag orphans every record stored under the old one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// One named partition per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    Users,
    Posts,
    Comments,
    Categories,
    Tags,
    Images,
    Notifications,
    Messages,
}

impl CollectionType {
    /// Every collection, in declaration order.
    pub const ALL: [CollectionType; 8] = [
        CollectionType::Users,
        CollectionType::Posts,
        CollectionType::Comments,
        CollectionType::Categories,
        CollectionType::Tags,
        CollectionType::Images,
        CollectionType::Notifications,
        CollectionType::Messages,
    ];

    /// Returns the wire/partition tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Posts => "posts",
            Self::Comments => "comments",
            Self::Categories => "categories",
            Self::Tags => "tags",
            Self::Images => "images",
            Self::Notifications => "notifications",
            Self::Messages => "messages",
        }
    }

    /// Looks up a collection by its tag, returning `None` for names this
    /// client does not know about.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == tag)
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| Error::UnknownCollection(s.to_string()))
    }
}
