//! Tag domain model.
//!
//! Tags are shared resources: many cards reference the same tag instance by
//! id, never copies. Tag names are unique (exact match) within one vault.

use crate::model::card::CardId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable identifier for a tag.
pub type TagId = Uuid;

/// A shared label attachable to many cards.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Stable global ID.
    pub uuid: TagId,
    /// Unique tag name (exact match, case-sensitive).
    pub name: String,
    /// Optional display color as a hex string, e.g. `"FFAA00"`.
    pub color: Option<String>,
    /// Cards referencing this tag, maintained by the vault.
    pub cards: BTreeSet<CardId>,
}

impl Tag {
    /// Creates a tag with a generated stable ID.
    pub fn new(name: impl Into<String>, color: Option<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, color)
    }

    /// Creates a tag with a caller-provided stable ID.
    pub fn with_id(uuid: TagId, name: impl Into<String>, color: Option<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            color,
            cards: BTreeSet::new(),
        }
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}
