//! Collection domain model.

use crate::model::card::{CardId, CollectionId};
use crate::model::validate::{ValidationError, ValidationReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A named grouping of cards. Every card belongs to exactly one collection.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Stable global ID.
    pub uuid: CollectionId,
    /// Display name. Must be non-empty once trimmed.
    pub name: String,
    /// Member card ids, maintained by the vault.
    pub cards: BTreeSet<CardId>,
}

impl Collection {
    /// Creates a collection with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a collection with a caller-provided stable ID.
    pub fn with_id(uuid: CollectionId, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
            cards: BTreeSet::new(),
        }
    }

    /// Trims surrounding whitespace from the name in place.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
    }

    /// Ok iff the trimmed name is non-empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut reasons = Vec::new();
        if self.name.trim().is_empty() {
            reasons.push(ValidationReason::EmptyCollectionName);
        }
        ValidationError::from_reasons(reasons)
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Hash for Collection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}
