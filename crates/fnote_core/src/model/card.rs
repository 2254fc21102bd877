//! Card domain model.
//!
//! # Responsibility
//! - Define the vocabulary card record and its formality register.
//! - Provide normalization and validity checks used before persistence.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another card.
//! - `collection` is `None` only while a card is staged in an edit session;
//!   a persistable card always belongs to exactly one collection.
//! - `relations`/`alternatives` mirror connection records and stay symmetric.

use crate::model::tag::TagId;
use crate::model::validate::{ValidationError, ValidationReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable identifier for a card.
pub type CardId = Uuid;

/// Stable identifier for a collection.
pub type CollectionId = Uuid;

/// Formality register attached to a card.
///
/// Raw values are persisted as-is and must never change:
/// `Unspecified=0, Informal=1, Neutral=2, Formal=3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formality {
    #[default]
    Unspecified,
    Informal,
    Neutral,
    Formal,
}

impl Formality {
    /// All registers in raw-value order.
    pub const ALL: [Formality; 4] = [
        Formality::Unspecified,
        Formality::Informal,
        Formality::Neutral,
        Formality::Formal,
    ];

    /// Returns the fixed persisted raw value.
    pub fn raw(self) -> i64 {
        match self {
            Self::Unspecified => 0,
            Self::Informal => 1,
            Self::Neutral => 2,
            Self::Formal => 3,
        }
    }

    /// Parses a persisted raw value.
    pub fn from_raw(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Unspecified),
            1 => Some(Self::Informal),
            2 => Some(Self::Neutral),
            3 => Some(Self::Formal),
            _ => None,
        }
    }

    /// Display title for pickers and lists.
    pub fn title(self) -> &'static str {
        match self {
            Self::Unspecified => "Undecided",
            Self::Informal => "Informal",
            Self::Neutral => "Neutral",
            Self::Formal => "Formal",
        }
    }

    /// Single-letter abbreviation shown on compact card cells.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Unspecified => "U",
            Self::Informal => "I",
            Self::Neutral => "N",
            Self::Formal => "F",
        }
    }
}

/// A single vocabulary entry with native and translation text.
///
/// Relationship and tag membership are kept as id sets; the connection records
/// owned by the vault are the canonical backing for `relations` and
/// `alternatives`.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Stable global ID used for linking, sync mapping and auditing.
    pub uuid: CardId,
    /// Text in the language being learned.
    pub native: String,
    /// Text in the user's language.
    pub translation: String,
    /// Free-form note.
    pub note: String,
    /// Formality register.
    pub formality: Formality,
    /// Favorite flag.
    pub is_favorite: bool,
    /// Owning collection. `None` only while staged.
    pub collection: Option<CollectionId>,
    /// Symmetric related-card set, derived from `Related` connections.
    pub relations: BTreeSet<CardId>,
    /// Symmetric alternative-card set, derived from `Alternative` connections.
    pub alternatives: BTreeSet<CardId>,
    /// Tags attached to this card.
    pub tags: BTreeSet<TagId>,
}

impl Card {
    /// Creates a blank card with a generated stable ID.
    pub fn new(collection: Option<CollectionId>) -> Self {
        Self::with_id(Uuid::new_v4(), collection)
    }

    /// Creates a blank card with a caller-provided stable ID.
    ///
    /// Used by edit sessions that reserve an id before the first commit, and
    /// by import/sync paths where identity already exists externally.
    pub fn with_id(uuid: CardId, collection: Option<CollectionId>) -> Self {
        Self {
            uuid,
            native: String::new(),
            translation: String::new(),
            note: String::new(),
            formality: Formality::Unspecified,
            is_favorite: false,
            collection,
            relations: BTreeSet::new(),
            alternatives: BTreeSet::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Trims surrounding whitespace from all text fields in place.
    ///
    /// Runs unconditionally before validation; the trimmed value is what gets
    /// persisted, never the raw input.
    pub fn normalize(&mut self) {
        self.native = self.native.trim().to_string();
        self.translation = self.translation.trim().to_string();
        self.note = self.note.trim().to_string();
    }

    /// Returns whether trimmed native and translation are both non-empty.
    pub fn has_valid_inputs(&self) -> bool {
        !self.native.trim().is_empty() && !self.translation.trim().is_empty()
    }

    /// Checks the full persistability contract.
    ///
    /// Ok iff trimmed native and translation are non-empty and the card is
    /// assigned to a collection. The error carries every failed reason.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut reasons = Vec::new();
        if self.native.trim().is_empty() {
            reasons.push(ValidationReason::EmptyNative);
        }
        if self.translation.trim().is_empty() {
            reasons.push(ValidationReason::EmptyTranslation);
        }
        if self.collection.is_none() {
            reasons.push(ValidationReason::MissingCollection);
        }
        ValidationError::from_reasons(reasons)
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}
