//! Connection domain model.
//!
//! A connection is the canonical record behind the derived
//! `relations`/`alternatives` sets on cards. At most one connection of a given
//! kind may exist per unordered card pair; both kinds are symmetric.

use crate::model::card::CardId;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable identifier for a connection record.
pub type ConnectionId = Uuid;

/// Link type between two cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// Words that relate to each other.
    Related,
    /// Words that can substitute for each other.
    Alternative,
}

/// A typed link record between two cards.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Stable global ID.
    pub uuid: ConnectionId,
    /// Link type.
    pub kind: ConnectionKind,
    /// Card that initiated the link.
    pub source: CardId,
    /// Card the link points at.
    pub target: CardId,
}

impl Connection {
    /// Creates a connection record with a generated stable ID.
    pub fn new(kind: ConnectionKind, source: CardId, target: CardId) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            source,
            target,
        }
    }

    /// Returns whether this record links the given pair, in either direction.
    pub fn links(&self, a: CardId, b: CardId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    /// Returns whether this record references the given card at all.
    pub fn references(&self, card: CardId) -> bool {
        self.source == card || self.target == card
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Hash for Connection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}
