//! In-memory canonical store for the vocabulary domain.
//!
//! # Responsibility
//! - Own every entity in an id-indexed arena (cards, collections, tags,
//!   connections) with relationship sets stored as id sets.
//! - Keep derived sets consistent: symmetric relation/alternative membership,
//!   collection membership, tag membership.
//! - Enforce no-dangling-reference deletion cascades.
//!
//! # Invariants
//! - Write paths validate entities before applying the mutation.
//! - `connect` is idempotent at the record level: at most one connection of a
//!   given kind exists per unordered card pair, and a repeated call returns
//!   the existing record's id.
//! - A card belongs to exactly one collection; moving a card updates both
//!   collections' member sets.

use crate::model::card::{Card, CardId, CollectionId};
use crate::model::collection::Collection;
use crate::model::connection::{Connection, ConnectionId, ConnectionKind};
use crate::model::tag::{Tag, TagId};
use crate::model::validate::ValidationError;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type VaultResult<T> = Result<T, VaultError>;

/// Error for canonical-store mutations.
#[derive(Debug)]
pub enum VaultError {
    Validation(ValidationError),
    CardNotFound(CardId),
    CollectionNotFound(CollectionId),
    TagNotFound(TagId),
    /// A snapshot or mutation referenced entities inconsistently.
    Inconsistent(String),
}

impl Display for VaultError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
            Self::CollectionNotFound(id) => write!(f, "collection not found: {id}"),
            Self::TagNotFound(id) => write!(f, "tag not found: {id}"),
            Self::Inconsistent(message) => write!(f, "inconsistent vault state: {message}"),
        }
    }
}

impl Error for VaultError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for VaultError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Plain entity rows exchanged with the persistence collaborator.
///
/// Card rows are canonical for field content, collection assignment and tag
/// membership; connection rows are canonical for relation/alternative sets.
/// All other derived sets are rebuilt by [`Vault::from_snapshot`].
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub cards: Vec<Card>,
    pub collections: Vec<Collection>,
    pub tags: Vec<Tag>,
    pub connections: Vec<Connection>,
}

/// Records removed by a card deletion, for the persistence layer to replay.
#[derive(Debug, Clone)]
pub struct CardDeletion {
    pub card: Card,
    pub connections: Vec<Connection>,
}

/// Records removed by a collection deletion cascade.
#[derive(Debug, Clone)]
pub struct CollectionDeletion {
    pub collection: Collection,
    pub cards: Vec<Card>,
    pub connections: Vec<Connection>,
}

/// Id-indexed arena holding the canonical entity graph.
#[derive(Debug, Default)]
pub struct Vault {
    cards: BTreeMap<CardId, Card>,
    collections: BTreeMap<CollectionId, Collection>,
    tags: BTreeMap<TagId, Tag>,
    connections: BTreeMap<ConnectionId, Connection>,
}

impl Vault {
    /// Creates an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a vault from persisted rows, deriving all membership sets.
    ///
    /// Rejects dangling references instead of masking them.
    pub fn from_snapshot(snapshot: Snapshot) -> VaultResult<Self> {
        let mut vault = Vault::new();

        for mut collection in snapshot.collections {
            collection.cards.clear();
            vault.collections.insert(collection.uuid, collection);
        }
        for mut tag in snapshot.tags {
            tag.cards.clear();
            vault.tags.insert(tag.uuid, tag);
        }

        for mut card in snapshot.cards {
            let collection_id = card.collection.ok_or_else(|| {
                VaultError::Inconsistent(format!("card {} has no collection", card.uuid))
            })?;
            let collection = vault.collections.get_mut(&collection_id).ok_or_else(|| {
                VaultError::Inconsistent(format!(
                    "card {} references missing collection {collection_id}",
                    card.uuid
                ))
            })?;
            collection.cards.insert(card.uuid);

            card.relations.clear();
            card.alternatives.clear();
            let card_tags = card.tags.clone();
            let card_id = card.uuid;
            vault.cards.insert(card_id, card);

            for tag_id in card_tags {
                let tag = vault.tags.get_mut(&tag_id).ok_or_else(|| {
                    VaultError::Inconsistent(format!(
                        "card {card_id} references missing tag {tag_id}"
                    ))
                })?;
                tag.cards.insert(card_id);
            }
        }

        for connection in snapshot.connections {
            for end in [connection.source, connection.target] {
                if !vault.cards.contains_key(&end) {
                    return Err(VaultError::Inconsistent(format!(
                        "connection {} references missing card {end}",
                        connection.uuid
                    )));
                }
            }
            vault.link_sets(connection.source, connection.target, connection.kind);
            vault.connections.insert(connection.uuid, connection);
        }

        Ok(vault)
    }

    /// Exports every entity as plain rows.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            cards: self.cards.values().cloned().collect(),
            collections: self.collections.values().cloned().collect(),
            tags: self.tags.values().cloned().collect(),
            connections: self.connections.values().cloned().collect(),
        }
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    pub fn collection(&self, id: CollectionId) -> Option<&Collection> {
        self.collections.get(&id)
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.get(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Finds a tag by exact name match.
    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags.values().find(|tag| tag.name == name)
    }

    /// Cards belonging to one collection. Unknown ids yield an empty iterator.
    pub fn cards_in(&self, collection: CollectionId) -> impl Iterator<Item = &Card> {
        self.cards
            .values()
            .filter(move |card| card.collection == Some(collection))
    }

    /// Inserts a new collection after normalizing and validating its name.
    pub fn insert_collection(&mut self, mut collection: Collection) -> VaultResult<CollectionId> {
        collection.normalize();
        collection.validate()?;
        collection.cards.clear();
        let id = collection.uuid;
        self.collections.insert(id, collection);
        Ok(id)
    }

    /// Renames a collection, trimming and validating the new name.
    pub fn rename_collection(&mut self, id: CollectionId, name: &str) -> VaultResult<()> {
        let collection = self
            .collections
            .get_mut(&id)
            .ok_or(VaultError::CollectionNotFound(id))?;
        let mut staged = collection.clone();
        staged.name = name.to_string();
        staged.normalize();
        staged.validate()?;
        collection.name = staged.name;
        Ok(())
    }

    /// Deletes a collection and cascades to its member cards.
    ///
    /// Member cards are deleted outright, with the same detach semantics as
    /// [`Vault::delete_card`]. Returns everything removed, or `None` when the
    /// collection does not exist.
    pub fn delete_collection(&mut self, id: CollectionId) -> Option<CollectionDeletion> {
        let collection = self.collections.remove(&id)?;
        let mut cards = Vec::new();
        let mut connections = Vec::new();
        for card_id in collection.cards.iter().copied().collect::<Vec<_>>() {
            if let Some(deletion) = self.delete_card(card_id) {
                cards.push(deletion.card);
                connections.extend(deletion.connections);
            }
        }
        Some(CollectionDeletion {
            collection,
            cards,
            connections,
        })
    }

    /// Inserts a new card or replaces field content of an existing one.
    ///
    /// Normalizes and validates first, then reconciles collection and tag
    /// membership sets. Relation/alternative sets on the incoming value are
    /// ignored: connection records stay canonical and are only changed through
    /// [`Vault::connect`] / [`Vault::disconnect`].
    pub fn upsert_card(&mut self, mut card: Card) -> VaultResult<CardId> {
        card.normalize();
        card.validate()?;

        let collection_id = card
            .collection
            .expect("validated card always has a collection");
        if !self.collections.contains_key(&collection_id) {
            return Err(VaultError::CollectionNotFound(collection_id));
        }
        for tag_id in &card.tags {
            if !self.tags.contains_key(tag_id) {
                return Err(VaultError::TagNotFound(*tag_id));
            }
        }

        let id = card.uuid;
        let previous = self.cards.get(&id);
        let previous_collection = previous.and_then(|card| card.collection);
        let previous_tags = previous.map(|card| card.tags.clone()).unwrap_or_default();

        // Derived sets survive from the stored version.
        match previous {
            Some(stored) => {
                card.relations = stored.relations.clone();
                card.alternatives = stored.alternatives.clone();
            }
            None => {
                card.relations.clear();
                card.alternatives.clear();
            }
        }

        if let Some(old_collection) = previous_collection {
            if old_collection != collection_id {
                if let Some(collection) = self.collections.get_mut(&old_collection) {
                    collection.cards.remove(&id);
                }
            }
        }
        self.collections
            .get_mut(&collection_id)
            .expect("collection existence checked above")
            .cards
            .insert(id);

        for removed in previous_tags.difference(&card.tags) {
            if let Some(tag) = self.tags.get_mut(removed) {
                tag.cards.remove(&id);
            }
        }
        for added in card.tags.clone() {
            self.tags
                .get_mut(&added)
                .expect("tag existence checked above")
                .cards
                .insert(id);
        }

        self.cards.insert(id, card);
        Ok(id)
    }

    /// Deletes a card and detaches every reference to it.
    ///
    /// Removes the card from its collection's member set, from every tag's
    /// membership set and from every peer's relation/alternative set, and
    /// deletes every connection record referencing it. Returns `None` when
    /// the card does not exist.
    pub fn delete_card(&mut self, id: CardId) -> Option<CardDeletion> {
        let card = self.cards.remove(&id)?;

        if let Some(collection_id) = card.collection {
            if let Some(collection) = self.collections.get_mut(&collection_id) {
                collection.cards.remove(&id);
            }
        }
        for tag_id in &card.tags {
            if let Some(tag) = self.tags.get_mut(tag_id) {
                tag.cards.remove(&id);
            }
        }

        let removed_ids: Vec<ConnectionId> = self
            .connections
            .values()
            .filter(|connection| connection.references(id))
            .map(|connection| connection.uuid)
            .collect();
        let mut connections = Vec::with_capacity(removed_ids.len());
        for connection_id in removed_ids {
            if let Some(connection) = self.connections.remove(&connection_id) {
                let peer = if connection.source == id {
                    connection.target
                } else {
                    connection.source
                };
                if let Some(peer_card) = self.cards.get_mut(&peer) {
                    match connection.kind {
                        ConnectionKind::Related => peer_card.relations.remove(&id),
                        ConnectionKind::Alternative => peer_card.alternatives.remove(&id),
                    };
                }
                connections.push(connection);
            }
        }

        Some(CardDeletion { card, connections })
    }

    /// Links two cards symmetrically and records the connection.
    ///
    /// Idempotent: a second call with the same pair and kind returns the
    /// existing record's id without creating a duplicate.
    pub fn connect(
        &mut self,
        a: CardId,
        b: CardId,
        kind: ConnectionKind,
    ) -> VaultResult<ConnectionId> {
        if !self.cards.contains_key(&a) {
            return Err(VaultError::CardNotFound(a));
        }
        if !self.cards.contains_key(&b) {
            return Err(VaultError::CardNotFound(b));
        }

        if let Some(existing) = self.find_connection(a, b, kind) {
            return Ok(existing);
        }

        self.link_sets(a, b, kind);
        let connection = Connection::new(kind, a, b);
        let id = connection.uuid;
        self.connections.insert(id, connection);
        Ok(id)
    }

    /// Unlinks two cards and deletes the matching connection record.
    ///
    /// Returns the deleted record, or `None` when no such connection exists
    /// (including when either card id is unknown).
    pub fn disconnect(&mut self, a: CardId, b: CardId, kind: ConnectionKind) -> Option<Connection> {
        let id = self.find_connection(a, b, kind)?;
        let connection = self.connections.remove(&id)?;

        for (card_id, peer) in [(a, b), (b, a)] {
            if let Some(card) = self.cards.get_mut(&card_id) {
                match kind {
                    ConnectionKind::Related => card.relations.remove(&peer),
                    ConnectionKind::Alternative => card.alternatives.remove(&peer),
                };
            }
        }
        Some(connection)
    }

    /// Creates a new tag and attaches it to the card.
    ///
    /// No-ops and returns `None` when a tag with that exact name already
    /// exists, matching the shared-tag-pool contract.
    pub fn add_tag(
        &mut self,
        card_id: CardId,
        name: &str,
        color: Option<String>,
    ) -> VaultResult<Option<TagId>> {
        if !self.cards.contains_key(&card_id) {
            return Err(VaultError::CardNotFound(card_id));
        }
        if self.tag_by_name(name).is_some() {
            return Ok(None);
        }

        let tag = Tag::new(name, color);
        let tag_id = tag.uuid;
        self.tags.insert(tag_id, tag);
        self.attach_tag(card_id, tag_id);
        Ok(Some(tag_id))
    }

    /// Attaches an existing tag by exact name, or no-ops when none matches.
    pub fn add_existing_tag(&mut self, card_id: CardId, name: &str) -> VaultResult<Option<TagId>> {
        if !self.cards.contains_key(&card_id) {
            return Err(VaultError::CardNotFound(card_id));
        }
        let Some(tag_id) = self.tag_by_name(name).map(|tag| tag.uuid) else {
            return Ok(None);
        };
        self.attach_tag(card_id, tag_id);
        Ok(Some(tag_id))
    }

    /// Detaches a tag from the card by exact name.
    ///
    /// Returns the detached tag id, or `None` when the card does not carry a
    /// tag with that name. The tag itself stays in the shared pool.
    pub fn remove_tag(&mut self, card_id: CardId, name: &str) -> VaultResult<Option<TagId>> {
        if !self.cards.contains_key(&card_id) {
            return Err(VaultError::CardNotFound(card_id));
        }
        let Some(tag_id) = self.tag_by_name(name).map(|tag| tag.uuid) else {
            return Ok(None);
        };
        let card = self.cards.get_mut(&card_id).expect("checked above");
        if !card.tags.remove(&tag_id) {
            return Ok(None);
        }
        if let Some(tag) = self.tags.get_mut(&tag_id) {
            tag.cards.remove(&card_id);
        }
        Ok(Some(tag_id))
    }

    fn attach_tag(&mut self, card_id: CardId, tag_id: TagId) {
        if let Some(card) = self.cards.get_mut(&card_id) {
            card.tags.insert(tag_id);
        }
        if let Some(tag) = self.tags.get_mut(&tag_id) {
            tag.cards.insert(card_id);
        }
    }

    fn find_connection(&self, a: CardId, b: CardId, kind: ConnectionKind) -> Option<ConnectionId> {
        self.connections
            .values()
            .find(|connection| connection.kind == kind && connection.links(a, b))
            .map(|connection| connection.uuid)
    }

    fn link_sets(&mut self, a: CardId, b: CardId, kind: ConnectionKind) {
        for (card_id, peer) in [(a, b), (b, a)] {
            if let Some(card) = self.cards.get_mut(&card_id) {
                match kind {
                    ConnectionKind::Related => card.relations.insert(peer),
                    ConnectionKind::Alternative => card.alternatives.insert(peer),
                };
            }
        }
    }
}
