//! Staged edit sessions over the canonical vault.
//!
//! # Responsibility
//! - Stage field edits and selection state for one card in an isolated draft.
//! - Commit the whole draft atomically after validation, or discard it.
//! - Emit change events on commit only, so storage stays decoupled from any
//!   presentation concern.
//!
//! # Invariants
//! - While a session is open, field writes touch only the draft; the vault is
//!   untouched until `commit`.
//! - Commit validates first and applies nothing on failure; a failed commit
//!   leaves the session open so the caller can fix inputs.
//! - One active session per card id, enforced by [`SessionRegistry`]. The
//!   registry entry is taken at `begin` and released when the session closes;
//!   "idle" is simply the absence of an entry.

use crate::model::card::{Card, CardId, CollectionId, Formality};
use crate::model::connection::{ConnectionId, ConnectionKind};
use crate::model::tag::TagId;
use crate::model::validate::ValidationError;
use crate::store::{Vault, VaultError};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Error opening an edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Another session is already editing this card.
    AlreadyActive(CardId),
    /// The card to edit does not exist.
    CardNotFound(CardId),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyActive(id) => write!(f, "edit session already active for card {id}"),
            Self::CardNotFound(id) => write!(f, "card not found: {id}"),
        }
    }
}

impl Error for SessionError {}

/// Error committing an edit session.
#[derive(Debug)]
pub enum CommitError {
    /// The session was already committed or discarded.
    SessionClosed,
    /// The draft failed its persistability contract.
    Validation(ValidationError),
    /// The draft referenced vault entities that no longer exist.
    Vault(VaultError),
}

impl Display for CommitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionClosed => write!(f, "edit session is closed"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Vault(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SessionClosed => None,
            Self::Validation(err) => Some(err),
            Self::Vault(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CommitError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<VaultError> for CommitError {
    fn from(value: VaultError) -> Self {
        match value {
            VaultError::Validation(err) => Self::Validation(err),
            other => Self::Vault(other),
        }
    }
}

/// "Card id -> active session" registry backing the single-writer rule.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: BTreeSet<CardId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a session is currently editing the given card.
    pub fn is_active(&self, id: CardId) -> bool {
        self.active.contains(&id)
    }

    fn claim(&mut self, id: CardId) -> Result<(), SessionError> {
        if !self.active.insert(id) {
            return Err(SessionError::AlreadyActive(id));
        }
        Ok(())
    }

    fn release(&mut self, id: CardId) {
        self.active.remove(&id);
    }
}

/// Working copy of one card's fields plus selection state.
#[derive(Debug, Clone, Default)]
pub struct CardDraft {
    pub native: String,
    pub translation: String,
    pub note: String,
    pub formality: Formality,
    pub is_favorite: bool,
    /// Selected owning collection.
    pub collection: Option<CollectionId>,
    /// Selected related-card set, reconciled as `Related` connections.
    pub relations: BTreeSet<CardId>,
    /// Selected tag set.
    pub tags: BTreeSet<TagId>,
}

impl CardDraft {
    fn from_card(card: &Card) -> Self {
        Self {
            native: card.native.clone(),
            translation: card.translation.clone(),
            note: card.note.clone(),
            formality: card.formality,
            is_favorite: card.is_favorite,
            collection: card.collection,
            relations: card.relations.clone(),
            tags: card.tags.clone(),
        }
    }
}

/// Lifecycle of one session value. "Idle" has no session value at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Editing,
    Closed,
}

/// Change notifications emitted by a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    CardSaved(CardId),
    ConnectionAdded(ConnectionId),
    ConnectionRemoved(ConnectionId),
}

/// Result of a successful commit.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// The committed card id (freshly created for new-card sessions).
    pub card_id: CardId,
    /// Events describing exactly what changed, in application order.
    pub events: Vec<ChangeEvent>,
}

/// A staged, single-writer transactional buffer for editing one card.
#[derive(Debug)]
pub struct EditSession {
    card_id: CardId,
    exists: bool,
    state: SessionState,
    /// The working copy. Mutate freely while the session is open.
    pub draft: CardDraft,
}

impl EditSession {
    /// Opens a session for a card that does not exist yet.
    ///
    /// The card id is reserved at this point and claimed in the registry; the
    /// vault itself is not touched until commit.
    pub fn begin_new(
        registry: &mut SessionRegistry,
        collection: Option<CollectionId>,
    ) -> Result<Self, SessionError> {
        let card_id = Uuid::new_v4();
        registry.claim(card_id)?;
        Ok(Self {
            card_id,
            exists: false,
            state: SessionState::Editing,
            draft: CardDraft {
                collection,
                ..CardDraft::default()
            },
        })
    }

    /// Opens a session for an existing card, populating the draft from it.
    ///
    /// Fails with [`SessionError::AlreadyActive`] when another session holds
    /// this card; the other session is unaffected.
    pub fn begin_edit(
        registry: &mut SessionRegistry,
        vault: &Vault,
        card_id: CardId,
    ) -> Result<Self, SessionError> {
        let card = vault
            .card(card_id)
            .ok_or(SessionError::CardNotFound(card_id))?;
        registry.claim(card_id)?;
        Ok(Self {
            card_id,
            exists: true,
            state: SessionState::Editing,
            draft: CardDraft::from_card(card),
        })
    }

    /// The card id this session edits.
    pub fn card_id(&self) -> CardId {
        self.card_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the draft would currently pass input validation.
    ///
    /// Used to gate a commit action's availability; commit re-validates.
    pub fn can_commit(&self) -> bool {
        !self.draft.native.trim().is_empty()
            && !self.draft.translation.trim().is_empty()
            && self.draft.collection.is_some()
    }

    /// Validates the draft and applies it to the vault atomically.
    ///
    /// Checks validation plus collection, tag and relation existence up front
    /// and applies nothing on failure, leaving the session open.
    /// On success the session closes and the registry entry is released.
    pub fn commit(
        &mut self,
        vault: &mut Vault,
        registry: &mut SessionRegistry,
    ) -> Result<CommitOutcome, CommitError> {
        if self.state != SessionState::Editing {
            return Err(CommitError::SessionClosed);
        }

        let mut staged = if self.exists {
            vault
                .card(self.card_id)
                .cloned()
                .ok_or(CommitError::Vault(VaultError::CardNotFound(self.card_id)))?
        } else {
            Card::with_id(self.card_id, None)
        };
        staged.native = self.draft.native.clone();
        staged.translation = self.draft.translation.clone();
        staged.note = self.draft.note.clone();
        staged.formality = self.draft.formality;
        staged.is_favorite = self.draft.is_favorite;
        staged.collection = self.draft.collection;
        staged.tags = self.draft.tags.clone();
        staged.normalize();

        // All-or-nothing: every failure must surface before the first write.
        staged.validate()?;
        if let Some(collection_id) = staged.collection {
            if vault.collection(collection_id).is_none() {
                return Err(CommitError::Vault(VaultError::CollectionNotFound(
                    collection_id,
                )));
            }
        }
        for tag_id in &staged.tags {
            if vault.tag(*tag_id).is_none() {
                return Err(CommitError::Vault(VaultError::TagNotFound(*tag_id)));
            }
        }
        for relation in &self.draft.relations {
            if *relation != self.card_id && vault.card(*relation).is_none() {
                return Err(CommitError::Vault(VaultError::CardNotFound(*relation)));
            }
        }

        let previous_relations = vault
            .card(self.card_id)
            .map(|card| card.relations.clone())
            .unwrap_or_default();

        let mut events = Vec::new();
        vault.upsert_card(staged)?;
        events.push(ChangeEvent::CardSaved(self.card_id));

        for removed in previous_relations.difference(&self.draft.relations) {
            if let Some(connection) =
                vault.disconnect(self.card_id, *removed, ConnectionKind::Related)
            {
                events.push(ChangeEvent::ConnectionRemoved(connection.uuid));
            }
        }
        for added in self.draft.relations.difference(&previous_relations) {
            let connection_id = vault.connect(self.card_id, *added, ConnectionKind::Related)?;
            events.push(ChangeEvent::ConnectionAdded(connection_id));
        }

        self.state = SessionState::Closed;
        registry.release(self.card_id);
        self.exists = true;

        Ok(CommitOutcome {
            card_id: self.card_id,
            events,
        })
    }

    /// Closes the session without applying anything.
    ///
    /// New-card sessions only ever reserved an id, so there is no provisional
    /// vault state to revert; the registry entry is released either way.
    pub fn discard(&mut self, registry: &mut SessionRegistry) {
        if self.state == SessionState::Editing {
            self.state = SessionState::Closed;
            registry.release(self.card_id);
        }
    }
}
