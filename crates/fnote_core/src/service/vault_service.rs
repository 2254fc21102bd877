//! Vault use-case service.
//!
//! # Responsibility
//! - Own the canonical vault, the session registry and the repository.
//! - Sequence every mutation as: vault change first, then explicit
//!   persistence driven by what actually changed.
//!
//! # Invariants
//! - The repository is touched only at commit/discard/delete boundaries.
//! - A failed vault mutation persists nothing.

use crate::model::card::{Card, CardId, CollectionId};
use crate::model::collection::Collection;
use crate::model::connection::{Connection, ConnectionId, ConnectionKind};
use crate::model::tag::TagId;
use crate::repo::vault_repo::{RepoError, VaultRepository};
use crate::search::query::{list_cards, search_cards, SearchSpec};
use crate::session::{ChangeEvent, CommitError, CommitOutcome, EditSession, SessionError, SessionRegistry};
use crate::store::{Vault, VaultError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error wrapping every recoverable failure of the edit/persist path.
#[derive(Debug)]
pub enum ServiceError {
    Session(SessionError),
    Commit(CommitError),
    Vault(VaultError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(err) => write!(f, "{err}"),
            Self::Commit(err) => write!(f, "{err}"),
            Self::Vault(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Session(err) => Some(err),
            Self::Commit(err) => Some(err),
            Self::Vault(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<SessionError> for ServiceError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<CommitError> for ServiceError {
    fn from(value: CommitError) -> Self {
        Self::Commit(value)
    }
}

impl From<VaultError> for ServiceError {
    fn from(value: VaultError) -> Self {
        Self::Vault(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case facade over the vault, sessions and a repository implementation.
pub struct VaultService<R: VaultRepository> {
    vault: Vault,
    sessions: SessionRegistry,
    repo: R,
}

impl<R: VaultRepository> VaultService<R> {
    /// Loads the persisted snapshot and builds a ready service.
    pub fn open(repo: R) -> Result<Self, ServiceError> {
        let snapshot = repo.load_all()?;
        let vault = Vault::from_snapshot(snapshot)?;
        info!(
            "event=vault_open module=service status=ok cards={} collections={}",
            vault.cards().count(),
            vault.collections().count()
        );
        Ok(Self {
            vault,
            sessions: SessionRegistry::new(),
            repo,
        })
    }

    /// Starts a service on an empty vault without loading.
    pub fn empty(repo: R) -> Self {
        Self {
            vault: Vault::new(),
            sessions: SessionRegistry::new(),
            repo,
        }
    }

    /// Read-only access to the canonical store.
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Whether an edit session currently holds the given card.
    pub fn is_editing(&self, id: CardId) -> bool {
        self.sessions.is_active(id)
    }

    /// Creates and persists a new collection.
    pub fn create_collection(&mut self, name: &str) -> Result<CollectionId, ServiceError> {
        let id = self.vault.insert_collection(Collection::new(name))?;
        let collection = self
            .vault
            .collection(id)
            .expect("collection inserted above");
        self.repo.save_collection(collection)?;
        info!("event=collection_create module=service status=ok collection={id}");
        Ok(id)
    }

    /// Renames and persists an existing collection.
    pub fn rename_collection(&mut self, id: CollectionId, name: &str) -> Result<(), ServiceError> {
        self.vault.rename_collection(id, name)?;
        let collection = self.vault.collection(id).expect("renamed above");
        self.repo.save_collection(collection)?;
        Ok(())
    }

    /// Deletes a collection, cascading to its member cards.
    ///
    /// Returns `false` when no such collection exists.
    pub fn delete_collection(&mut self, id: CollectionId) -> Result<bool, ServiceError> {
        let Some(deletion) = self.vault.delete_collection(id) else {
            return Ok(false);
        };
        // Foreign keys cascade card, link and connection rows with this one call.
        self.repo.delete_collection(id)?;
        info!(
            "event=collection_delete module=service status=ok collection={id} cards={}",
            deletion.cards.len()
        );
        Ok(true)
    }

    /// Opens a staged session for a brand-new card.
    pub fn begin_new_card(
        &mut self,
        collection: Option<CollectionId>,
    ) -> Result<EditSession, ServiceError> {
        Ok(EditSession::begin_new(&mut self.sessions, collection)?)
    }

    /// Opens a staged session over an existing card.
    pub fn begin_card_edit(&mut self, id: CardId) -> Result<EditSession, ServiceError> {
        Ok(EditSession::begin_edit(&mut self.sessions, &self.vault, id)?)
    }

    /// Commits a session to the vault, then persists exactly what changed.
    pub fn commit_card(&mut self, session: &mut EditSession) -> Result<CommitOutcome, ServiceError> {
        let outcome = session.commit(&mut self.vault, &mut self.sessions)?;
        for event in &outcome.events {
            match event {
                ChangeEvent::CardSaved(id) => {
                    let card = self
                        .vault
                        .card(*id)
                        .ok_or(VaultError::CardNotFound(*id))?;
                    self.repo.save_card(card)?;
                }
                ChangeEvent::ConnectionAdded(id) => {
                    let connection = self
                        .vault
                        .connection(*id)
                        .ok_or_else(|| VaultError::Inconsistent(format!(
                            "committed connection {id} missing from vault"
                        )))?;
                    self.repo.save_connection(connection)?;
                }
                ChangeEvent::ConnectionRemoved(id) => {
                    self.repo.delete_connection(*id)?;
                }
            }
        }
        info!(
            "event=card_commit module=service status=ok card={} events={}",
            outcome.card_id,
            outcome.events.len()
        );
        Ok(outcome)
    }

    /// Discards a session, applying and persisting nothing.
    pub fn discard(&mut self, session: &mut EditSession) {
        session.discard(&mut self.sessions);
    }

    /// Deletes a card and every reference to it.
    ///
    /// Returns `false` when no such card exists.
    pub fn delete_card(&mut self, id: CardId) -> Result<bool, ServiceError> {
        let Some(deletion) = self.vault.delete_card(id) else {
            return Ok(false);
        };
        self.repo.delete_card(id)?;
        info!(
            "event=card_delete module=service status=ok card={id} connections={}",
            deletion.connections.len()
        );
        Ok(true)
    }

    /// Links two cards and persists the connection record.
    pub fn connect(
        &mut self,
        a: CardId,
        b: CardId,
        kind: ConnectionKind,
    ) -> Result<ConnectionId, ServiceError> {
        let id = self.vault.connect(a, b, kind)?;
        let connection = self.vault.connection(id).expect("connected above");
        self.repo.save_connection(connection)?;
        Ok(id)
    }

    /// Unlinks two cards and deletes the persisted connection record.
    pub fn disconnect(
        &mut self,
        a: CardId,
        b: CardId,
        kind: ConnectionKind,
    ) -> Result<Option<Connection>, ServiceError> {
        let Some(connection) = self.vault.disconnect(a, b, kind) else {
            return Ok(None);
        };
        self.repo.delete_connection(connection.uuid)?;
        Ok(Some(connection))
    }

    /// Creates a new tag on a card, or no-ops on a name collision.
    pub fn add_tag(
        &mut self,
        card: CardId,
        name: &str,
        color: Option<String>,
    ) -> Result<Option<TagId>, ServiceError> {
        let Some(tag_id) = self.vault.add_tag(card, name, color)? else {
            return Ok(None);
        };
        let tag = self.vault.tag(tag_id).expect("tag created above");
        self.repo.save_tag(tag)?;
        self.persist_card(card)?;
        Ok(Some(tag_id))
    }

    /// Attaches an existing tag by exact name, or no-ops when none matches.
    pub fn add_existing_tag(
        &mut self,
        card: CardId,
        name: &str,
    ) -> Result<Option<TagId>, ServiceError> {
        let Some(tag_id) = self.vault.add_existing_tag(card, name)? else {
            return Ok(None);
        };
        self.persist_card(card)?;
        Ok(Some(tag_id))
    }

    /// Detaches a tag by exact name, or no-ops when the card lacks it.
    pub fn remove_tag(&mut self, card: CardId, name: &str) -> Result<Option<TagId>, ServiceError> {
        let Some(tag_id) = self.vault.remove_tag(card, name)? else {
            return Ok(None);
        };
        self.persist_card(card)?;
        Ok(Some(tag_id))
    }

    /// Lists cards in a collection, optionally narrowed by a filter text.
    pub fn list_cards(&self, collection: CollectionId, filter_text: &str) -> Vec<&Card> {
        list_cards(&self.vault, collection, filter_text)
    }

    /// Runs one structured search.
    pub fn search(&self, spec: &SearchSpec) -> Vec<&Card> {
        search_cards(&self.vault, spec)
    }

    fn persist_card(&mut self, id: CardId) -> Result<(), ServiceError> {
        let card = self.vault.card(id).ok_or(VaultError::CardNotFound(id))?;
        self.repo.save_card(card)?;
        Ok(())
    }
}
