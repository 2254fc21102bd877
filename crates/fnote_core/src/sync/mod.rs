//! Sync collaborator contract and in-process provider registry.
//!
//! # Responsibility
//! - Define the opaque push/pull record store the vault can sync against.
//! - Manage provider registration and selection by validated id.
//!
//! # Invariants
//! - Sync never blocks an edit commit; callers push/pull as a separate step.
//! - Record ids are stable per entity (`<kind>/<uuid>`), so a provider can
//!   match repeated pushes of the same entity.

use crate::model::card::Card;
use crate::model::collection::Collection;
use crate::model::connection::Connection;
use crate::model::tag::Tag;
use crate::repo::vault_repo::EntityKind;
use crate::store::Vault;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::sync::Mutex;
use uuid::Uuid;

pub type SyncResult<T> = Result<T, SyncError>;

/// Sync-layer error. Transport faults are opaque provider messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    InvalidProviderId(String),
    DuplicateProviderId(String),
    ProviderNotFound(String),
    Transport(String),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProviderId(value) => write!(f, "provider id is invalid: {value}"),
            Self::DuplicateProviderId(value) => {
                write!(f, "provider id already registered: {value}")
            }
            Self::ProviderNotFound(value) => write!(f, "provider not found: {value}"),
            Self::Transport(message) => write!(f, "sync transport failure: {message}"),
        }
    }
}

impl Error for SyncError {}

/// One entity wrapped for transfer.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncPayload {
    Card(Card),
    Collection(Collection),
    Tag(Tag),
    Connection(Connection),
}

impl SyncPayload {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Card(_) => EntityKind::Card,
            Self::Collection(_) => EntityKind::Collection,
            Self::Tag(_) => EntityKind::Tag,
            Self::Connection(_) => EntityKind::Connection,
        }
    }

    pub fn entity_uuid(&self) -> Uuid {
        match self {
            Self::Card(card) => card.uuid,
            Self::Collection(collection) => collection.uuid,
            Self::Tag(tag) => tag.uuid,
            Self::Connection(connection) => connection.uuid,
        }
    }
}

/// One record exchanged with a provider, keyed by stable record id.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRecord {
    pub record_id: String,
    pub payload: SyncPayload,
}

impl SyncRecord {
    pub fn new(payload: SyncPayload) -> Self {
        Self {
            record_id: record_id_for(payload.kind(), payload.entity_uuid()),
            payload,
        }
    }
}

/// Builds the stable external record id for one entity.
pub fn record_id_for(kind: EntityKind, uuid: Uuid) -> String {
    format!("{}/{uuid}", kind.as_db())
}

/// Exports the whole vault as push-ready records, collections first so a
/// provider replaying in order never sees a card before its collection.
pub fn snapshot_records(vault: &Vault) -> Vec<SyncRecord> {
    let snapshot = vault.to_snapshot();
    let mut records = Vec::new();
    records.extend(
        snapshot
            .collections
            .into_iter()
            .map(|c| SyncRecord::new(SyncPayload::Collection(c))),
    );
    records.extend(
        snapshot
            .tags
            .into_iter()
            .map(|t| SyncRecord::new(SyncPayload::Tag(t))),
    );
    records.extend(
        snapshot
            .cards
            .into_iter()
            .map(|c| SyncRecord::new(SyncPayload::Card(c))),
    );
    records.extend(
        snapshot
            .connections
            .into_iter()
            .map(|c| SyncRecord::new(SyncPayload::Connection(c))),
    );
    records
}

/// Opaque push/pull record store.
pub trait SyncProvider: Send + Sync {
    /// Stable provider identifier, e.g. `"cloudkit"`.
    fn provider_id(&self) -> &str;
    /// Stores or replaces records by record id.
    fn push(&self, records: &[SyncRecord]) -> SyncResult<()>;
    /// Returns every record the provider holds.
    fn pull(&self) -> SyncResult<Vec<SyncRecord>>;
}

impl std::fmt::Debug for dyn SyncProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncProvider")
            .field("provider_id", &self.provider_id())
            .finish()
    }
}

/// In-process provider registry keyed by validated provider id.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn SyncProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one provider under its own id.
    ///
    /// Ids must be non-empty, lowercase alphanumeric/`-`/`_`, and unique.
    pub fn register(&mut self, provider: Arc<dyn SyncProvider>) -> SyncResult<()> {
        let id = provider.provider_id().to_string();
        if !is_valid_provider_id(&id) {
            return Err(SyncError::InvalidProviderId(id));
        }
        if self.providers.contains_key(&id) {
            return Err(SyncError::DuplicateProviderId(id));
        }
        self.providers.insert(id, provider);
        Ok(())
    }

    /// Looks up a registered provider by id.
    pub fn get(&self, id: &str) -> SyncResult<Arc<dyn SyncProvider>> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| SyncError::ProviderNotFound(id.to_string()))
    }

    /// Registered provider ids in sorted order.
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

fn is_valid_provider_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Trivial provider holding records in memory. Used by tests and as the
/// reference semantics for real transports.
#[derive(Default)]
pub struct InMemorySyncProvider {
    records: Mutex<BTreeMap<String, SyncRecord>>,
}

impl InMemorySyncProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SyncProvider for InMemorySyncProvider {
    fn provider_id(&self) -> &str {
        "memory"
    }

    fn push(&self, records: &[SyncRecord]) -> SyncResult<()> {
        let mut stored = self
            .records
            .lock()
            .map_err(|_| SyncError::Transport("provider state poisoned".to_string()))?;
        for record in records {
            stored.insert(record.record_id.clone(), record.clone());
        }
        Ok(())
    }

    fn pull(&self) -> SyncResult<Vec<SyncRecord>> {
        let stored = self
            .records
            .lock()
            .map_err(|_| SyncError::Transport("provider state poisoned".to_string()))?;
        Ok(stored.values().cloned().collect())
    }
}
