//! Core domain logic for the FNote vocabulary flashcard app.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod session;
pub mod store;
pub mod sync;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::card::{Card, CardId, CollectionId, Formality};
pub use model::collection::Collection;
pub use model::connection::{Connection, ConnectionId, ConnectionKind};
pub use model::tag::{Tag, TagId};
pub use model::validate::{ValidationError, ValidationReason};
pub use repo::vault_repo::{
    EntityKind, RepoError, RepoResult, SqliteVaultRepository, VaultRepository,
};
pub use search::query::{list_cards, search_cards, SearchFilter, SearchScope, SearchSpec};
pub use service::vault_service::{ServiceError, VaultService};
pub use session::{
    ChangeEvent, CommitError, CommitOutcome, EditSession, SessionError, SessionRegistry,
    SessionState,
};
pub use store::{CardDeletion, CollectionDeletion, Snapshot, Vault, VaultError, VaultResult};
pub use sync::{
    record_id_for, snapshot_records, InMemorySyncProvider, ProviderRegistry, SyncError,
    SyncPayload, SyncProvider, SyncRecord, SyncResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
