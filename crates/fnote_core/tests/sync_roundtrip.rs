use fnote_core::{
    record_id_for, snapshot_records, Card, Collection, EntityKind, InMemorySyncProvider,
    ProviderRegistry, SyncError, SyncPayload, SyncProvider, SyncRecord, Vault,
};
use std::sync::Arc;
use uuid::Uuid;

struct NamedProvider(&'static str);

impl SyncProvider for NamedProvider {
    fn provider_id(&self) -> &str {
        self.0
    }

    fn push(&self, _records: &[SyncRecord]) -> Result<(), SyncError> {
        Ok(())
    }

    fn pull(&self) -> Result<Vec<SyncRecord>, SyncError> {
        Ok(Vec::new())
    }
}

fn seeded_vault() -> Vault {
    let mut vault = Vault::new();
    let collection = vault.insert_collection(Collection::new("Deck")).unwrap();
    for (native, translation) in [("hallo", "hello"), ("tschüss", "bye")] {
        let mut card = Card::new(Some(collection));
        card.native = native.to_string();
        card.translation = translation.to_string();
        vault.upsert_card(card).unwrap();
    }
    vault
}

#[test]
fn record_ids_are_stable_per_entity() {
    let uuid = Uuid::new_v4();
    let first = record_id_for(EntityKind::Card, uuid);
    let second = record_id_for(EntityKind::Card, uuid);

    assert_eq!(first, second);
    assert_eq!(first, format!("card/{uuid}"));
    // Kind is part of the id, so different kinds never collide.
    assert_ne!(first, record_id_for(EntityKind::Tag, uuid));
}

#[test]
fn snapshot_records_put_collections_before_their_cards() {
    let vault = seeded_vault();
    let records = snapshot_records(&vault);
    assert_eq!(records.len(), 3);

    let first_card = records
        .iter()
        .position(|r| matches!(r.payload, SyncPayload::Card(_)))
        .unwrap();
    let last_collection = records
        .iter()
        .rposition(|r| matches!(r.payload, SyncPayload::Collection(_)))
        .unwrap();
    assert!(last_collection < first_card);

    for record in &records {
        assert_eq!(
            record.record_id,
            record_id_for(record.payload.kind(), record.payload.entity_uuid())
        );
    }
}

#[test]
fn in_memory_provider_round_trips_a_vault() {
    let vault = seeded_vault();
    let provider = InMemorySyncProvider::new();

    let records = snapshot_records(&vault);
    provider.push(&records).unwrap();

    let mut pulled = provider.pull().unwrap();
    let mut pushed = records.clone();
    pulled.sort_by(|a, b| a.record_id.cmp(&b.record_id));
    pushed.sort_by(|a, b| a.record_id.cmp(&b.record_id));
    assert_eq!(pulled, pushed);
}

#[test]
fn repeated_push_replaces_records_instead_of_duplicating() {
    let mut vault = seeded_vault();
    let provider = InMemorySyncProvider::new();
    provider.push(&snapshot_records(&vault)).unwrap();

    let card_id = vault.cards().next().unwrap().uuid;
    let mut edited = vault.card(card_id).unwrap().clone();
    edited.note = "updated".to_string();
    vault.upsert_card(edited).unwrap();
    provider.push(&snapshot_records(&vault)).unwrap();

    let pulled = provider.pull().unwrap();
    assert_eq!(pulled.len(), 3);
    let note = pulled
        .iter()
        .find_map(|record| match &record.payload {
            SyncPayload::Card(card) if card.uuid == card_id => Some(card.note.as_str()),
            _ => None,
        })
        .unwrap();
    assert_eq!(note, "updated");
}

#[test]
fn registry_resolves_providers_by_id() {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(InMemorySyncProvider::new())).unwrap();
    registry.register(Arc::new(NamedProvider("cloudkit"))).unwrap();

    assert_eq!(registry.provider_ids(), ["cloudkit", "memory"]);
    assert_eq!(registry.get("memory").unwrap().provider_id(), "memory");

    let err = registry.get("missing").unwrap_err();
    assert_eq!(err, SyncError::ProviderNotFound("missing".to_string()));
}

#[test]
fn registry_rejects_duplicate_ids() {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(InMemorySyncProvider::new())).unwrap();

    let err = registry
        .register(Arc::new(InMemorySyncProvider::new()))
        .unwrap_err();
    assert_eq!(err, SyncError::DuplicateProviderId("memory".to_string()));
}

#[test]
fn registry_rejects_malformed_ids() {
    let mut registry = ProviderRegistry::new();
    for bad in ["", "Memory", "cloud kit", "über"] {
        let err = registry.register(Arc::new(NamedProvider(bad))).unwrap_err();
        assert_eq!(err, SyncError::InvalidProviderId(bad.to_string()));
    }
    registry.register(Arc::new(NamedProvider("provider_2"))).unwrap();
}
