//! Vault repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Load the full entity snapshot and persist per-entity saves/deletes.
//! - Own the card/tag link replacement logic with atomic semantics.
//! - Keep stable external record ids for the sync collaborator.
//!
//! # Invariants
//! - `save_card` replaces the whole `card_tags` link set in one transaction.
//! - Deletes are idempotent: deleting an absent row is not an error.
//! - Cascades mirror the in-memory vault: collection rows cascade to cards,
//!   card rows cascade to links and connections (enforced by foreign keys).

use crate::db::DbError;
use crate::model::card::{Card, CardId, CollectionId, Formality};
use crate::model::collection::Collection;
use crate::model::connection::{Connection as CardConnection, ConnectionId, ConnectionKind};
use crate::model::tag::{Tag, TagId};
use crate::model::validate::ValidationError;
use crate::store::Snapshot;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for vault persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Entity kind discriminator for external record mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Card,
    Collection,
    Tag,
    Connection,
}

impl EntityKind {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Collection => "collection",
            Self::Tag => "tag",
            Self::Connection => "connection",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "card" => Some(Self::Card),
            "collection" => Some(Self::Collection),
            "tag" => Some(Self::Tag),
            "connection" => Some(Self::Connection),
            _ => None,
        }
    }
}

/// Persistence collaborator contract.
///
/// The core calls these only at commit/discard/delete boundaries, never
/// mid-edit; save is an explicit step sequenced after an in-memory commit.
pub trait VaultRepository {
    /// Loads every persisted entity as plain rows.
    fn load_all(&self) -> RepoResult<Snapshot>;
    /// Upserts one card row and replaces its tag links atomically.
    fn save_card(&mut self, card: &Card) -> RepoResult<()>;
    /// Upserts one collection row.
    fn save_collection(&mut self, collection: &Collection) -> RepoResult<()>;
    /// Upserts one tag row.
    fn save_tag(&mut self, tag: &Tag) -> RepoResult<()>;
    /// Upserts one connection row.
    fn save_connection(&mut self, connection: &CardConnection) -> RepoResult<()>;
    /// Deletes one card row (idempotent).
    fn delete_card(&mut self, id: CardId) -> RepoResult<()>;
    /// Deletes one collection row, cascading to its cards (idempotent).
    fn delete_collection(&mut self, id: CollectionId) -> RepoResult<()>;
    /// Deletes one tag row (idempotent).
    fn delete_tag(&mut self, id: TagId) -> RepoResult<()>;
    /// Deletes one connection row (idempotent).
    fn delete_connection(&mut self, id: ConnectionId) -> RepoResult<()>;
}

/// SQLite-backed vault repository.
pub struct SqliteVaultRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteVaultRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Records the stable external record id for one entity.
    ///
    /// Replaces any previous mapping for the same entity.
    pub fn set_external_record_id(
        &mut self,
        entity: Uuid,
        kind: EntityKind,
        record_id: &str,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO external_mappings (entity_uuid, entity_kind, record_id)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(entity_uuid) DO UPDATE SET
                entity_kind = excluded.entity_kind,
                record_id = excluded.record_id;",
            params![entity.to_string(), kind.as_db(), record_id],
        )?;
        Ok(())
    }

    /// Looks up the external record id attached to one entity, if any.
    pub fn external_record_id(&self, entity: Uuid) -> RepoResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT record_id FROM external_mappings WHERE entity_uuid = ?1;")?;
        let mut rows = stmt.query([entity.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(row.get(0)?));
        }
        Ok(None)
    }
}

impl VaultRepository for SqliteVaultRepository<'_> {
    fn load_all(&self) -> RepoResult<Snapshot> {
        let mut snapshot = Snapshot::default();

        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM collections ORDER BY uuid;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let uuid = parse_uuid(&row.get::<_, String>("uuid")?, "collections.uuid")?;
            snapshot
                .collections
                .push(Collection::with_id(uuid, row.get::<_, String>("name")?));
        }

        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name, color_hex FROM tags ORDER BY uuid;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let uuid = parse_uuid(&row.get::<_, String>("uuid")?, "tags.uuid")?;
            snapshot.tags.push(Tag::with_id(
                uuid,
                row.get::<_, String>("name")?,
                row.get("color_hex")?,
            ));
        }

        let mut stmt = self.conn.prepare(
            "SELECT uuid, collection_uuid, native, translation, note, formality, is_favorite
             FROM cards ORDER BY uuid;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            snapshot.cards.push(parse_card_row(row)?);
        }
        for card in &mut snapshot.cards {
            card.tags = load_tag_links(self.conn, card.uuid)?;
        }

        let mut stmt = self.conn.prepare(
            "SELECT uuid, kind, source_uuid, target_uuid FROM connections ORDER BY uuid;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            snapshot.connections.push(parse_connection_row(row)?);
        }

        Ok(snapshot)
    }

    fn save_card(&mut self, card: &Card) -> RepoResult<()> {
        card.validate()?;
        let collection = card
            .collection
            .ok_or_else(|| RepoError::InvalidData("card has no collection".to_string()))?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO cards
                (uuid, collection_uuid, native, translation, note, formality, is_favorite)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(uuid) DO UPDATE SET
                collection_uuid = excluded.collection_uuid,
                native = excluded.native,
                translation = excluded.translation,
                note = excluded.note,
                formality = excluded.formality,
                is_favorite = excluded.is_favorite;",
            params![
                card.uuid.to_string(),
                collection.to_string(),
                card.native.as_str(),
                card.translation.as_str(),
                card.note.as_str(),
                card.formality.raw(),
                bool_to_int(card.is_favorite),
            ],
        )?;

        tx.execute(
            "DELETE FROM card_tags WHERE card_uuid = ?1;",
            [card.uuid.to_string()],
        )?;
        for tag_id in &card.tags {
            tx.execute(
                "INSERT INTO card_tags (card_uuid, tag_uuid) VALUES (?1, ?2);",
                params![card.uuid.to_string(), tag_id.to_string()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn save_collection(&mut self, collection: &Collection) -> RepoResult<()> {
        collection.validate()?;
        self.conn.execute(
            "INSERT INTO collections (uuid, name) VALUES (?1, ?2)
             ON CONFLICT(uuid) DO UPDATE SET name = excluded.name;",
            params![collection.uuid.to_string(), collection.name.as_str()],
        )?;
        Ok(())
    }

    fn save_tag(&mut self, tag: &Tag) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO tags (uuid, name, color_hex) VALUES (?1, ?2, ?3)
             ON CONFLICT(uuid) DO UPDATE SET
                name = excluded.name,
                color_hex = excluded.color_hex;",
            params![
                tag.uuid.to_string(),
                tag.name.as_str(),
                tag.color.as_deref()
            ],
        )?;
        Ok(())
    }

    fn save_connection(&mut self, connection: &CardConnection) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO connections (uuid, kind, source_uuid, target_uuid)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(uuid) DO NOTHING;",
            params![
                connection.uuid.to_string(),
                connection_kind_to_db(connection.kind),
                connection.source.to_string(),
                connection.target.to_string(),
            ],
        )?;
        Ok(())
    }

    fn delete_card(&mut self, id: CardId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM cards WHERE uuid = ?1;", [id.to_string()])?;
        Ok(())
    }

    fn delete_collection(&mut self, id: CollectionId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM collections WHERE uuid = ?1;", [id.to_string()])?;
        Ok(())
    }

    fn delete_tag(&mut self, id: TagId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM tags WHERE uuid = ?1;", [id.to_string()])?;
        Ok(())
    }

    fn delete_connection(&mut self, id: ConnectionId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM connections WHERE uuid = ?1;", [id.to_string()])?;
        Ok(())
    }
}

fn parse_card_row(row: &Row<'_>) -> RepoResult<Card> {
    let uuid = parse_uuid(&row.get::<_, String>("uuid")?, "cards.uuid")?;
    let collection = parse_uuid(
        &row.get::<_, String>("collection_uuid")?,
        "cards.collection_uuid",
    )?;

    let formality_raw: i64 = row.get("formality")?;
    let formality = Formality::from_raw(formality_raw).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid formality value `{formality_raw}` in cards.formality"
        ))
    })?;

    let mut card = Card::with_id(uuid, Some(collection));
    card.native = row.get("native")?;
    card.translation = row.get("translation")?;
    card.note = row.get("note")?;
    card.formality = formality;
    card.is_favorite = int_to_bool(row.get("is_favorite")?, "cards.is_favorite")?;
    Ok(card)
}

fn parse_connection_row(row: &Row<'_>) -> RepoResult<CardConnection> {
    let kind_text: String = row.get("kind")?;
    let kind = parse_connection_kind(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid connection kind `{kind_text}` in connections.kind"
        ))
    })?;

    Ok(CardConnection {
        uuid: parse_uuid(&row.get::<_, String>("uuid")?, "connections.uuid")?,
        kind,
        source: parse_uuid(
            &row.get::<_, String>("source_uuid")?,
            "connections.source_uuid",
        )?,
        target: parse_uuid(
            &row.get::<_, String>("target_uuid")?,
            "connections.target_uuid",
        )?,
    })
}

fn load_tag_links(conn: &Connection, card: CardId) -> RepoResult<BTreeSet<TagId>> {
    let mut stmt = conn.prepare("SELECT tag_uuid FROM card_tags WHERE card_uuid = ?1;")?;
    let mut rows = stmt.query([card.to_string()])?;
    let mut tags = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tags.insert(parse_uuid(
            &row.get::<_, String>(0)?,
            "card_tags.tag_uuid",
        )?);
    }
    Ok(tags)
}

fn connection_kind_to_db(kind: ConnectionKind) -> &'static str {
    match kind {
        ConnectionKind::Related => "related",
        ConnectionKind::Alternative => "alternative",
    }
}

fn parse_connection_kind(value: &str) -> Option<ConnectionKind> {
    match value {
        "related" => Some(ConnectionKind::Related),
        "alternative" => Some(ConnectionKind::Alternative),
        _ => None,
    }
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
