//! Vocabulary domain model.
//!
//! # Responsibility
//! - Define the canonical entity records: card, collection, tag, connection.
//! - Provide the validation layer shared by the edit session and repositories.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID assigned once at creation.
//! - Entity equality and hashing go by id, never by field content.
//! - Relationship sets are stored as id sets, not object references.

pub mod card;
pub mod collection;
pub mod connection;
pub mod tag;
pub mod validate;
