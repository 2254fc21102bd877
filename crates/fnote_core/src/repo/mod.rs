//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence collaborator contract the core calls only at
//!   commit/discard/delete boundaries.
//! - Isolate SQLite query details from store/session orchestration.
//!
//! # Invariants
//! - Repository writes re-run entity validation before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod vault_repo;
