//! Structured card search over the vault.
//!
//! # Responsibility
//! - Execute scope + text + include/exclude queries against one collection.
//! - Keep ordering deterministic.
//!
//! # Invariants
//! - Text matching is case-insensitive substring containment.
//! - A blank search text yields zero results; listing without a search text
//!   yields the whole collection.
//! - Sort keys use the default byte-order collation, with the card id as the
//!   final tiebreak.

use crate::model::card::{Card, CardId, CollectionId};
use crate::store::Vault;
use std::collections::BTreeSet;

/// Which fields a search text is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Match when either translation or native contains the text.
    TranslationOrNative,
    /// Match on translation only.
    Translation,
    /// Match on native only.
    Native,
    /// Match when any tag name on the card contains the text.
    Tag,
    /// Match on the free-form note.
    Note,
}

/// Explicit id allow/deny list layered on top of the text match.
///
/// Include and exclude are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    Include(BTreeSet<CardId>),
    Exclude(BTreeSet<CardId>),
}

/// One structured search request scoped to a collection.
#[derive(Debug, Clone)]
pub struct SearchSpec {
    /// Collection to search in. Unknown ids match nothing.
    pub collection: CollectionId,
    /// Search text. Blank (after trimming) matches nothing.
    pub text: String,
    /// Field scope.
    pub scope: SearchScope,
    /// Optional allow/deny filter.
    pub filter: Option<SearchFilter>,
}

impl SearchSpec {
    /// Creates a spec with no include/exclude filter.
    pub fn new(collection: CollectionId, scope: SearchScope, text: impl Into<String>) -> Self {
        Self {
            collection,
            text: text.into(),
            scope,
            filter: None,
        }
    }
}

/// Lists cards in a collection, optionally narrowed by a filter text.
///
/// A blank filter text returns every card in the collection; otherwise the
/// text must appear (case-insensitively) in the translation or native field.
/// Sorted by translation ascending. Unknown collection ids yield an empty
/// list with no error.
pub fn list_cards<'vault>(
    vault: &'vault Vault,
    collection: CollectionId,
    filter_text: &str,
) -> Vec<&'vault Card> {
    let needle = filter_text.trim().to_lowercase();
    let mut cards: Vec<&Card> = vault
        .cards_in(collection)
        .filter(|card| {
            needle.is_empty()
                || contains_ci(&card.translation, &needle)
                || contains_ci(&card.native, &needle)
        })
        .collect();
    sort_by_translation(&mut cards);
    cards
}

/// Runs one structured search and returns matching cards in order.
///
/// A blank search text is an explicit empty-result sentinel, never match-all.
pub fn search_cards<'vault>(vault: &'vault Vault, spec: &SearchSpec) -> Vec<&'vault Card> {
    let needle = spec.text.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut cards: Vec<&Card> = vault
        .cards_in(spec.collection)
        .filter(|card| matches_scope(vault, card, spec.scope, &needle))
        .filter(|card| matches_filter(card.uuid, spec.filter.as_ref()))
        .collect();

    match spec.scope {
        SearchScope::Native => sort_by_native(&mut cards),
        _ => sort_by_translation(&mut cards),
    }
    cards
}

fn matches_scope(vault: &Vault, card: &Card, scope: SearchScope, needle: &str) -> bool {
    match scope {
        SearchScope::TranslationOrNative => {
            contains_ci(&card.translation, needle) || contains_ci(&card.native, needle)
        }
        SearchScope::Translation => contains_ci(&card.translation, needle),
        SearchScope::Native => contains_ci(&card.native, needle),
        SearchScope::Note => contains_ci(&card.note, needle),
        SearchScope::Tag => card.tags.iter().any(|tag_id| {
            vault
                .tag(*tag_id)
                .is_some_and(|tag| contains_ci(&tag.name, needle))
        }),
    }
}

fn matches_filter(id: CardId, filter: Option<&SearchFilter>) -> bool {
    match filter {
        None => true,
        Some(SearchFilter::Include(ids)) => ids.contains(&id),
        Some(SearchFilter::Exclude(ids)) => !ids.contains(&id),
    }
}

// Needle must already be lowercased.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn sort_by_translation(cards: &mut [&Card]) {
    cards.sort_by(|a, b| {
        a.translation
            .cmp(&b.translation)
            .then_with(|| a.uuid.cmp(&b.uuid))
    });
}

fn sort_by_native(cards: &mut [&Card]) {
    cards.sort_by(|a, b| a.native.cmp(&b.native).then_with(|| a.uuid.cmp(&b.uuid)));
}
