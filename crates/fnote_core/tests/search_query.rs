use fnote_core::{
    list_cards, search_cards, Card, Collection, Formality, SearchFilter, SearchScope, SearchSpec,
    Vault,
};
use std::collections::BTreeSet;
use uuid::Uuid;

fn seed_vault() -> (Vault, Uuid) {
    let mut vault = Vault::new();
    let collection = vault.insert_collection(Collection::new("German")).unwrap();
    (vault, collection)
}

fn add_card(
    vault: &mut Vault,
    collection: Uuid,
    native: &str,
    translation: &str,
    note: &str,
) -> Uuid {
    let mut card = Card::new(Some(collection));
    card.native = native.to_string();
    card.translation = translation.to_string();
    card.note = note.to_string();
    card.formality = Formality::Neutral;
    vault.upsert_card(card).unwrap()
}

#[test]
fn blank_search_text_matches_nothing() {
    let (mut vault, collection) = seed_vault();
    add_card(&mut vault, collection, "Hallo", "Hello", "");

    for text in ["", "   ", "\t"] {
        let spec = SearchSpec::new(collection, SearchScope::TranslationOrNative, text);
        assert!(search_cards(&vault, &spec).is_empty());
    }
}

#[test]
fn blank_listing_text_returns_whole_collection_sorted_by_translation() {
    let (mut vault, collection) = seed_vault();
    add_card(&mut vault, collection, "Tschüss", "Goodbye", "");
    add_card(&mut vault, collection, "Hallo", "Hello", "");
    add_card(&mut vault, collection, "Danke", "Thanks", "");

    let listed = list_cards(&vault, collection, "");
    let translations: Vec<&str> = listed.iter().map(|card| card.translation.as_str()).collect();
    assert_eq!(translations, ["Goodbye", "Hello", "Thanks"]);
}

#[test]
fn listing_with_text_matches_translation_or_native() {
    let (mut vault, collection) = seed_vault();
    let hello = add_card(&mut vault, collection, "Hallo", "Hello", "");
    add_card(&mut vault, collection, "Tschüss", "Goodbye", "");

    let by_translation = list_cards(&vault, collection, "hell");
    assert_eq!(by_translation.len(), 1);
    assert_eq!(by_translation[0].uuid, hello);

    let by_native = list_cards(&vault, collection, "HALLO");
    assert_eq!(by_native.len(), 1);
    assert_eq!(by_native[0].uuid, hello);
}

#[test]
fn native_scope_matches_case_insensitive_substring() {
    let (mut vault, collection) = seed_vault();
    let hi = add_card(&mut vault, collection, "Hi there", "greeting", "");
    add_card(&mut vault, collection, "Bye", "farewell", "");

    let spec = SearchSpec::new(collection, SearchScope::Native, "hi");
    let hits = search_cards(&vault, &spec);

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uuid, hi);
}

#[test]
fn native_scope_sorts_by_native_ascending() {
    let (mut vault, collection) = seed_vault();
    add_card(&mut vault, collection, "Zug", "train", "");
    add_card(&mut vault, collection, "Zaun", "fence", "");

    let spec = SearchSpec::new(collection, SearchScope::Native, "z");
    let natives: Vec<&str> = search_cards(&vault, &spec)
        .iter()
        .map(|card| card.native.as_str())
        .collect();
    assert_eq!(natives, ["Zaun", "Zug"]);
}

#[test]
fn translation_scope_ignores_native_text() {
    let (mut vault, collection) = seed_vault();
    add_card(&mut vault, collection, "hello", "Hallo", "");
    let target = add_card(&mut vault, collection, "Tschüss", "farewell", "");

    let spec = SearchSpec::new(collection, SearchScope::Translation, "well");
    let hits = search_cards(&vault, &spec);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uuid, target);
}

#[test]
fn note_scope_matches_note_and_sorts_by_translation() {
    let (mut vault, collection) = seed_vault();
    add_card(&mut vault, collection, "Hallo", "Hello", "casual greeting");
    add_card(&mut vault, collection, "Guten Tag", "Good day", "formal greeting");
    add_card(&mut vault, collection, "Tschüss", "Goodbye", "leaving");

    let spec = SearchSpec::new(collection, SearchScope::Note, "GREETING");
    let translations: Vec<&str> = search_cards(&vault, &spec)
        .iter()
        .map(|card| card.translation.as_str())
        .collect();
    assert_eq!(translations, ["Good day", "Hello"]);
}

#[test]
fn tag_scope_matches_any_tag_name_substring() {
    let (mut vault, collection) = seed_vault();
    let tagged = add_card(&mut vault, collection, "Sie", "you (formal)", "");
    add_card(&mut vault, collection, "du", "you", "");
    vault.add_tag(tagged, "Formal Speech", None).unwrap().unwrap();

    let spec = SearchSpec::new(collection, SearchScope::Tag, "formal");
    let hits = search_cards(&vault, &spec);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uuid, tagged);
}

#[test]
fn include_filter_narrows_matches() {
    let (mut vault, collection) = seed_vault();
    let first = add_card(&mut vault, collection, "Hallo", "Hello", "");
    let second = add_card(&mut vault, collection, "Hallo nochmal", "Hello again", "");

    let mut spec = SearchSpec::new(collection, SearchScope::TranslationOrNative, "hello");
    spec.filter = Some(SearchFilter::Include(BTreeSet::from([second])));
    let hits = search_cards(&vault, &spec);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uuid, second);

    spec.filter = Some(SearchFilter::Exclude(BTreeSet::from([second])));
    let hits = search_cards(&vault, &spec);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uuid, first);
}

#[test]
fn unknown_collection_yields_zero_results_without_error() {
    let (mut vault, collection) = seed_vault();
    add_card(&mut vault, collection, "Hallo", "Hello", "");

    let ghost = Uuid::new_v4();
    assert!(list_cards(&vault, ghost, "").is_empty());

    let spec = SearchSpec::new(ghost, SearchScope::TranslationOrNative, "hello");
    assert!(search_cards(&vault, &spec).is_empty());
}

#[test]
fn search_stays_inside_the_requested_collection() {
    let (mut vault, collection) = seed_vault();
    let other = vault.insert_collection(Collection::new("Other")).unwrap();
    let inside = add_card(&mut vault, collection, "Hallo", "Hello", "");
    add_card(&mut vault, other, "Hallo", "Hello", "");

    let spec = SearchSpec::new(collection, SearchScope::TranslationOrNative, "hello");
    let hits = search_cards(&vault, &spec);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uuid, inside);
}
