use fnote_core::{Card, Collection, Formality, ValidationReason};
use uuid::Uuid;

#[test]
fn new_card_sets_defaults() {
    let card = Card::new(None);

    assert!(!card.uuid.is_nil());
    assert_eq!(card.native, "");
    assert_eq!(card.translation, "");
    assert_eq!(card.note, "");
    assert_eq!(card.formality, Formality::Unspecified);
    assert!(!card.is_favorite);
    assert!(card.collection.is_none());
    assert!(card.relations.is_empty());
    assert!(card.alternatives.is_empty());
    assert!(card.tags.is_empty());
}

#[test]
fn card_validates_iff_trimmed_inputs_and_collection() {
    let mut card = Card::new(Some(Uuid::new_v4()));
    card.native = "   ".to_string();
    card.translation = "Hi".to_string();

    let err = card.validate().unwrap_err();
    assert!(err.contains(ValidationReason::EmptyNative));
    assert!(!err.contains(ValidationReason::EmptyTranslation));

    card.native = "안녕".to_string();
    assert!(card.validate().is_ok());

    card.collection = None;
    let err = card.validate().unwrap_err();
    assert_eq!(err.reasons(), [ValidationReason::MissingCollection]);
}

#[test]
fn validation_reports_every_failed_reason_at_once() {
    let card = Card::new(None);
    let err = card.validate().unwrap_err();

    assert_eq!(
        err.reasons(),
        [
            ValidationReason::EmptyNative,
            ValidationReason::EmptyTranslation,
            ValidationReason::MissingCollection,
        ]
    );
}

#[test]
fn normalize_trims_all_text_fields() {
    let mut card = Card::new(Some(Uuid::new_v4()));
    card.native = "  Hallo  ".to_string();
    card.translation = "\tHello\n".to_string();
    card.note = " greeting ".to_string();

    card.normalize();

    assert_eq!(card.native, "Hallo");
    assert_eq!(card.translation, "Hello");
    assert_eq!(card.note, "greeting");
}

#[test]
fn formality_raw_values_are_fixed() {
    assert_eq!(Formality::Unspecified.raw(), 0);
    assert_eq!(Formality::Informal.raw(), 1);
    assert_eq!(Formality::Neutral.raw(), 2);
    assert_eq!(Formality::Formal.raw(), 3);

    for formality in Formality::ALL {
        assert_eq!(Formality::from_raw(formality.raw()), Some(formality));
    }
    assert_eq!(Formality::from_raw(4), None);
    assert_eq!(Formality::from_raw(-1), None);
}

#[test]
fn formality_titles_and_abbreviations() {
    assert_eq!(Formality::Unspecified.title(), "Undecided");
    assert_eq!(Formality::Formal.abbreviation(), "F");
}

#[test]
fn entity_equality_goes_by_id_not_content() {
    let mut a = Card::new(Some(Uuid::new_v4()));
    a.native = "Hei".to_string();
    let mut b = Card::new(a.collection);
    b.native = "Hei".to_string();

    assert_ne!(a, b);

    let mut same_id = a.clone();
    same_id.native = "completely different".to_string();
    assert_eq!(a, same_id);
}

#[test]
fn collection_name_must_be_non_empty_after_trim() {
    let mut collection = Collection::new("  ");
    let err = collection.validate().unwrap_err();
    assert_eq!(err.reasons(), [ValidationReason::EmptyCollectionName]);

    collection.name = " Korean 101 ".to_string();
    collection.normalize();
    assert_eq!(collection.name, "Korean 101");
    assert!(collection.validate().is_ok());
}

#[test]
fn formality_serializes_snake_case() {
    let json = serde_json::to_string(&Formality::Informal).unwrap();
    assert_eq!(json, "\"informal\"");
    let parsed: Formality = serde_json::from_str("\"neutral\"").unwrap();
    assert_eq!(parsed, Formality::Neutral);
}
