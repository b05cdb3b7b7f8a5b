use flat_compare::model::SubjectiveParam;
use flat_compare::parser::{Extractor, ListingExtractor};
use flat_compare::{FieldKey, FieldValue};

const LISTING: &str =
    "Prodej bytu 2+kk, Praha - Holešovice. Cena: 8 200 000 Kč. Plocha: 54 m². Sklep: ano.";

fn extractor() -> ListingExtractor {
    ListingExtractor::new().unwrap()
}

#[test]
fn full_listing_extracts_core_fields() {
    let result = extractor().extract(LISTING);

    assert_eq!(result.values[&FieldKey::Price], FieldValue::Integer(8_200_000));
    assert_eq!(result.values[&FieldKey::Size], FieldValue::Integer(54));
    assert_eq!(result.values[&FieldKey::Rooms], FieldValue::text("2+kk"));
    assert_eq!(result.values[&FieldKey::Location], FieldValue::text("Holešovice"));
    assert_eq!(result.values[&FieldKey::Cellar], FieldValue::Integer(1));
    assert_eq!(result.values[&FieldKey::Address], FieldValue::text("Praha"));
    assert_eq!(result.name, "Praha 2+kk");

    for key in [FieldKey::Price, FieldKey::Size, FieldKey::Cellar] {
        assert!(result.sources.contains_key(&key), "no source for {}", key);
    }
}

#[test]
fn spans_point_into_the_input() {
    let texts = [
        LISTING,
        "Byt 3+1, 72,5 m², 4. patro z 6, garáž, cihlový dům, PENB: c. Cena 11.900.000,-",
        "Ulice: Dukelských hrdinů 12, Praha 7. Balkon 4 m², sklep 3 m. 9 990 000 CZK",
    ];
    for text in texts {
        let result = extractor().extract(text);
        for (key, span) in &result.sources {
            assert_eq!(&text[span.start..span.end], span.text, "span of {}", key);
            assert!(result.values.contains_key(key));
        }
    }
}

#[test]
fn extraction_is_idempotent() {
    let first = extractor().extract(LISTING);
    let second = extractor().extract(LISTING);
    assert_eq!(first, second);
}

#[test]
fn small_numbers_are_never_prices() {
    let result = extractor().extract("3 patro, poplatky 4 500 Kč");
    assert!(!result.values.contains_key(&FieldKey::Price));
}

#[test]
fn absurd_bedroom_counts_do_not_panic() {
    let result = extractor().extract("Byt se 4294967295 bedrooms");
    assert!(!result.values.contains_key(&FieldKey::Rooms));
}

#[test]
fn layout_is_not_a_size() {
    let result = extractor().extract("Prodej bytu 2+kk");
    assert!(!result.values.contains_key(&FieldKey::Size));
    assert_eq!(result.values[&FieldKey::Rooms], FieldValue::text("2+kk"));
}

#[test]
fn wording_hints_suggest_ratings() {
    let result = extractor().extract("Tichý byt po kompletní rekonstrukci");
    assert_eq!(result.ratings.get(&SubjectiveParam::Noise), Some(&8));
    assert!(!result.ratings.contains_key(&SubjectiveParam::Vibe));
}
