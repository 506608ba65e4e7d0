use spec_refinery::engine::alias_index::{community_priority, AliasIndex, AliasIndexCache, CommunityAliases};
use spec_refinery::engine::normalization::{canonicalize, expand_abbreviations, normalize};
use spec_refinery::engine::similarity::similarity_score;
use spec_refinery::engine::Schema;
use std::sync::Arc;

// * Test Suite for key normalization and the alias index

fn schema() -> Schema {
    Schema::new()
        .with_category("Lenses", ["Maximum Aperture", "Focal Length", "Filter Size", "Weight"])
        .with_category("Cameras", ["Sensor Size", "Weight", "ISO Range"])
}

#[test]
fn test_normalize_is_idempotent() {
    for input in ["  Maximum   Aperture ", "Wi-Fi (2.4 GHz)", "Color Temp. [K]", "ISO\u{2013}Range", ""] {
        let once = normalize(input);
        assert_eq!(normalize(&once), once, "{:?}", input);
    }
}

#[test]
fn test_normalize_folds_case_and_punctuation() {
    assert_eq!(normalize("Weight (g)"), "weight g");
    assert_eq!(normalize("MAX APERTURE"), "max aperture");
}

#[test]
fn test_expansion_and_canonical_form() {
    assert_eq!(expand_abbreviations("max aperture"), "maximum aperture");
    assert_eq!(canonicalize("Max Aperture"), "maximum aperture");
}

#[test]
fn test_similarity_bounds() {
    assert_eq!(similarity_score("Weight", "WEIGHT"), 100);
    assert_eq!(similarity_score("Max Aperture", "Maximum Aperture"), 97);
    assert_eq!(similarity_score("", "Weight"), 0);
    assert_eq!(similarity_score("(  )", "Weight"), 0);

    let score = similarity_score("Lens Filter Thread", "Filter Size");
    assert!(score <= 100);
}

#[test]
fn test_schema_names_claim_top_priority() {
    let index = AliasIndex::build(&schema());

    let weight = index.lookup("weight").unwrap();
    assert_eq!(weight.spec_name, "Weight");
    assert_eq!(weight.priority, 100);
    // * First category to declare a spec keeps it
    assert_eq!(index.category_of("Weight"), Some("Lenses"));

    let expanded = index.lookup("maximum aperture").unwrap();
    assert_eq!(expanded.priority, 100);
    assert_eq!(index.spec_names().len(), 6);
}

#[test]
fn test_curated_aliases_only_for_declared_specs() {
    let index = AliasIndex::build(&schema());

    let mass = index.lookup("mass").unwrap();
    assert_eq!(mass.spec_name, "Weight");
    assert_eq!(mass.priority, 80);

    // * Polar Pattern is not in this schema
    assert!(index.lookup("pickup pattern").is_none());
}

#[test]
fn test_community_alias_never_outranks_curated() {
    let mut community = CommunityAliases::new();
    community.insert("mass", "Filter Size", 500);
    community.insert("heft", "Weight", 10);
    community.insert("colour", "Color", 50);

    let index = AliasIndex::build_with_community(&schema(), Some(&community));

    assert_eq!(index.lookup("mass").unwrap().spec_name, "Weight");
    let heft = index.lookup("heft").unwrap();
    assert_eq!(heft.spec_name, "Weight");
    assert_eq!(heft.priority, community_priority(10));
    // * Unknown target spec is skipped
    assert!(index.lookup("colour").is_none());
}

#[test]
fn test_community_priority_curve() {
    assert_eq!(community_priority(3), 55);
    assert_eq!(community_priority(5), 58);
    assert_eq!(community_priority(1000), 75);
    assert_eq!(community_priority(0), 50);
}

#[test]
fn test_index_cache_reuses_builds() {
    let mut cache = AliasIndexCache::new();
    let a = cache.get_or_build(&schema(), None);
    let b = cache.get_or_build(&schema(), None);
    assert!(Arc::ptr_eq(&a, &b));

    let mut community = CommunityAliases::new();
    community.insert("heft", "Weight", 4);
    let c = cache.get_or_build(&schema(), Some(&community));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(cache.len(), 2);
}
