use serde_json::json;

use super::*;

fn spec(label: &str) -> ActionSpec {
    ActionSpec::new(
        "click_element",
        json!({"selector": format!("button[name='{label}']")}),
        json!({"kind": "button", "label": label}),
    )
}

#[test]
fn test_ref_shape() {
    let ref_ = stable_ref(&spec("save"));
    assert!(ref_.starts_with(REF_PREFIX));
    assert_eq!(ref_.len(), REF_PREFIX.len() + 10);
    assert!(ref_[REF_PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_ref_is_deterministic() {
    assert_eq!(stable_ref(&spec("save")), stable_ref(&spec("save")));
    assert_ne!(stable_ref(&spec("save")), stable_ref(&spec("cancel")));
}

#[test]
fn test_ref_insensitive_to_key_order() {
    // Objects built in different key order hash identically because JSON
    // maps are key-sorted at serialization time.
    let a = ActionSpec::new(
        "fill",
        serde_json::from_str(r##"{"selector": "#email", "value": "x"}"##).unwrap(),
        json!({}),
    );
    let b = ActionSpec::new(
        "fill",
        serde_json::from_str(r##"{"value": "x", "selector": "#email"}"##).unwrap(),
        json!({}),
    );
    assert_eq!(stable_ref(&a), stable_ref(&b));
}

#[test]
fn test_store_set_and_resolve_roundtrip() {
    let mut store = AffordanceStore::default();
    let specs = vec![spec("save"), spec("cancel")];
    let refs = store.set(&specs, Some("https://example.com/form".into()), Some(7));

    assert_eq!(refs.len(), 2);
    assert_eq!(store.resolve(&refs[0]), Some(&specs[0]));
    assert_eq!(store.resolve(&refs[1]), Some(&specs[1]));
    assert_eq!(store.url.as_deref(), Some("https://example.com/form"));
    assert_eq!(store.cursor, Some(7));
    assert!(store.resolve("aff:0000000000").is_none());
}

#[test]
fn test_store_eviction_keeps_newest() {
    let mut store = AffordanceStore::default();
    for i in 0..250 {
        store.set(&[spec(&format!("button-{i}"))], None, None);
    }
    assert!(store.len() <= 200);
    // The newest entry survives; the oldest was evicted.
    let newest = stable_ref(&spec("button-249"));
    let oldest = stable_ref(&spec("button-0"));
    assert!(store.resolve(&newest).is_some());
    assert!(store.resolve(&oldest).is_none());
}

#[test]
fn test_store_same_spec_does_not_duplicate() {
    let mut store = AffordanceStore::default();
    store.set(&[spec("save")], None, None);
    store.set(&[spec("save")], None, None);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_refs_stable_across_dom_order() {
    // Semantically identical items listed in a different order produce the
    // same ref set.
    let mut store_a = AffordanceStore::default();
    let mut store_b = AffordanceStore::default();
    let mut refs_a = store_a.set(&[spec("save"), spec("cancel")], None, None);
    let mut refs_b = store_b.set(&[spec("cancel"), spec("save")], None, None);
    refs_a.sort();
    refs_b.sort();
    assert_eq!(refs_a, refs_b);
}
