//! Insert-or-skip merging of records into a [`Collection`].

use crate::ingest::codec::identity_key;
use crate::models::{Collection, NewsRecord};
use std::collections::HashSet;

/// Offer `record` to `collection`. Returns `true` when it was prepended.
///
/// `session_keys` answers most duplicate checks in O(1). A miss there still
/// scans the collection, because a collection restored from a snapshot may
/// hold keys this run never recorded; a key found that way is remembered so
/// the scan is not repeated.
///
/// Existing records are never reordered or replaced.
pub fn offer(
    collection: &mut Collection,
    session_keys: &mut HashSet<String>,
    record: NewsRecord,
) -> bool {
    let key = identity_key(&record);
    if session_keys.contains(&key) {
        return false;
    }

    let already_present = collection.iter().any(|existing| identity_key(existing) == key);
    session_keys.insert(key);
    if already_present {
        return false;
    }

    collection.prepend(record);
    true
}

/// Identity keys of every record in `collection`, used to seed a run.
pub fn seed_keys(collection: &Collection) -> HashSet<String> {
    collection.iter().map(identity_key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record;

    fn titles(collection: &Collection) -> Vec<&str> {
        collection.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_offer_twice_keeps_one_copy() {
        let mut collection = Collection::new();
        let mut keys = HashSet::new();
        let r = record("A", "vnexpress", Some("http://x/1"));

        assert!(offer(&mut collection, &mut keys, r.clone()));
        assert!(!offer(&mut collection, &mut keys, r));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_same_key_different_fields_is_duplicate() {
        let mut collection = Collection::new();
        let mut keys = HashSet::new();
        let first = record("A", "vnexpress", Some("http://x/1"));
        let mut second = record("A (updated)", "vietnamnet", Some("http://x/1"));
        second.summary = "changed".to_string();

        assert!(offer(&mut collection, &mut keys, first));
        assert!(!offer(&mut collection, &mut keys, second));
        assert_eq!(titles(&collection), vec!["A"]);
    }

    #[test]
    fn test_arrival_order_is_newest_first() {
        let mut collection = Collection::from(vec![record("prior", "vnexpress", None)]);
        let mut keys = seed_keys(&collection);

        for title in ["r1", "r2", "r3"] {
            assert!(offer(&mut collection, &mut keys, record(title, "vnexpress", None)));
        }
        assert_eq!(titles(&collection), vec!["r3", "r2", "r1", "prior"]);
    }

    #[test]
    fn test_rescan_catches_unseeded_collection() {
        let mut collection = Collection::from(vec![record("A", "vnexpress", Some("http://x/1"))]);
        let mut keys = HashSet::new();

        assert!(!offer(&mut collection, &mut keys, record("A", "vnexpress", Some("http://x/1"))));
        assert!(keys.contains("http://x/1"));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_url_and_fallback_keys_do_not_collide() {
        let mut collection = Collection::new();
        let mut keys = HashSet::new();

        assert!(offer(&mut collection, &mut keys, record("A", "vnexpress", Some("http://x/1"))));
        assert!(offer(&mut collection, &mut keys, record("A", "vnexpress", None)));
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_seed_keys_covers_collection() {
        let collection = Collection::from(vec![
            record("A", "vnexpress", Some("http://x/1")),
            record("B", "vietnamnet", None),
        ]);
        let keys = seed_keys(&collection);
        assert!(keys.contains("http://x/1"));
        assert!(keys.contains("vietnamnet__B"));
        assert_eq!(keys.len(), 2);
    }
}
