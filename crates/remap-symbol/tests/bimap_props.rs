use proptest::prelude::*;
use remap_symbol::BiMap;
use std::collections::HashSet;

proptest! {
    #[test]
    fn prop_bimap_stays_injective(
        ops in proptest::collection::vec((0..16u8, 0..16u8, any::<bool>()), 0..200)
    ) {
        let mut map: BiMap<u8, u8> = BiMap::new();

        for (key, value, remove) in ops {
            if remove {
                let _ = map.remove(&key);
            } else {
                let before = map.get(&key).copied();
                match map.insert(key, value) {
                    Ok(_) => prop_assert_eq!(map.get(&key), Some(&value)),
                    Err(err) => {
                        // A rejected insert leaves the key untouched.
                        prop_assert_eq!(map.get(&key).copied(), before);
                        prop_assert_ne!(err.existing, key);
                    }
                }
            }

            // Invariant: values are unique and both directions agree.
            let mut seen = HashSet::new();
            for (k, v) in map.iter() {
                prop_assert!(seen.insert(*v));
                prop_assert_eq!(map.get_by_value(v), Some(k));
            }
        }
    }
}

#[test]
fn identity_seed_then_rename() {
    let mut map: BiMap<&str, &str> = BiMap::new();
    for name in ["a/A", "a/B", "a/C"] {
        map.insert(name, name).unwrap();
    }

    map.insert("a/A", "x/Alpha").unwrap();
    assert_eq!(map.get_by_value("x/Alpha"), Some(&"a/A"));
    assert!(!map.contains_value("a/A"));

    // `a/B` still maps to itself, so nobody else may take that name.
    assert!(map.insert("a/C", "a/B").is_err());
}
