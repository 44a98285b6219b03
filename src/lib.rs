#![deny(missing_docs)]
//! Dense open-addressing associative containers.
//!
//! Four shapes share one probing engine: [`DenseMap`] and [`DenseSet`]
//! keep unique keys, [`DenseMultiMap`] and [`DenseMultiSet`] keep every
//! insertion as an ordered element of its key's bucket. All of them store
//! their payload densely packed, with a separate control plane of one-byte
//! hash tags and a redirection plane of cached hashes and value indices on
//! top. Lookups reject almost every non-matching slot with a single byte
//! compare; erasure swap-and-pops the payload and repairs the probe chain
//! by backward shifting, so the tables never carry tombstones.
//!
//! Hashing is injected through `std::hash::BuildHasher` and defaults to
//! `fxhash`. Lookups take any probe type that is [`Equivalent`] to the key
//! and hashes like it, so string tables answer `&str` probes directly.
//!
//! ```
//! use densemap::{DenseMap, DenseMultiMap};
//!
//! let mut index = DenseMap::new();
//! index.insert(String::from("alpha"), 1u32).unwrap();
//! assert_eq!(index.get("alpha"), Some(&1));
//!
//! let mut postings = DenseMultiMap::new();
//! postings.insert("term", 3u64).unwrap();
//! postings.insert("term", 17).unwrap();
//! let docs: Vec<u64> = postings.get_all("term").copied().collect();
//! assert_eq!(docs, vec![3, 17]);
//! ```

pub mod map;
pub mod multimap;
pub mod multiset;
pub mod set;

mod cursor;
mod equivalent;
mod error;
mod nodelist;
mod probe;
mod redirect;
mod store;
mod table;

pub use cursor::Cursor;
pub use equivalent::Equivalent;
pub use error::CapacityError;
pub use map::DenseMap;
pub use multimap::DenseMultiMap;
pub use multiset::DenseMultiSet;
pub use set::DenseSet;

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use crate::{DenseMap, DenseMultiMap, DenseMultiSet, DenseSet};

    #[test]
    fn the_four_shapes_agree_on_shared_semantics() {
        let mut map = DenseMap::new();
        let mut set = DenseSet::new();
        let mut multimap = DenseMultiMap::new();
        let mut multiset = DenseMultiSet::new();

        for k in 0u32..600 {
            map.insert(k, k).unwrap();
            set.insert(k).unwrap();
            multimap.insert(k, k).unwrap();
            multiset.insert(k).unwrap();
        }
        assert_eq!(map.len(), 600);
        assert_eq!(set.len(), 600);
        assert_eq!(multimap.len(), 600);
        assert_eq!(multiset.len(), 600);

        for shape_buckets in [
            map.bucket_count(),
            set.bucket_count(),
            multimap.bucket_count(),
            multiset.bucket_count(),
        ] {
            assert_eq!(shape_buckets, 1024);
        }

        for k in (0u32..600).step_by(7) {
            map.remove(&k);
            set.remove(&k);
            multimap.remove(&k);
            multiset.remove(&k);
        }
        assert_eq!(map.len(), set.len());
        assert_eq!(multimap.len(), multiset.len());
        assert_eq!(map.len(), multimap.len());

        map.raw.check_invariants();
        set.raw.check_invariants();
        multimap.raw.check_invariants();
        multiset.raw.check_invariants();
    }

    #[test]
    fn single_erasure_invalidates_at_most_two_cursors() {
        let mut map = DenseMap::new();
        for k in 0u32..20 {
            map.insert(k, k * 2).unwrap();
        }
        let cursors: Vec<_> = (0u32..20).map(|k| (k, map.find(&k).unwrap())).collect();

        map.remove(&5);

        for (k, cursor) in cursors {
            // The erased entry's cursor and the moved back entry's cursor
            // are the only casualties.
            if k == 5 || k == 19 {
                continue;
            }
            assert_eq!(map.entry_at(cursor), Some((&k, &(k * 2))));
        }
        assert_eq!(map.get(&19), Some(&38));
    }

    #[test]
    fn splice_invalidates_only_the_erased_node() {
        let mut map = DenseMultiMap::new();
        let mut cursors = Vec::new();
        for i in 0u32..5 {
            cursors.push((i, map.insert(42u32, i).unwrap()));
        }

        let (_, victim) = cursors[2];
        map.remove_at(victim);

        for (i, cursor) in cursors {
            if i == 2 {
                assert_eq!(map.entry_at(cursor), None);
            } else {
                assert_eq!(map.entry_at(cursor), Some((&42, &i)));
            }
        }
    }

    #[test]
    fn forced_rehash_preserves_contents_and_lookups() {
        let mut map = DenseMap::new();
        for k in 0u32..777 {
            map.insert(k, k ^ 0x5A5A).unwrap();
        }
        let before: Vec<(u32, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();

        map.rehash();

        assert_eq!(map.len(), 777);
        let after: Vec<(u32, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(before, after);
        for (k, v) in before {
            assert_eq!(map.get(&k), Some(&v));
        }
        map.raw.check_invariants();
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u16, u16),
        Remove(u16),
        Rehash,
        FastClear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            5 => (0u16..200, any::<u16>()).prop_map(|(k, v)| Op::Insert(k, v)),
            3 => (0u16..200).prop_map(Op::Remove),
            1 => Just(Op::Rehash),
            1 => Just(Op::FastClear),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn map_matches_a_model_under_churn(ops in proptest::collection::vec(op(), 1..300)) {
            let mut map = DenseMap::new();
            let mut model: HashMap<u16, u16> = HashMap::new();

            for op in ops {
                match op {
                    Op::Insert(k, v) => {
                        let (_, inserted) = map.insert(k, v).unwrap();
                        prop_assert_eq!(inserted, !model.contains_key(&k));
                        model.entry(k).or_insert(v);
                    }
                    Op::Remove(k) => {
                        prop_assert_eq!(map.remove(&k), model.remove(&k));
                    }
                    Op::Rehash => {
                        map.rehash();
                        map.raw.check_invariants();
                    }
                    Op::FastClear => {
                        map.fast_clear();
                        model.clear();
                    }
                }
            }

            map.raw.check_invariants();
            prop_assert_eq!(map.len(), model.len());
            for (k, v) in &model {
                prop_assert_eq!(map.get(k), Some(v));
            }
            for (k, _) in map.iter() {
                prop_assert!(model.contains_key(k));
            }
        }

        #[test]
        fn multimap_matches_a_model_under_churn(ops in proptest::collection::vec(op(), 1..300)) {
            let mut map = DenseMultiMap::new();
            let mut model: HashMap<u16, Vec<u16>> = HashMap::new();

            for op in ops {
                match op {
                    Op::Insert(k, v) => {
                        map.insert(k, v).unwrap();
                        model.entry(k).or_default().push(v);
                    }
                    Op::Remove(k) => {
                        // Alternate between whole-bucket removal and
                        // splicing out the first element.
                        if k % 2 == 0 {
                            let removed = map.remove(&k);
                            let expected = model.remove(&k).map_or(0, |list| list.len());
                            prop_assert_eq!(removed, expected);
                        } else {
                            match map.find(&k) {
                                Some(cursor) => {
                                    map.remove_at(cursor);
                                    let list = model.get_mut(&k).unwrap();
                                    list.remove(0);
                                    if list.is_empty() {
                                        model.remove(&k);
                                    }
                                }
                                None => prop_assert!(!model.contains_key(&k)),
                            }
                        }
                    }
                    Op::Rehash => {
                        map.rehash();
                        map.raw.check_invariants();
                    }
                    Op::FastClear => {
                        map.fast_clear();
                        model.clear();
                    }
                }
            }

            map.raw.check_invariants();
            map.raw.store.validate();
            prop_assert_eq!(map.key_count(), model.len());
            prop_assert_eq!(map.len(), model.values().map(Vec::len).sum::<usize>());
            for (k, expected) in &model {
                let got: Vec<u16> = map.get_all(k).copied().collect();
                prop_assert_eq!(&got, expected, "order drifted for key {}", k);
            }
        }
    }
}
