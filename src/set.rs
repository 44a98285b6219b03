//! Unique-key set backed by the dense table core.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use fxhash::FxBuildHasher;

use crate::cursor::{Cursor, NO_BUCKET};
use crate::equivalent::Equivalent;
use crate::error::CapacityError;
use crate::redirect::NIL;
use crate::store::{SetShape, SingleStore, Store};
use crate::table::{ProbeHit, RawTable};

/// A set of unique keys.
///
/// The same dense layout as [`DenseMap`](crate::DenseMap) with the value
/// half of every entry gone: keys pack into one contiguous array and the
/// control plane resolves membership with linear probing.
#[derive(Clone)]
pub struct DenseSet<K, S = FxBuildHasher> {
    pub(crate) raw: RawTable<SingleStore<SetShape<K>>, S>,
}

impl<K> DenseSet<K> {
    /// An empty set. Allocates nothing until the first insertion.
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher::default())
    }

    /// A set with `buckets` control slots up front, clamped to the floor
    /// of 1024.
    pub fn with_capacity(buckets: usize) -> Self {
        Self::with_capacity_and_hasher(buckets, FxBuildHasher::default())
    }
}

impl<K, S> DenseSet<K, S> {
    /// An empty set using `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        DenseSet {
            raw: RawTable::new(hasher),
        }
    }

    /// A set with `buckets` control slots (floor 1024) using `hasher`.
    pub fn with_capacity_and_hasher(buckets: usize, hasher: S) -> Self {
        DenseSet {
            raw: RawTable::with_buckets(buckets, hasher),
        }
    }

    /// Number of keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len
    }

    /// Whether the set holds no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.len == 0
    }

    /// Number of control slots, zero before the first allocation.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.raw.bucket_count()
    }

    /// How many times the control plane has been rebuilt or torn down.
    #[inline]
    pub fn rehash_count(&self) -> u64 {
        self.raw.stamp
    }

    /// Empties the set and releases every allocation.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Empties the set in O(bucket count), keeping all capacity.
    pub fn fast_clear(&mut self) {
        self.raw.fast_clear();
    }

    /// Rebuilds the control plane; may shrink, never below the floor.
    pub fn rehash(&mut self) {
        self.raw.force_rehash();
    }

    /// Grows the control plane so `additional` more keys fit without a
    /// rebuild.
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional);
    }

    /// Advisory request to release unused payload capacity.
    pub fn shrink_to_fit(&mut self) {
        self.raw.shrink_to_fit();
    }

    /// Iterates the keys in dense order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.raw.store.data.iter(),
        }
    }

    /// The key a cursor addresses, if its dense index is still in range.
    pub fn key_at(&self, cursor: Cursor) -> Option<&K> {
        self.raw.store.data.get(cursor.value_idx as usize)
    }

    /// The cursor one dense position after `cursor`, or `None` at the end.
    pub fn advance(&self, cursor: Cursor) -> Option<Cursor> {
        let next = cursor.value_idx as usize + 1;
        if next >= self.raw.store.data.len() {
            None
        } else {
            Some(self.raw.cursor(next, NO_BUCKET, NIL))
        }
    }
}

impl<K, S> DenseSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn locate<Q>(&self, probe: &Q) -> Option<(usize, usize)>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let hash = self.raw.hash_of(probe);
        self.raw.lookup(hash, probe)
    }

    /// Inserts `key`. Returns the key's cursor and whether an insertion
    /// happened; a present key is kept and the argument dropped.
    pub fn insert(&mut self, key: K) -> Result<(Cursor, bool), CapacityError> {
        if !self.raw.store.has_room() {
            return Err(CapacityError);
        }
        self.raw.ensure_allocated();
        let hash = self.raw.hash_of(&key);
        match self.raw.probe_lookup(hash, &key) {
            ProbeHit::Found { bucket, idx } => Ok((self.raw.cursor(idx, bucket, NIL), false)),
            ProbeHit::Empty { bucket } => {
                let idx = self.raw.store.data.len();
                self.raw.store.data.push(key);
                self.raw.attach(bucket, hash, idx);
                self.raw.len += 1;
                let bucket = if self.raw.grow_if_needed() {
                    NO_BUCKET
                } else {
                    bucket
                };
                Ok((self.raw.cursor(idx, bucket, NIL), true))
            }
        }
    }

    /// Cursor to `probe`'s key, or `None`.
    pub fn find<Q>(&self, probe: &Q) -> Option<Cursor>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let (bucket, idx) = self.locate(probe)?;
        Some(self.raw.cursor(idx, bucket, NIL))
    }

    /// The stored key equivalent to `probe`.
    pub fn get<Q>(&self, probe: &Q) -> Option<&K>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let (_, idx) = self.locate(probe)?;
        Some(&self.raw.store.data[idx])
    }

    /// Whether `probe` is a member.
    pub fn contains<Q>(&self, probe: &Q) -> bool
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.locate(probe).is_some()
    }

    /// Removes `probe`'s key and returns it.
    pub fn remove<Q>(&mut self, probe: &Q) -> Option<K>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let (bucket, _) = self.locate(probe)?;
        let (key, _) = self.raw.detach(bucket);
        Some(key)
    }

    /// Removes the key a cursor addresses and returns it.
    pub fn remove_at(&mut self, cursor: Cursor) -> Option<K> {
        let bucket = self.raw.bucket_for(cursor)?;
        let (key, _) = self.raw.detach(bucket);
        Some(key)
    }
}

impl<K, S: Default> Default for DenseSet<K, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K: fmt::Debug, S> fmt::Debug for DenseSet<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S> Extend<K> for DenseSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts every key; duplicates are dropped.
    ///
    /// Panics when the dense index space is exhausted.
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key).expect("dense table at capacity");
        }
    }
}

impl<K, S> FromIterator<K> for DenseSet<K, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<K, const N: usize> From<[K; N]> for DenseSet<K>
where
    K: Hash + Eq,
{
    fn from(keys: [K; N]) -> Self {
        Self::from_iter(keys)
    }
}

/// Borrowing iterator over a set's keys in dense order.
pub struct Iter<'a, K> {
    inner: std::slice::Iter<'a, K>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

/// Owning iterator over a set's keys in dense order.
pub struct IntoIter<K> {
    inner: std::vec::IntoIter<K>,
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}

impl<K, S> IntoIterator for DenseSet<K, S> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter {
            inner: self.raw.store.data.into_iter(),
        }
    }
}

impl<'a, K, S> IntoIterator for &'a DenseSet<K, S> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::DenseSet;

    #[test]
    fn membership_round_trip() {
        let mut set = DenseSet::new();
        assert!(set.insert("a").unwrap().1);
        assert!(set.insert("b").unwrap().1);
        assert!(!set.insert("a").unwrap().1);

        assert_eq!(set.len(), 2);
        assert!(set.contains(&"a"));
        assert!(!set.contains(&"c"));

        assert_eq!(set.remove(&"a"), Some("a"));
        assert_eq!(set.remove(&"a"), None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn heterogeneous_membership() {
        let set: DenseSet<String> = ["one".into(), "two".into()].into();
        assert!(set.contains("one"));
        assert_eq!(set.get("two").map(String::as_str), Some("two"));
        assert!(!set.contains("three"));
    }

    #[test]
    fn cursor_walk_covers_the_set() {
        let mut set = DenseSet::new();
        for k in 0u32..50 {
            set.insert(k).unwrap();
        }
        let mut cursor = set.find(&0).unwrap();
        let mut seen = 1;
        while let Some(next) = set.advance(cursor) {
            cursor = next;
            seen += 1;
            assert!(set.key_at(cursor).is_some());
        }
        assert_eq!(seen, 50);
    }

    #[test]
    fn removal_keeps_probe_chains_sound() {
        let mut set = DenseSet::new();
        for k in 0u32..4000 {
            set.insert(k).unwrap();
        }
        for k in (0u32..4000).step_by(3) {
            assert!(set.remove(&k).is_some());
        }
        for k in 0u32..4000 {
            assert_eq!(set.contains(&k), k % 3 != 0);
        }
        set.raw.check_invariants();
    }
}
