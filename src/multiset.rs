//! Multi-set backed by the dense table core.

use std::fmt;
use std::hash::{BuildHasher, Hash};

use fxhash::FxBuildHasher;

use crate::cursor::{Cursor, NO_BUCKET};
use crate::equivalent::Equivalent;
use crate::error::CapacityError;
use crate::nodelist::{BucketList, NodeSlab};
use crate::redirect::{NIL, RawIdx};
use crate::store::{MultiStore, SetShape, Store};
use crate::table::{ProbeHit, RawTable};

/// A set that counts: every insertion of a key is kept as its own element.
///
/// All copies of one key share a bucket and form an ordered list, exactly
/// like [`DenseMultiMap`](crate::DenseMultiMap) with the value halves
/// gone. [`len`](DenseMultiSet::len) counts elements,
/// [`key_count`](DenseMultiSet::key_count) counts distinct keys.
#[derive(Clone)]
pub struct DenseMultiSet<K, S = FxBuildHasher> {
    pub(crate) raw: RawTable<MultiStore<SetShape<K>>, S>,
}

impl<K> DenseMultiSet<K> {
    /// An empty multi-set. Allocates nothing until the first insertion.
    pub fn new() -> Self {
        Self::with_hasher(FxBuildHasher::default())
    }

    /// A multi-set with `buckets` control slots up front, clamped to the
    /// floor of 1024.
    pub fn with_capacity(buckets: usize) -> Self {
        Self::with_capacity_and_hasher(buckets, FxBuildHasher::default())
    }
}

impl<K, S> DenseMultiSet<K, S> {
    /// An empty multi-set using `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        DenseMultiSet {
            raw: RawTable::new(hasher),
        }
    }

    /// A multi-set with `buckets` control slots (floor 1024) using
    /// `hasher`.
    pub fn with_capacity_and_hasher(buckets: usize, hasher: S) -> Self {
        DenseMultiSet {
            raw: RawTable::with_buckets(buckets, hasher),
        }
    }

    /// Total number of elements, duplicates included.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len
    }

    /// Whether the multi-set holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.len == 0
    }

    /// Number of distinct keys.
    #[inline]
    pub fn key_count(&self) -> usize {
        self.raw.store.lists.len()
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

    /// Empties the multi-set and releases every allocation.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Empties the multi-set in O(bucket count), keeping all capacity.
    pub fn fast_clear(&mut self) {
        self.raw.fast_clear();
    }

    /// Rebuilds the control plane; may shrink, never below the floor.
    pub fn rehash(&mut self) {
        self.raw.force_rehash();
    }

    /// Grows the control plane so `additional` more distinct keys fit
    /// without a rebuild.
    pub fn reserve(&mut self, additional: usize) {
        self.raw.reserve(additional);
    }

    /// Advisory request to release unused payload capacity.
    pub fn shrink_to_fit(&mut self) {
        self.raw.shrink_to_fit();
    }

    /// Iterates every element, duplicates adjacent, groups in dense order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            lists: &self.raw.store.lists,
            nodes: &self.raw.store.nodes,
            next_list: 0,
            node: NIL,
        }
    }

    /// Iterates the distinct keys in dense order.
    pub fn keys(&self) -> Keys<'_, K> {
        Keys {
            inner: self.raw.store.shadow.iter(),
        }
    }

    /// The element a cursor addresses, if its node is still live.
    pub fn key_at(&self, cursor: Cursor) -> Option<&K> {
        self.raw.store.nodes.get(cursor.node)
    }

    /// Cursor to the first element in dense order.
    pub fn first(&self) -> Option<Cursor> {
        let list = self.raw.store.lists.first()?;
        Some(self.raw.cursor(0, NO_BUCKET, list.head))
    }

    /// The cursor one element after `cursor` in all-elements order.
    pub fn advance(&self, cursor: Cursor) -> Option<Cursor> {
        let next = self.raw.store.nodes.next_of(cursor.node);
        if next != NIL {
            return Some(self.raw.cursor(cursor.value_idx as usize, NO_BUCKET, next));
        }
        let idx = cursor.value_idx as usize + 1;
        let list = self.raw.store.lists.get(idx)?;
        Some(self.raw.cursor(idx, NO_BUCKET, list.head))
    }

    /// The cursor one element after `cursor` within its bucket.
    pub fn advance_in_bucket(&self, cursor: Cursor) -> Option<Cursor> {
        let next = self.raw.store.nodes.next_of(cursor.node);
        if next == NIL {
            return None;
        }
        let bucket = if cursor.stamp == self.raw.stamp {
            cursor.bucket
        } else {
            NO_BUCKET
        };
        Some(self.raw.cursor(cursor.value_idx as usize, bucket, next))
    }
}

impl<K, S> DenseMultiSet<K, S>
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

    /// Inserts one more copy of `key` and returns its cursor.
    pub fn insert(&mut self, key: K) -> Result<Cursor, CapacityError>
    where
        K: Clone,
    {
        if !self.raw.store.has_room() {
            return Err(CapacityError);
        }
        self.raw.ensure_allocated();
        let hash = self.raw.hash_of(&key);
        match self.raw.probe_lookup(hash, &key) {
            ProbeHit::Found { bucket, idx } => {
                let store = &mut self.raw.store;
                let mut list = store.lists[idx];
                let node = store.nodes.push_back(&mut list, key);
                store.lists[idx] = list;
                self.raw.len += 1;
                Ok(self.raw.cursor(idx, bucket, node))
            }
            ProbeHit::Empty { bucket } => {
                let store = &mut self.raw.store;
                let idx = store.lists.len();
                store.shadow.push(key.clone());
                let list = store.nodes.singleton(key);
                let node = list.head;
                store.lists.push(list);
                self.raw.attach(bucket, hash, idx);
                self.raw.len += 1;
                let bucket = if self.raw.grow_if_needed() {
                    NO_BUCKET
                } else {
                    bucket
                };
                Ok(self.raw.cursor(idx, bucket, node))
            }
        }
    }

    /// Cursor to the first copy of `probe`, or `None`.
    pub fn find<Q>(&self, probe: &Q) -> Option<Cursor>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let (bucket, idx) = self.locate(probe)?;
        let node = self.raw.store.lists[idx].head;
        Some(self.raw.cursor(idx, bucket, node))
    }

    /// The first stored copy equivalent to `probe`.
    pub fn get<Q>(&self, probe: &Q) -> Option<&K>
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        let (_, idx) = self.locate(probe)?;
        let head = self.raw.store.lists[idx].head;
        self.raw.store.nodes.get(head)
    }

    /// Number of copies of `probe`.
    pub fn count<Q>(&self, probe: &Q) -> usize
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.locate(probe)
            .map(|(_, idx)| self.raw.store.lists[idx].len)
            .unwrap_or(0)
    }

    /// Whether at least one copy of `probe` is stored.
    pub fn contains<Q>(&self, probe: &Q) -> bool
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        self.locate(probe).is_some()
    }

    /// Removes every copy of `probe`. Returns how many elements went.
    pub fn remove<Q>(&mut self, probe: &Q) -> usize
    where
        Q: Hash + Equivalent<K> + ?Sized,
    {
        match self.locate(probe) {
            Some((bucket, _)) => self.raw.detach(bucket).1,
            None => 0,
        }
    }

    /// Removes the single copy a cursor addresses; see
    /// [`DenseMultiMap::remove_at`](crate::DenseMultiMap::remove_at) for
    /// the splice semantics.
    pub fn remove_at(&mut self, cursor: Cursor) -> Option<Cursor> {
        let bucket = self.raw.bucket_for(cursor)?;
        let idx = self.raw.redir[bucket].idx as usize;
        self.raw.store.nodes.get(cursor.node)?;
        if self.raw.store.lists[idx].len >= 2 {
            let store = &mut self.raw.store;
            let mut list = store.lists[idx];
            let (_, next) = store.nodes.unlink(&mut list, cursor.node);
            store.lists[idx] = list;
            self.raw.len -= 1;
            if next == NIL {
                None
            } else {
                Some(self.raw.cursor(idx, bucket, next))
            }
        } else {
            self.raw.detach(bucket);
            None
        }
    }

    /// Removes the whole bucket the cursor's element belongs to. Returns
    /// how many elements went.
    pub fn remove_all_at(&mut self, cursor: Cursor) -> usize {
        match self.raw.bucket_for(cursor) {
            Some(bucket) => self.raw.detach(bucket).1,
            None => 0,
        }
    }
}

impl<K, S: Default> Default for DenseMultiSet<K, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K: fmt::Debug, S> fmt::Debug for DenseMultiSet<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S> Extend<K> for DenseMultiSet<K, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Inserts every key, keeping duplicates.
    ///
    /// Panics when the dense index space is exhausted.
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key).expect("dense table at capacity");
        }
    }
}

impl<K, S> FromIterator<K> for DenseMultiSet<K, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<K, const N: usize> From<[K; N]> for DenseMultiSet<K>
where
    K: Hash + Eq + Clone,
{
    fn from(keys: [K; N]) -> Self {
        Self::from_iter(keys)
    }
}

/// Borrowing iterator over every element of a multi-set.
pub struct Iter<'a, K> {
    lists: &'a [BucketList],
    nodes: &'a NodeSlab<K>,
    next_list: usize,
    node: RawIdx,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.node != NIL {
                let cur = self.node;
                self.node = self.nodes.next_of(cur);
                return self.nodes.get(cur);
            }
            let list = self.lists.get(self.next_list)?;
            self.next_list += 1;
            self.node = list.head;
        }
    }
}

/// Borrowing iterator over a multi-set's distinct keys.
pub struct Keys<'a, K> {
    inner: std::slice::Iter<'a, K>,
}

impl<'a, K> Iterator for Keys<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K> ExactSizeIterator for Keys<'_, K> {}

/// Owning iterator over every element of a multi-set.
pub struct IntoIter<K> {
    lists: std::vec::IntoIter<BucketList>,
    nodes: NodeSlab<K>,
    node: RawIdx,
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.node != NIL {
                let (item, next) = self.nodes.take(self.node)?;
                self.node = next;
                return Some(item);
            }
            let list = self.lists.next()?;
            self.node = list.head;
        }
    }
}

impl<K, S> IntoIterator for DenseMultiSet<K, S> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter {
            lists: self.raw.store.lists.into_iter(),
            nodes: self.raw.store.nodes,
            node: NIL,
        }
    }
}

impl<'a, K, S> IntoIterator for &'a DenseMultiSet<K, S> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}
