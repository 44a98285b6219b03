//! The switchable payload half of a table.
//!
//! The probing, erasure and rebuild paths are shared by all four shapes;
//! what varies is confined here: whether a dense entry is one element or an
//! ordered list, and whether keys are shadowed in a parallel array.

use std::marker::PhantomData;

use crate::nodelist::{BucketList, NodeSlab};
use crate::redirect::RawIdx;

/// Maps a table shape to its entry type and key projection.
pub(crate) trait Shape {
    /// Stored key type.
    type Key;
    /// One stored element: a bare key (sets) or a key-value pair (maps).
    type Entry;
    /// Projects the key out of an entry.
    fn key_of(entry: &Self::Entry) -> &Self::Key;
}

/// Shape of the map variants: entries are `(K, V)` pairs.
pub(crate) struct MapShape<K, V>(PhantomData<(K, V)>);

/// Shape of the set variants: entries are bare keys.
pub(crate) struct SetShape<K>(PhantomData<K>);

impl<K, V> Shape for MapShape<K, V> {
    type Key = K;
    type Entry = (K, V);

    #[inline]
    fn key_of(entry: &(K, V)) -> &K {
        &entry.0
    }
}

impl<K> Shape for SetShape<K> {
    type Key = K;
    type Entry = K;

    #[inline]
    fn key_of(entry: &K) -> &K {
        entry
    }
}

/// Dense payload storage behind the control and redirection planes.
pub(crate) trait Store: Default {
    /// The shape stored here.
    type Shape: Shape;
    /// What removing a whole bucket yields to the caller.
    type Removed;

    /// Number of dense entries, which equals the number of occupied buckets.
    fn data_len(&self) -> usize;
    /// Total element count across all entries.
    fn total_elements(&self) -> usize;
    /// The key cached for dense entry `idx`.
    fn key_at(&self, idx: usize) -> &<Self::Shape as Shape>::Key;
    /// Swap-and-pop entry `idx`. Returns the removal payload and how many
    /// elements went with it.
    fn swap_remove(&mut self, idx: usize) -> (Self::Removed, usize);
    /// Whether one more dense entry fits the index width.
    fn has_room(&self) -> bool;
    /// Empties the payload, keeping allocations.
    fn clear_retaining(&mut self);
    /// Empties the payload and releases its allocations.
    fn deallocate(&mut self);
    /// Advisory capacity release.
    fn shrink_to_fit(&mut self);
}

/// Payload of the single shapes: one entry per bucket.
pub(crate) struct SingleStore<P: Shape> {
    pub data: Vec<P::Entry>,
}

impl<P: Shape> Default for SingleStore<P> {
    fn default() -> Self {
        SingleStore { data: Vec::new() }
    }
}

impl<P: Shape> Clone for SingleStore<P>
where
    P::Entry: Clone,
{
    fn clone(&self) -> Self {
        SingleStore {
            data: self.data.clone(),
        }
    }
}

impl<P: Shape> Store for SingleStore<P> {
    type Shape = P;
    type Removed = P::Entry;

    #[inline]
    fn data_len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn total_elements(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn key_at(&self, idx: usize) -> &P::Key {
        P::key_of(&self.data[idx])
    }

    #[inline]
    fn swap_remove(&mut self, idx: usize) -> (P::Entry, usize) {
        (self.data.swap_remove(idx), 1)
    }

    #[inline]
    fn has_room(&self) -> bool {
        (self.data.len() as u64) < RawIdx::MAX as u64 - 1
    }

    fn clear_retaining(&mut self) {
        self.data.clear();
    }

    fn deallocate(&mut self) {
        self.data = Vec::new();
    }

    fn shrink_to_fit(&mut self) {
        self.data.shrink_to_fit();
    }
}

/// Payload of the multi shapes: per-bucket list headers, the shared node
/// slab, and the key shadow.
///
/// The shadow holds a copy of every bucket's key, parallel to `lists`, so
/// collision resolution compares keys without chasing a list node.
pub(crate) struct MultiStore<P: Shape> {
    pub lists: Vec<BucketList>,
    pub shadow: Vec<P::Key>,
    pub nodes: NodeSlab<P::Entry>,
}

impl<P: Shape> Default for MultiStore<P> {
    fn default() -> Self {
        MultiStore {
            lists: Vec::new(),
            shadow: Vec::new(),
            nodes: NodeSlab::default(),
        }
    }
}

impl<P: Shape> Clone for MultiStore<P>
where
    P::Entry: Clone,
    P::Key: Clone,
{
    fn clone(&self) -> Self {
        MultiStore {
            lists: self.lists.clone(),
            shadow: self.shadow.clone(),
            nodes: self.nodes.clone(),
        }
    }
}

impl<P: Shape> Store for MultiStore<P> {
    type Shape = P;
    type Removed = ();

    #[inline]
    fn data_len(&self) -> usize {
        self.lists.len()
    }

    fn total_elements(&self) -> usize {
        self.lists.iter().map(|l| l.len).sum()
    }

    #[inline]
    fn key_at(&self, idx: usize) -> &P::Key {
        &self.shadow[idx]
    }

    fn swap_remove(&mut self, idx: usize) -> ((), usize) {
        let list = self.lists.swap_remove(idx);
        self.shadow.swap_remove(idx);
        ((), self.nodes.drop_list(list))
    }

    #[inline]
    fn has_room(&self) -> bool {
        (self.lists.len() as u64) < RawIdx::MAX as u64 - 1 && self.nodes.has_room()
    }

    fn clear_retaining(&mut self) {
        self.lists.clear();
        self.shadow.clear();
        self.nodes.clear();
    }

    fn deallocate(&mut self) {
        self.lists = Vec::new();
        self.shadow = Vec::new();
        self.nodes.deallocate();
    }

    fn shrink_to_fit(&mut self) {
        self.lists.shrink_to_fit();
        self.shadow.shrink_to_fit();
        self.nodes.shrink_to_fit();
    }
}

#[cfg(test)]
impl<P: Shape> MultiStore<P>
where
    P::Key: Eq + std::fmt::Debug,
{
    /// Asserts the multi-shape invariants: non-empty lists, shadow keys
    /// matching every element, and a slab with no leaked nodes.
    pub(crate) fn validate(&self) {
        use crate::redirect::NIL;

        assert_eq!(self.lists.len(), self.shadow.len());
        let mut live = 0;
        for (idx, list) in self.lists.iter().enumerate() {
            assert!(list.len > 0, "bucket {idx} has an empty list");
            let mut cur = list.head;
            let mut seen = 0;
            while cur != NIL {
                let entry = self.nodes.get(cur).expect("dangling node index");
                assert_eq!(
                    P::key_of(entry),
                    &self.shadow[idx],
                    "shadow key diverged in bucket {idx}"
                );
                seen += 1;
                cur = self.nodes.next_of(cur);
            }
            assert_eq!(seen, list.len, "list length drifted in bucket {idx}");
            live += seen;
        }
        assert_eq!(live, self.nodes.live(), "slab leaked nodes");
    }
}
