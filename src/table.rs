//! The shared half of every table shape: control plane, redirection plane,
//! probing, whole-bucket erasure and rebuilds.
//!
//! A table is three cooperating arrays (four for multi shapes, which add a
//! key shadow). `ctrl` holds one byte per bucket, zero for empty, otherwise
//! a seven-bit hash tag with the occupancy bit set. `redir` pairs each
//! occupied bucket with its truncated hash and an index into the densely
//! packed payload. Lookups reject almost every non-matching slot on the
//! one-byte compare, fall back to the cached hash for expensive keys, and
//! only then run the equality predicate.
//!
//! There are no tombstones. Erasure clears one control slot and then
//! shifts every displaced successor one slot toward its home position, so
//! the probe-chain invariant (no gap between an entry's home slot and its
//! bucket) survives without ever poisoning the table.

use std::hash::{BuildHasher, Hash};

use crate::cursor::{Cursor, NO_BUCKET};
use crate::equivalent::Equivalent;
use crate::probe::{LinearProbing, partial_hash, stored_hash};
use crate::redirect::{RawIdx, Redirect};
use crate::store::{Shape, Store};

/// Key type of a store, for bounds.
pub(crate) type KeyOf<St> = <<St as Store>::Shape as Shape>::Key;

/// Floor bucket count whenever the control plane is allocated.
pub(crate) const MIN_BUCKETS: usize = 1024;

/// Load bounds in percent. The table grows when the occupied-bucket share
/// exceeds `MAX_LOAD_NUM` and a forced rebuild shrinks below `MIN_LOAD_NUM`.
const MAX_LOAD_NUM: usize = 80;
const MIN_LOAD_NUM: usize = 40;
const LOAD_DENOM: usize = 100;

/// Outcome of one probe walk.
pub(crate) enum ProbeHit {
    /// A matching key lives at `bucket`, dense entry `idx`.
    Found { bucket: usize, idx: usize },
    /// The first empty slot on the probe path.
    Empty { bucket: usize },
}

/// The shape-independent core of a table.
pub(crate) struct RawTable<St, S> {
    pub(crate) ctrl: Vec<u8>,
    pub(crate) redir: Vec<Redirect>,
    pub(crate) store: St,
    /// Total element count (equals the dense length for single shapes).
    pub(crate) len: usize,
    /// Rebuild counter; cursors snapshot it to detect stale bucket indices.
    pub(crate) stamp: u64,
    pub(crate) hasher: S,
}

impl<St: Store + Clone, S: Clone> Clone for RawTable<St, S> {
    fn clone(&self) -> Self {
        RawTable {
            ctrl: self.ctrl.clone(),
            redir: self.redir.clone(),
            store: self.store.clone(),
            len: self.len,
            stamp: self.stamp,
            hasher: self.hasher.clone(),
        }
    }
}

impl<St: Store, S> RawTable<St, S> {
    /// Probing consults the cached hash only when the equality predicate is
    /// likely to cost more than the compare. Keys no wider than the cached
    /// hash itself are compared directly.
    const CHECK_STORED_HASH: bool = size_of::<KeyOf<St>>() > size_of::<u64>();

    /// An empty table. Nothing is allocated until the first insertion.
    pub(crate) fn new(hasher: S) -> Self {
        RawTable {
            ctrl: Vec::new(),
            redir: Vec::new(),
            store: St::default(),
            len: 0,
            stamp: 0,
            hasher,
        }
    }

    /// A table with `buckets` control slots, clamped to the floor.
    pub(crate) fn with_buckets(buckets: usize, hasher: S) -> Self {
        let mut table = Self::new(hasher);
        table.allocate(buckets.max(MIN_BUCKETS));
        table
    }

    fn allocate(&mut self, buckets: usize) {
        self.ctrl = vec![0; buckets];
        self.redir = vec![Redirect::default(); buckets];
    }

    #[inline]
    pub(crate) fn is_allocated(&self) -> bool {
        !self.ctrl.is_empty()
    }

    /// Allocates the floor-sized planes on the way into a first insertion.
    pub(crate) fn ensure_allocated(&mut self) {
        if !self.is_allocated() {
            self.allocate(MIN_BUCKETS);
        }
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.ctrl.len()
    }

    /// Walks the probe chain of `hash`. `key_eq` judges the dense entry a
    /// candidate bucket redirects to; candidates have already passed the
    /// control tag and, for expensive keys, the cached hash.
    pub(crate) fn probe_from(&self, hash: u64, key_eq: impl Fn(usize) -> bool) -> ProbeHit {
        let stored = stored_hash(hash);
        let tag = partial_hash(hash);
        let mut probing = LinearProbing::compute(stored, self.ctrl.len());
        loop {
            let bucket = probing.next_probe();
            let byte = self.ctrl[bucket];
            if byte == 0 {
                return ProbeHit::Empty { bucket };
            }
            if byte != tag {
                continue;
            }
            let slot = self.redir[bucket];
            if Self::CHECK_STORED_HASH && slot.hash != stored {
                continue;
            }
            if key_eq(slot.idx as usize) {
                return ProbeHit::Found {
                    bucket,
                    idx: slot.idx as usize,
                };
            }
        }
    }

    /// Probe with a heterogeneous key probe.
    #[inline]
    pub(crate) fn probe_lookup<Q>(&self, hash: u64, probe: &Q) -> ProbeHit
    where
        Q: Equivalent<KeyOf<St>> + ?Sized,
    {
        self.probe_from(hash, |idx| probe.equivalent(self.store.key_at(idx)))
    }

    /// Lookup that tolerates an unallocated table.
    pub(crate) fn lookup<Q>(&self, hash: u64, probe: &Q) -> Option<(usize, usize)>
    where
        Q: Equivalent<KeyOf<St>> + ?Sized,
    {
        if !self.is_allocated() {
            return None;
        }
        match self.probe_lookup(hash, probe) {
            ProbeHit::Found { bucket, idx } => Some((bucket, idx)),
            ProbeHit::Empty { .. } => None,
        }
    }

    /// Binds `bucket` to dense entry `idx` in both planes.
    #[inline]
    pub(crate) fn attach(&mut self, bucket: usize, hash: u64, idx: usize) {
        self.ctrl[bucket] = partial_hash(hash);
        self.redir[bucket] = Redirect {
            hash: stored_hash(hash),
            idx: idx as RawIdx,
        };
    }

    /// Doubles the control plane once the dense array exceeds the load
    /// bound. Returns whether a rebuild happened.
    pub(crate) fn grow_if_needed(&mut self) -> bool {
        if self.store.data_len() * LOAD_DENOM > self.ctrl.len() * MAX_LOAD_NUM {
            self.rebuild(self.ctrl.len() * 2);
            true
        } else {
            false
        }
    }

    /// Rebuilds the control and redirection planes at `buckets` slots,
    /// re-probing every occupied bucket from its cached hash. Hashes are
    /// never recomputed and the payload arrays are untouched, so dense
    /// indices stay valid across a rebuild.
    fn rebuild(&mut self, buckets: usize) {
        let buckets = buckets.max(MIN_BUCKETS);
        let mut ctrl = vec![0u8; buckets];
        let mut redir = vec![Redirect::default(); buckets];
        for b in 0..self.ctrl.len() {
            if self.ctrl[b] == 0 {
                continue;
            }
            let slot = self.redir[b];
            let mut probing = LinearProbing::compute(slot.hash, buckets);
            loop {
                let nb = probing.next_probe();
                if ctrl[nb] == 0 {
                    ctrl[nb] = self.ctrl[b];
                    redir[nb] = slot;
                    break;
                }
            }
        }
        self.ctrl = ctrl;
        self.redir = redir;
        self.stamp += 1;
    }

    /// Forced rebuild. Shrinks to half the buckets below 40 % load, doubles
    /// at or above 80 %, otherwise rebuilds in place; always clamped to the
    /// floor. A no-op on an empty table.
    pub(crate) fn force_rehash(&mut self) {
        if !self.is_allocated() || self.store.data_len() == 0 {
            return;
        }
        let buckets = self.ctrl.len();
        let occupied = self.store.data_len();
        let target = if occupied * LOAD_DENOM < buckets * MIN_LOAD_NUM {
            buckets / 2
        } else if occupied * LOAD_DENOM >= buckets * MAX_LOAD_NUM {
            buckets * 2
        } else {
            buckets
        };
        self.rebuild(target);
    }

    /// Grows the planes so `additional` more entries fit under the load
    /// bound without a rebuild.
    pub(crate) fn reserve(&mut self, additional: usize) {
        let needed = (self.store.data_len() + additional) * LOAD_DENOM / MAX_LOAD_NUM + 1;
        if !self.is_allocated() {
            self.allocate(needed.max(MIN_BUCKETS));
        } else if needed > self.ctrl.len() {
            self.rebuild(needed);
        }
    }

    /// Empties the table and releases every allocation. The next insertion
    /// starts over at the floor size.
    pub(crate) fn clear(&mut self) {
        if self.is_allocated() {
            self.stamp += 1;
        }
        self.ctrl = Vec::new();
        self.redir = Vec::new();
        self.store.deallocate();
        self.len = 0;
    }

    /// Empties the table in O(buckets), keeping all capacity.
    pub(crate) fn fast_clear(&mut self) {
        if !self.is_allocated() {
            return;
        }
        self.ctrl.fill(0);
        self.redir.fill(Redirect::default());
        self.store.clear_retaining();
        self.len = 0;
        self.stamp += 1;
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.store.shrink_to_fit();
    }

    /// A cursor stamped with the current rebuild counter.
    #[inline]
    pub(crate) fn cursor(&self, idx: usize, bucket: usize, node: RawIdx) -> Cursor {
        Cursor {
            value_idx: idx as RawIdx,
            bucket,
            node,
            stamp: self.stamp,
        }
    }

    /// Repairs the probe chain after `vacated` lost its entry: every
    /// displaced successor moves one slot toward its home position until an
    /// empty slot or an entry already at home ends the chain.
    fn backward_shift(&mut self, vacated: usize) {
        let buckets = self.ctrl.len();
        let mut hole = vacated;
        let mut cur = (vacated + 1) % buckets;
        while self.ctrl[cur] != 0 {
            let slot = self.redir[cur];
            if crate::probe::displacement(cur, slot.hash, buckets) == 0 {
                break;
            }
            self.ctrl[hole] = self.ctrl[cur];
            self.redir[hole] = slot;
            hole = cur;
            cur = (cur + 1) % buckets;
        }
        self.ctrl[hole] = 0;
    }
}

impl<St: Store, S: BuildHasher> RawTable<St, S> {
    #[inline]
    pub(crate) fn hash_of<Q: Hash + ?Sized>(&self, probe: &Q) -> u64 {
        self.hasher.hash_one(probe)
    }

    /// Bucket currently referencing dense entry `idx`, found by probing
    /// from the entry's own hash. Returns `None` only if the entry is
    /// absent, which callers rule out.
    fn bucket_of_entry(&self, hash: u64, idx: usize) -> Option<usize> {
        match self.probe_from(hash, |i| i == idx) {
            ProbeHit::Found { bucket, .. } => Some(bucket),
            ProbeHit::Empty { .. } => None,
        }
    }

    /// Removes the whole bucket at `bucket`: clears its control slot,
    /// swap-and-pops the dense entry, patches the single redirection entry
    /// of the element that moved in from the back, and repairs the probe
    /// chain. Returns the removal payload and the element count removed.
    pub(crate) fn detach(&mut self, bucket: usize) -> (St::Removed, usize)
    where
        KeyOf<St>: Hash,
    {
        let idx = self.redir[bucket].idx as usize;
        let last = self.store.data_len() - 1;

        // The patch target is resolved in pre-swap indices. When the erased
        // entry is itself the last one the swap is a no-op and nothing
        // needs patching.
        let moved_bucket = if idx != last {
            let hash = self.hasher.hash_one(self.store.key_at(last));
            self.bucket_of_entry(hash, last)
        } else {
            None
        };

        self.ctrl[bucket] = 0;
        let (removed, count) = self.store.swap_remove(idx);
        if let Some(moved) = moved_bucket {
            self.redir[moved].idx = idx as RawIdx;
        }
        self.backward_shift(bucket);
        self.len -= count;
        (removed, count)
    }

    /// Resolves a cursor to its bucket. A fresh cursor answers from its
    /// cached position; a stale or sentinel one pays one lookup, probing by
    /// the dense index of the entry it addresses.
    pub(crate) fn bucket_for(&self, cur: Cursor) -> Option<usize>
    where
        KeyOf<St>: Hash,
    {
        let idx = cur.value_idx as usize;
        if idx >= self.store.data_len() || !self.is_allocated() {
            return None;
        }
        if cur.stamp == self.stamp
            && cur.bucket != NO_BUCKET
            && cur.bucket < self.ctrl.len()
            && self.ctrl[cur.bucket] != 0
            && self.redir[cur.bucket].idx as usize == idx
        {
            return Some(cur.bucket);
        }
        let hash = self.hasher.hash_one(self.store.key_at(idx));
        self.bucket_of_entry(hash, idx)
    }

    /// Asserts every structural invariant; test support.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self)
    where
        KeyOf<St>: Hash,
    {
        use crate::probe::displacement;

        let buckets = self.ctrl.len();
        assert_eq!(self.redir.len(), buckets);
        if buckets == 0 {
            assert_eq!(self.store.data_len(), 0);
            assert_eq!(self.len, 0);
            return;
        }
        let mut seen = vec![false; self.store.data_len()];
        let mut occupied = 0;
        for b in 0..buckets {
            let byte = self.ctrl[b];
            if byte == 0 {
                continue;
            }
            assert_ne!(byte & 0x80, 0, "control byte without occupancy bit");
            occupied += 1;
            let slot = self.redir[b];
            let idx = slot.idx as usize;
            assert!(idx < self.store.data_len(), "redirect out of range");
            assert!(!seen[idx], "two buckets share a value index");
            seen[idx] = true;

            let hash = self.hasher.hash_one(self.store.key_at(idx));
            assert_eq!(slot.hash, stored_hash(hash), "stale stored hash");
            assert_eq!(byte, partial_hash(hash), "stale control tag");

            // No gap between the home slot and the bucket.
            for back in 1..=displacement(b, slot.hash, buckets) {
                let on_path = (b + buckets - back) % buckets;
                assert_ne!(self.ctrl[on_path], 0, "gap inside a probe chain");
            }
        }
        assert_eq!(occupied, self.store.data_len(), "dense array drifted");
        assert_eq!(self.len, self.store.total_elements(), "element count drifted");
    }
}
