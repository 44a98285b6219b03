//! Lightweight element handles.

use crate::redirect::RawIdx;

/// Bucket position of a cursor whose control-plane slot is unknown.
pub(crate) const NO_BUCKET: usize = usize::MAX;

/// A handle to one element of a table.
///
/// Cursors are plain indices. They borrow nothing and stay `Copy`; every
/// access resolves them against the owning table, which bounds-checks the
/// stored indices. A cursor keeps addressing the same element as long as
/// the table honors its invalidation contract: control-plane rebuilds
/// preserve the dense index, and erasures touch at most the erased element
/// and the entry that was swapped in from the back of the dense array.
///
/// The recorded bucket position goes stale on a rebuild. Operations that
/// need it (erasure through a cursor) compare the recorded rebuild stamp
/// against the table's and recover the bucket with a fresh lookup when they
/// disagree, so a stale cursor degrades to one extra probe, never to a
/// corrupted table.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    /// Index into the dense value array.
    pub(crate) value_idx: RawIdx,
    /// Bucket this element was found or inserted at, or [`NO_BUCKET`].
    pub(crate) bucket: usize,
    /// Node within the bucket's element list. `NIL` for single shapes.
    pub(crate) node: RawIdx,
    /// The owning table's rebuild counter at creation time.
    pub(crate) stamp: u64,
}

impl Cursor {
    /// Index of the element's bucket entry in the dense value array.
    ///
    /// For multi shapes every element of one bucket shares this index.
    #[inline]
    pub fn value_index(&self) -> usize {
        self.value_idx as usize
    }
}

impl PartialEq for Cursor {
    /// Cursors compare by position: dense index plus list node. The cached
    /// bucket and stamp are bookkeeping, not identity.
    #[inline]
    fn eq(&self, other: &Cursor) -> bool {
        self.value_idx == other.value_idx && self.node == other.node
    }
}

impl Eq for Cursor {}
