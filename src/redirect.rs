//! Element types of the control and redirection planes.

#[cfg(not(feature = "big"))]
pub(crate) type StoredHash = u32;
#[cfg(feature = "big")]
pub(crate) type StoredHash = u64;

#[cfg(not(feature = "big"))]
pub(crate) type RawIdx = u32;
#[cfg(feature = "big")]
pub(crate) type RawIdx = u64;

/// Reserved index meaning "no slot" or "no node".
pub(crate) const NIL: RawIdx = RawIdx::MAX;

/// One redirection-plane slot.
///
/// `hash` caches the truncated hash of the bucket's key so probing can
/// reject mismatches without touching the payload and a rebuild never has
/// to recompute hashes. `idx` points into the dense value array.
#[derive(Copy, Clone, Default, Debug)]
pub(crate) struct Redirect {
    pub hash: StoredHash,
    pub idx: RawIdx,
}
