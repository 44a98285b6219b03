//! Linear probing over the control plane and partial-hash derivation.

use crate::redirect::StoredHash;

/// Multiplicative mixing constant for the control tag (64-bit golden ratio).
const MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Derives the one-byte control tag for a hash: the top seven bits of the
/// mixed hash with the occupancy bit forced, so `0` never collides with a
/// stored tag and uniquely marks an empty slot.
#[inline]
pub(crate) fn partial_hash(hash: u64) -> u8 {
    ((hash.wrapping_mul(MIX) >> 57) as u8) | 0x80
}

/// Truncates a 64-bit hash to the width cached in the redirection plane.
#[inline]
pub(crate) fn stored_hash(hash: u64) -> StoredHash {
    hash as StoredHash
}

/// How far bucket `bucket` sits from its home slot, walking forward with
/// wrap-around. An entry with displacement `0` is at its home slot.
#[inline]
pub(crate) fn displacement(bucket: usize, stored: StoredHash, buckets: usize) -> usize {
    let home = stored as usize % buckets;
    (bucket + buckets - home) % buckets
}

/// A linear-probing cursor over bucket positions.
///
/// Bucket counts are not required to be powers of two, so positions reduce
/// modulo the bucket count instead of masking.
pub(crate) struct LinearProbing {
    pos: usize,
    buckets: usize,
}

impl LinearProbing {
    /// Starts a probe sequence at the home slot of `stored`.
    ///
    /// Probing is driven by the truncated hash, never the full 64-bit one,
    /// so that lookups, displacement accounting and control-plane rebuilds
    /// agree on every entry's home slot for any bucket count.
    #[inline]
    pub(crate) fn compute(stored: StoredHash, buckets: usize) -> LinearProbing {
        LinearProbing {
            pos: stored as usize % buckets,
            buckets,
        }
    }

    /// Returns the current bucket and steps the cursor one slot forward.
    #[inline]
    pub(crate) fn next_probe(&mut self) -> usize {
        let cur = self.pos;
        self.pos += 1;
        if self.pos == self.buckets {
            self.pos = 0;
        }
        cur
    }
}

#[cfg(test)]
mod tests {
    use super::{LinearProbing, displacement, partial_hash};

    #[test]
    fn control_tag_is_never_empty() {
        for hash in [0u64, 1, 0x80, u64::MAX, 0xDEAD_BEEF_CAFE_F00D] {
            let tag = partial_hash(hash);
            assert_ne!(tag, 0);
            assert_ne!(tag & 0x80, 0);
        }
    }

    #[test]
    fn probing_starts_at_home_and_wraps() {
        let mut probe = LinearProbing::compute(7, 8);
        assert_eq!(probe.next_probe(), 7);
        assert_eq!(probe.next_probe(), 0);
        assert_eq!(probe.next_probe(), 1);
    }

    #[test]
    fn displacement_wraps_around() {
        assert_eq!(displacement(7, 7, 8), 0);
        assert_eq!(displacement(1, 7, 8), 2);
        assert_eq!(displacement(7, 3, 8), 4);
    }
}
