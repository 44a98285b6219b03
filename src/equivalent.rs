//! Heterogeneous key equivalence.

use std::borrow::Borrow;

/// Key equivalence for lookups whose probe type differs from the stored key.
///
/// A probe type `Q` may stand in for stored keys `K` once it declares,
/// through this trait, that its equality agrees with the stored key's. The
/// `Hash` bound at every lookup site covers the other half of the contract:
/// an equivalent probe must hash like the key it matches.
///
/// The blanket implementation routes through [`Borrow`], which already
/// promises consistent `Eq` and `Hash`, so `&str` probes a `String`-keyed
/// table out of the box.
pub trait Equivalent<K: ?Sized> {
    /// Does `self` compare equal to `key`?
    fn equivalent(&self, key: &K) -> bool;
}

impl<Q, K> Equivalent<K> for Q
where
    Q: Eq + ?Sized,
    K: Borrow<Q>,
{
    #[inline]
    fn equivalent(&self, key: &K) -> bool {
        self == key.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::Equivalent;

    #[test]
    fn str_probes_string_keys() {
        let key = String::from("alpha");
        assert!("alpha".equivalent(&key));
        assert!(!"beta".equivalent(&key));
    }
}
