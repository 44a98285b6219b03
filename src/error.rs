//! The one fallible surface of the crate.

use thiserror::Error;

/// The dense value-index space is exhausted.
///
/// Without the `big` feature value indices are 32 bits wide, capping a
/// table at `u32::MAX - 1` dense entries. The check runs before any
/// mutation, so a failed insertion leaves the table untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("dense table capacity exhausted: the value index space is full")]
pub struct CapacityError;
