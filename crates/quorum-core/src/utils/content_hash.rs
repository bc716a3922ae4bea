//! Vote keys for canonicalized node responses.

use ahash::AHasher;
use std::hash::Hasher;

/// General-purpose, non-cryptographic hash of a canonical body.
///
/// Uses fixed-key ahash, so equal inputs hash equally across calls and threads.
#[must_use]
pub fn content_hash(data: &[u8]) -> u64 {
    let mut hasher = AHasher::default();
    hasher.write(data);
    hasher.finish()
}

/// Order-insensitive key: the byte sum multiplied by the length.
///
/// Two bodies holding the same elements in a different order get the same
/// key. Different contents can collide (e.g. two bytes shifted by +1/-1), which
/// is accepted for result sets that nodes return in arbitrary order.
#[must_use]
pub fn unordered_content_key(data: &[u8]) -> u64 {
    let sum = data.iter().fold(0u64, |acc, &b| acc.wrapping_add(u64::from(b)));
    sum.wrapping_mul(data.len() as u64)
}
