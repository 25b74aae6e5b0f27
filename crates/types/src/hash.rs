//! Keccak-256 helpers shared by name digests, addresses and signature messages.

use sha3::{Digest, Keccak256};

/// Size in bytes of every digest produced by this module.
pub const DIGEST_BYTES: usize = 32;

/// Hash arbitrary bytes with Keccak-256.
pub fn keccak256(data: &[u8]) -> [u8; DIGEST_BYTES] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}
