use sha2::{Digest, Sha256};
use talus_identifiers::Buf32;

/// Direct untagged hash.
pub fn raw(buf: &[u8]) -> Buf32 {
    Buf32::from(<[u8; 32]>::from(Sha256::digest(buf)))
}

/// Computes a SHA-256 hash over a sequence of byte slices.
///
/// Updates the hasher incrementally for each slice, avoiding the need to
/// concatenate inputs into a single buffer.
pub fn sha256_iter<'a>(bufs: impl IntoIterator<Item = &'a [u8]>) -> Buf32 {
    let mut hasher = Sha256::new();
    for buf in bufs {
        hasher.update(buf);
    }
    Buf32::from(<[u8; 32]>::from(hasher.finalize()))
}

/// Double SHA-256 (`sha256d`).
///
/// This is the commitment primitive for state-delta digests: the delta's
/// canonical byte stream is hashed, and the hash is hashed again.
pub fn sha256d(buf: &[u8]) -> Buf32 {
    let mut hasher = Sha256::new();
    hasher.update(buf);
    let result = hasher.finalize_reset();
    hasher.update(result);
    let arr: [u8; 32] = hasher.finalize().into();
    Buf32::from(arr)
}
