//! Content fingerprints via BLAKE3.

/// Compute the BLAKE3 fingerprint of file content as lowercase hex.
#[inline]
pub fn fingerprint(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}
