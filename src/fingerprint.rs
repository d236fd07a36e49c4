//! Content fingerprinting with BLAKE3.
//!
//! A [`Fingerprint`] is a fixed-width digest of a document's raw bytes, used
//! as the change-detection key in the persistent cache and as the memoization
//! key for parsed documents. The hash is cryptographic purely for collision
//! resistance; identical bytes always produce the identical digest, and the
//! digest width is stable across runs.

use std::fmt;

/// Width of a fingerprint in bytes (BLAKE3 default output).
pub const FINGERPRINT_LEN: usize = 32;

/// Fixed-width content digest with value semantics.
///
/// Equality and hashing are by digest contents, so a `Fingerprint` can be
/// used directly as a map key: identical content always maps to the same
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Compute the fingerprint of a byte slice.
    ///
    /// Pure and deterministic: the same bytes always yield the same digest.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// View the digest as raw bytes, e.g. for storing as a BLOB.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Reconstruct a fingerprint from stored bytes.
    ///
    /// Returns `None` if the slice is not exactly [`FINGERPRINT_LEN`] bytes,
    /// which indicates a cache entry written by an incompatible version.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; FINGERPRINT_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Hex representation, mainly for log output.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(FINGERPRINT_LEN * 2);
        for b in self.0 {
            s.push_str(&format!("{:02x}", b));
        }
        s
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
