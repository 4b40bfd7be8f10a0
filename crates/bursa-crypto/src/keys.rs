//! Secret key material with secure memory handling.
//!
//! A [`SecretKey`] is zeroized on drop, never appears in debug output, and
//! compares in constant time. The type deliberately does not implement
//! `Clone`: key material is moved, not copied, so it exists in exactly one
//! place at a time.

use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use bursa_core::CustodyError;

/// Length of a secret key in bytes.
pub const SECRET_KEY_LEN: usize = 32;

/// A 32-byte secret key.
///
/// This is the only shape key material takes inside the wallet core: custody
/// hands it out, the signer consumes it, and it is never logged, serialized
/// to disk in plaintext, or transmitted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; SECRET_KEY_LEN],
}

impl SecretKey {
    /// Wrap raw key bytes.
    ///
    /// The caller should zeroize its copy of `bytes` after this call.
    #[must_use]
    pub const fn new(bytes: [u8; SECRET_KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh random key from the operating system's secure RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Build a key from a byte slice, e.g. a reconstructed recovery secret.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError::Backend`] when the slice is not exactly
    /// 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CustodyError> {
        let bytes: [u8; SECRET_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CustodyError::backend("secret key must be 32 bytes"))?;
        Ok(Self { bytes })
    }

    /// Expose the raw bytes for an immediate cryptographic operation.
    ///
    /// The returned reference must not be stored or copied beyond that
    /// operation.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SECRET_KEY_LEN] {
        &self.bytes
    }
}

// Key material must never appear in logs or panics.
impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

// Constant-time comparison to avoid timing side channels.
impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for SecretKey {}

impl From<[u8; SECRET_KEY_LEN]> for SecretKey {
    fn from(bytes: [u8; SECRET_KEY_LEN]) -> Self {
        Self::new(bytes)
    }
}
