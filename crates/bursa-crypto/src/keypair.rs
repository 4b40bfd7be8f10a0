//! Cryptographic key pairs.
//!
//! The [`KeyPair`] trait abstracts over the signature schemes the wallet
//! supports so the signer can pick one per chain family at runtime:
//!
//! - [`Secp256k1KeyPair`] - ECDSA/secp256k1 for account-model EVM chains
//! - [`Ed25519KeyPair`] - Ed25519 for Solana-family chains
//!
//! These are real, audited primitives (`k256`, `ed25519-dalek`); the wallet
//! carries no placeholder cryptography.
//!
//! # Example
//!
//! ```rust
//! use bursa_crypto::keys::SecretKey;
//! use bursa_crypto::keypair::{KeyPair, Secp256k1KeyPair};
//!
//! let secret = SecretKey::generate();
//! let keypair = Secp256k1KeyPair::from_secret(&secret).expect("valid scalar");
//!
//! let hash = [0x11u8; 32];
//! let signature = keypair.sign(&hash).expect("signing succeeded");
//! assert_eq!(signature.len(), 65); // r || s || v
//! assert!(keypair.verify(&hash, &signature));
//! ```

use k256::ecdsa::{Signature as K256Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

use bursa_core::SignError;

use crate::keys::SecretKey;

// ============================================================================
// KeyPair Trait
// ============================================================================

/// A signing key pair for one signature scheme.
///
/// All implementations are `Send + Sync` and keep their secret scalar
/// zeroized on drop. The `hash` argument to [`KeyPair::sign`] is always a
/// pre-computed 32-byte content hash, never a raw message.
pub trait KeyPair: Send + Sync {
    /// Build a key pair from custody-held key material.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::InvalidKey`] when the bytes are not a valid
    /// secret for this scheme (e.g., zero or above the curve order for
    /// secp256k1).
    fn from_secret(secret: &SecretKey) -> Result<Self, SignError>
    where
        Self: Sized;

    /// Sign a 32-byte content hash.
    ///
    /// Returns scheme-native signature bytes: 65 (`r || s || v`) for
    /// secp256k1, 64 for Ed25519.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::SignatureFailed`] when the primitive fails.
    fn sign(&self, hash: &[u8; 32]) -> Result<Vec<u8>, SignError>;

    /// Verify a signature produced by [`KeyPair::sign`] against `hash`.
    fn verify(&self, hash: &[u8; 32], signature: &[u8]) -> bool;

    /// Public key bytes: compressed SEC1 (33) for secp256k1, raw 32 for
    /// Ed25519.
    fn public_key_bytes(&self) -> Vec<u8>;
}

// ============================================================================
// Secp256k1KeyPair
// ============================================================================

/// ECDSA/secp256k1 key pair for account-model chains.
///
/// Signatures are low-S normalized to rule out malleability, and the
/// recovery id is appended so consumers can run `ecrecover`-style
/// verification.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Secp256k1KeyPair {
    /// Derive the account address: last 20 bytes of the Keccak-256 hash of
    /// the uncompressed public key without its `0x04` prefix.
    #[must_use]
    pub fn address(&self) -> String {
        let point = self.verifying_key.to_encoded_point(false);
        let digest = Keccak256::digest(&point.as_bytes()[1..]);
        format!("0x{}", hex::encode(&digest[12..]))
    }
}

impl KeyPair for Secp256k1KeyPair {
    fn from_secret(secret: &SecretKey) -> Result<Self, SignError> {
        let signing_key =
            SigningKey::from_bytes(secret.as_bytes().into()).map_err(|_| SignError::InvalidKey)?;
        let verifying_key = *signing_key.verifying_key();
        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    fn sign(&self, hash: &[u8; 32]) -> Result<Vec<u8>, SignError> {
        let (signature, recovery_id): (K256Signature, _) = self
            .signing_key
            .sign_prehash_recoverable(hash)
            .map_err(|_| SignError::signature_failed("secp256k1 signing failed"))?;

        // Low-S normalization; flip the recovery id when S was folded.
        let normalized = signature.normalize_s();
        let v = if normalized.is_some() {
            recovery_id.to_byte() ^ 1
        } else {
            recovery_id.to_byte()
        };
        let signature = normalized.unwrap_or(signature);

        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(&signature.to_bytes());
        out.push(v);
        Ok(out)
    }

    fn verify(&self, hash: &[u8; 32], signature: &[u8]) -> bool {
        use k256::ecdsa::signature::hazmat::PrehashVerifier;

        // Accept both 64-byte (r || s) and 65-byte (r || s || v) forms.
        let rs = match signature.len() {
            64 => signature,
            65 => &signature[..64],
            _ => return false,
        };
        let Ok(sig) = K256Signature::from_slice(rs) else {
            return false;
        };
        self.verifying_key.verify_prehash(hash, &sig).is_ok()
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.verifying_key.to_encoded_point(true).as_bytes().to_vec()
    }
}

impl std::fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Ed25519KeyPair
// ============================================================================

/// Ed25519 key pair for Solana-family chains.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Ed25519KeyPair {
    /// Derive the account address: base58 of the 32-byte public key.
    #[must_use]
    pub fn address(&self) -> String {
        bs58::encode(self.signing_key.verifying_key().as_bytes()).into_string()
    }
}

impl KeyPair for Ed25519KeyPair {
    fn from_secret(secret: &SecretKey) -> Result<Self, SignError> {
        // Every 32-byte string is a valid Ed25519 seed.
        Ok(Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(secret.as_bytes()),
        })
    }

    fn sign(&self, hash: &[u8; 32]) -> Result<Vec<u8>, SignError> {
        use ed25519_dalek::Signer;
        Ok(self.signing_key.sign(hash).to_bytes().to_vec())
    }

    fn verify(&self, hash: &[u8; 32], signature: &[u8]) -> bool {
        use ed25519_dalek::Verifier;

        let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
            return false;
        };
        self.signing_key
            .verifying_key()
            .verify(hash, &sig)
            .is_ok()
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_secp256k1_sign_verify_round_trip() {
        let keypair = Secp256k1KeyPair::from_secret(&SecretKey::generate()).unwrap();
        let hash = [0x5au8; 32];

        let sig = keypair.sign(&hash).unwrap();
        assert_eq!(sig.len(), 65);
        assert!(sig[64] == 0 || sig[64] == 1);
        assert!(keypair.verify(&hash, &sig));
        assert!(!keypair.verify(&[0u8; 32], &sig));
    }

    #[test]
    fn test_secp256k1_rejects_zero_scalar() {
        let result = Secp256k1KeyPair::from_secret(&SecretKey::new([0u8; 32]));
        assert!(matches!(result, Err(SignError::InvalidKey)));
    }

    #[test]
    fn test_secp256k1_address_shape() {
        let keypair = Secp256k1KeyPair::from_secret(&SecretKey::generate()).unwrap();
        let address = keypair.address();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);
    }

    #[test]
    fn test_secp256k1_public_key_is_compressed() {
        let keypair = Secp256k1KeyPair::from_secret(&SecretKey::generate()).unwrap();
        let pubkey = keypair.public_key_bytes();
        assert_eq!(pubkey.len(), 33);
        assert!(pubkey[0] == 0x02 || pubkey[0] == 0x03);
    }

    #[test]
    fn test_secp256k1_same_secret_same_signature() {
        // ECDSA with RFC 6979 deterministic nonces: identical inputs yield
        // identical signatures.
        let secret_bytes = [0x42u8; 32];
        let a = Secp256k1KeyPair::from_secret(&SecretKey::new(secret_bytes)).unwrap();
        let b = Secp256k1KeyPair::from_secret(&SecretKey::new(secret_bytes)).unwrap();
        let hash = [0x01u8; 32];
        assert_eq!(a.sign(&hash).unwrap(), b.sign(&hash).unwrap());
    }

    #[test]
    fn test_ed25519_sign_verify_round_trip() {
        let keypair = Ed25519KeyPair::from_secret(&SecretKey::generate()).unwrap();
        let hash = [0x33u8; 32];

        let sig = keypair.sign(&hash).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(keypair.verify(&hash, &sig));
        assert!(!keypair.verify(&[0u8; 32], &sig));
    }

    #[test]
    fn test_ed25519_address_is_base58() {
        let keypair = Ed25519KeyPair::from_secret(&SecretKey::generate()).unwrap();
        let address = keypair.address();
        assert!((32..=44).contains(&address.len()));
        assert!(bs58::decode(&address).into_vec().is_ok());
    }

    #[test]
    fn test_cross_scheme_signatures_do_not_verify() {
        let secret = [0x42u8; 32];
        let secp = Secp256k1KeyPair::from_secret(&SecretKey::new(secret)).unwrap();
        let ed = Ed25519KeyPair::from_secret(&SecretKey::new(secret)).unwrap();
        let hash = [0x07u8; 32];

        let secp_sig = secp.sign(&hash).unwrap();
        assert!(!ed.verify(&hash, &secp_sig));
    }

    #[test]
    fn test_debug_never_prints_secret_material() {
        let secret = [0x99u8; 32];
        let keypair = Secp256k1KeyPair::from_secret(&SecretKey::new(secret)).unwrap();
        let rendered = format!("{keypair:?}");
        assert!(!rendered.contains("99999999"));
    }
}
