//! Encryption at rest for key material.
//!
//! Key custody never writes plaintext to disk. A [`SecretKey`] is sealed
//! with ChaCha20-Poly1305 under a key derived from the custody unlock
//! secret via Argon2id, producing a versioned, self-describing container:
//!
//! ```text
//! version (1) || salt (16) || nonce (12) || ciphertext+tag (48)  = 77 bytes
//! ```
//!
//! Fresh random salt and nonce are drawn from the OS RNG for every seal, so
//! sealing the same key twice never produces the same bytes and nonces are
//! never reused. Derived encryption keys are zeroized immediately after use.
//!
//! # Example
//!
//! ```rust
//! use bursa_crypto::keys::SecretKey;
//! use bursa_crypto::encryption::{seal, open, SealedSecret};
//!
//! let key = SecretKey::generate();
//! let sealed = seal(&key, "unlock-secret").expect("seal");
//!
//! let container = sealed.to_bytes();
//! let sealed = SealedSecret::from_bytes(&container).expect("well-formed");
//! let opened = open(&sealed, "unlock-secret").expect("open");
//! assert_eq!(key, opened);
//! ```

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use zeroize::Zeroize;

use bursa_core::CustodyError;

use crate::keys::{SecretKey, SECRET_KEY_LEN};

/// Current container format version.
pub const CONTAINER_VERSION: u8 = 1;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Poly1305 tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Total serialized container length.
pub const CONTAINER_LEN: usize = 1 + SALT_LEN + NONCE_LEN + SECRET_KEY_LEN + TAG_LEN;

// Argon2id parameters (OWASP-recommended).
const ARGON2_MEMORY_KIB: u32 = 65536; // 64 MiB
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

/// A sealed secret-key container ready for storage.
#[derive(Debug, Clone)]
pub struct SealedSecret {
    version: u8,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl SealedSecret {
    /// Serialize to the on-disk container format.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CONTAINER_LEN);
        out.push(self.version);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse a container from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError::Backend`] when the length or version is
    /// wrong. Length is checked before any field is touched, so a truncated
    /// file can never panic here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CustodyError> {
        if bytes.len() != CONTAINER_LEN {
            return Err(CustodyError::backend(format!(
                "sealed container must be {CONTAINER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let version = bytes[0];
        if version != CONTAINER_VERSION {
            return Err(CustodyError::backend(format!(
                "unknown sealed container version {version}"
            )));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[1..1 + SALT_LEN]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[1 + SALT_LEN..1 + SALT_LEN + NONCE_LEN]);

        Ok(Self {
            version,
            salt,
            nonce,
            ciphertext: bytes[1 + SALT_LEN + NONCE_LEN..].to_vec(),
        })
    }
}

/// Derive a 32-byte encryption key from the unlock secret with Argon2id.
fn derive_key(unlock: &str, salt: &[u8; SALT_LEN]) -> Result<[u8; 32], CustodyError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| CustodyError::backend(format!("argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(unlock.as_bytes(), salt, &mut output)
        .map_err(|e| CustodyError::backend(format!("argon2 derivation: {e}")))?;
    Ok(output)
}

/// Seal a secret key under the unlock secret.
///
/// # Errors
///
/// Returns [`CustodyError::Backend`] when key derivation or encryption
/// fails.
pub fn seal(key: &SecretKey, unlock: &str) -> Result<SealedSecret, CustodyError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let mut encryption_key = derive_key(unlock, &salt)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&encryption_key)
        .map_err(|_| CustodyError::backend("cipher init failed"))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), key.as_bytes().as_ref())
        .map_err(|_| CustodyError::backend("encryption failed"))?;
    encryption_key.zeroize();

    Ok(SealedSecret {
        version: CONTAINER_VERSION,
        salt,
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Open a sealed container with the unlock secret.
///
/// # Errors
///
/// - [`CustodyError::Backend`] for a malformed container
/// - [`CustodyError::AuthorizationFailed`] when the unlock secret is wrong
///   or the ciphertext was tampered with (Poly1305 keeps the two
///   indistinguishable on purpose)
pub fn open(sealed: &SealedSecret, unlock: &str) -> Result<SecretKey, CustodyError> {
    if sealed.version != CONTAINER_VERSION {
        return Err(CustodyError::backend("unknown sealed container version"));
    }
    if sealed.ciphertext.len() != SECRET_KEY_LEN + TAG_LEN {
        return Err(CustodyError::backend("sealed container truncated"));
    }

    let mut encryption_key = derive_key(unlock, &sealed.salt)?;
    let cipher = ChaCha20Poly1305::new_from_slice(&encryption_key)
        .map_err(|_| CustodyError::backend("cipher init failed"))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_ref())
        .map_err(|_| CustodyError::authorization_failed("unlock secret rejected"));
    encryption_key.zeroize();
    let mut plaintext = plaintext?;

    let key = SecretKey::from_slice(&plaintext);
    plaintext.zeroize();
    key
}

// ============================================================================
// Tests
// ============================================================================
