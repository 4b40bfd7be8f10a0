//! Transaction and message signing.
//!
//! The [`TransactionSigner`] turns a [`Transaction`] into [`SignedData`]:
//! canonical bytes, a Keccak-256 content hash, and a signature from the
//! chain family's scheme. Key material is obtained exclusively through
//! [`KeyCustody`] and lives only for the duration of a single signing call;
//! the signer never caches raw key bytes.
//!
//! # Canonical serialization
//!
//! Signing requires that two logically identical transactions produce
//! byte-identical payloads, so hashing is stable and tests are
//! reproducible. The encoding is a versioned, fixed-order, length-prefixed
//! concatenation:
//!
//! ```text
//! version (1 byte)
//! || field(chain) || field(from) || field(to)
//! || field(value as 32-byte big-endian U256)
//! || field(payload)
//! || field(nonce: 8-byte BE) || field(gas_limit: 8-byte BE)
//! || field(max_fee_per_gas: 16-byte BE)
//! || field(max_priority_fee_per_gas: 16-byte BE)
//!
//! where field(x) = u32 BE length of x || bytes of x
//! ```
//!
//! The value string is normalized through [`U256`] before encoding, so
//! `"0x100"` and `"256"` serialize identically.
//!
//! [`U256`]: bursa_core::U256

use std::sync::Arc;

use sha3::{Digest, Keccak256};
use tracing::debug;

use bursa_chain::{ChainRegistry, CurveFamily};
use bursa_core::{parse_amount, SignError, SignedData, Transaction};

use crate::custody::KeyCustody;
use crate::keypair::{Ed25519KeyPair, KeyPair, Secp256k1KeyPair};

/// Canonical encoding format version.
pub const ENCODING_VERSION: u8 = 1;

/// Domain prefix for free-text message signing.
///
/// Prefixing keeps message signatures disjoint from transaction signatures:
/// no message can hash to the same bytes as a canonical transaction.
pub const MESSAGE_PREFIX: &str = "\x19Bursa Signed Message:\n";

/// Signs transactions and messages with custody-held keys.
pub struct TransactionSigner<K> {
    custody: Arc<K>,
    registry: ChainRegistry,
}

impl<K> std::fmt::Debug for TransactionSigner<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSigner")
            .field("custody", &"<KeyCustody>")
            .field("registry", &self.registry)
            .finish()
    }
}

impl<K> TransactionSigner<K> {
    /// Create a signer over the given custody and registry.
    #[must_use]
    pub const fn new(custody: Arc<K>, registry: ChainRegistry) -> Self {
        Self { custody, registry }
    }

    /// Produce the canonical byte encoding of a transaction.
    ///
    /// Deterministic: identical field values always yield identical bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SignError::Serialization`] when the value string does not
    /// parse as a non-negative integer.
    pub fn canonical_bytes(tx: &Transaction) -> Result<Vec<u8>, SignError> {
        let value = parse_amount(&tx.value)
            .map_err(|e| SignError::serialization(format!("value: {e}")))?;

        let mut out = Vec::with_capacity(128 + tx.payload.len());
        out.push(ENCODING_VERSION);
        push_field(&mut out, tx.chain.as_bytes());
        push_field(&mut out, tx.from.as_bytes());
        push_field(&mut out, tx.to.as_bytes());
        push_field(&mut out, &value.to_be_bytes::<32>());
        push_field(&mut out, &tx.payload);
        push_field(&mut out, &tx.nonce.to_be_bytes());
        push_field(&mut out, &tx.gas_limit.to_be_bytes());
        push_field(&mut out, &tx.max_fee_per_gas.to_be_bytes());
        push_field(&mut out, &tx.max_priority_fee_per_gas.to_be_bytes());
        Ok(out)
    }

    /// Keccak-256 content hash of canonical bytes.
    #[must_use]
    pub fn content_hash(canonical: &[u8]) -> [u8; 32] {
        Keccak256::digest(canonical).into()
    }
}

impl<K: KeyCustody> TransactionSigner<K> {
    /// Serialize and sign a transaction with the key stored under `key_id`.
    ///
    /// The resulting [`SignedData`] is a capability to broadcast on exactly
    /// the transaction's chain.
    ///
    /// # Errors
    ///
    /// - [`SignError::Serialization`] when the value does not parse
    /// - [`SignError::UnsupportedChain`] when the chain has no signing
    ///   scheme registered
    /// - [`SignError::KeyUnavailable`] when custody refuses to release the
    ///   key (gate denial stays distinguishable from key-not-found)
    /// - [`SignError::SignatureFailed`] when the primitive fails
    pub fn sign_transaction(
        &self,
        tx: &Transaction,
        key_id: &str,
    ) -> Result<SignedData, SignError> {
        let raw = Self::canonical_bytes(tx)?;
        let hash = Self::content_hash(&raw);

        let signature = self.sign_hash(&hash, key_id, &tx.chain)?;
        debug!(chain = %tx.chain, nonce = tx.nonce, "transaction signed");

        Ok(SignedData {
            chain: tx.chain.clone(),
            raw,
            signature,
            hash: format!("0x{}", hex::encode(hash)),
        })
    }

    /// Sign a free-text message with the key stored under `key_id`.
    ///
    /// The message is domain-prefixed before hashing (see
    /// [`MESSAGE_PREFIX`]).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::sign_transaction`], minus
    /// serialization.
    pub fn sign_message(
        &self,
        text: &str,
        key_id: &str,
        chain: &str,
    ) -> Result<Vec<u8>, SignError> {
        let mut hasher = Keccak256::new();
        hasher.update(MESSAGE_PREFIX.as_bytes());
        hasher.update(text.len().to_string().as_bytes());
        hasher.update(text.as_bytes());
        let hash: [u8; 32] = hasher.finalize().into();

        self.sign_hash(&hash, key_id, chain)
    }

    /// Fetch the key through custody, sign, and drop the key material.
    fn sign_hash(&self, hash: &[u8; 32], key_id: &str, chain: &str) -> Result<Vec<u8>, SignError> {
        let curve = self
            .registry
            .get(chain)
            .map(|spec| spec.curve)
            .ok_or_else(|| SignError::UnsupportedChain {
                chain: chain.to_string(),
            })?;

        // The gate fires inside this call; the SecretKey is zeroized when
        // it goes out of scope at the end of the match arm.
        let secret = self.custody.get(key_id)?;
        match curve {
            CurveFamily::Secp256k1 => Secp256k1KeyPair::from_secret(&secret)?.sign(hash),
            CurveFamily::Ed25519 => Ed25519KeyPair::from_secret(&secret)?.sign(hash),
        }
    }
}

fn push_field(out: &mut Vec<u8>, bytes: &[u8]) {
    // Field lengths are bounded by payload size, far below u32::MAX.
    out.extend_from_slice(&u32::try_from(bytes.len()).unwrap_or(u32::MAX).to_be_bytes());
    out.extend_from_slice(bytes);
}

// ============================================================================
// Tests
// ============================================================================
