//! # bursa-crypto
//!
//! Key custody and signing for the Bursa wallet core.
//!
//! ## Modules
//!
//! - [`keys`] - [`SecretKey`] with zeroization and redacted debug output
//! - [`keypair`] - ECDSA/secp256k1 and Ed25519 key pairs
//! - [`encryption`] - ChaCha20-Poly1305 sealing with Argon2id derivation
//! - [`custody`] - authorization-gated encrypted key storage
//! - [`signer`] - canonical serialization and transaction/message signing
//!
//! ## Security model
//!
//! Key material exists as a [`SecretKey`] only between a gated custody
//! `get` and the end of the signing call that requested it. At rest it is
//! always sealed; in memory it is zeroized on drop; it never implements
//! `Clone`, never appears in `Debug` output, and is never serialized except
//! through [`encryption`].
//!
//! [`SecretKey`]: keys::SecretKey

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod custody;
pub mod encryption;
pub mod keypair;
pub mod keys;
pub mod signer;

pub use custody::{AlwaysAllowGate, AuthorizationGate, FileKeyCustody, KeyCustody};
pub use encryption::{open, seal, SealedSecret};
pub use keypair::{Ed25519KeyPair, KeyPair, Secp256k1KeyPair};
pub use keys::{SecretKey, SECRET_KEY_LEN};
pub use signer::{TransactionSigner, ENCODING_VERSION, MESSAGE_PREFIX};
