//! # bursa-recovery
//!
//! Recoverable secret splitting for the Bursa wallet core.
//!
//! A wallet seed is split into [`RecoveryShare`]s during onboarding/backup
//! and reconstructed from a complete set during recovery. The splitting
//! scheme guarantees that fewer than `threshold` shares reveal nothing
//! about the secret - information-theoretically, not merely
//! computationally.
//!
//! The shipped strategy is [`XorSecretSharing`], the all-or-nothing
//! construction (`threshold == total`). True k-of-n threshold sharing is a
//! possible future strategy behind the same [`RecoveryStrategy`] interface.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod strategy;
pub mod xor;

pub use strategy::{RecoveryShare, RecoveryStrategy};
pub use xor::XorSecretSharing;
