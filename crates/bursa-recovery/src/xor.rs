//! All-or-nothing XOR secret splitting.
//!
//! The simplest construction that satisfies the no-information guarantee:
//! `total - 1` shares are uniformly random byte strings the length of the
//! secret, and the final share is the secret XORed with all of them.
//! Reconstruction XORs every share together and is order-independent.
//!
//! Any strict subset of shares is a uniformly random distribution over byte
//! strings - it carries no information about the secret at all, which is
//! why this scheme is restricted to `threshold == total`. A k-of-n scheme
//! (polynomial secret sharing over a finite field) would be a valid
//! extension behind the same [`RecoveryStrategy`] interface.

use rand::RngCore;
use zeroize::Zeroizing;

use bursa_core::RecoveryError;

use crate::strategy::{RecoveryShare, RecoveryStrategy};

/// The all-or-nothing XOR scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorSecretSharing;

impl XorSecretSharing {
    /// Create the scheme.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RecoveryStrategy for XorSecretSharing {
    fn split(
        &self,
        secret: &[u8],
        total: u32,
        threshold: u32,
    ) -> Result<Vec<RecoveryShare>, RecoveryError> {
        if total == 0 || threshold != total {
            return Err(RecoveryError::InvalidThreshold { total, threshold });
        }
        if secret.is_empty() {
            return Err(RecoveryError::invalid_shares("secret must not be empty"));
        }

        let mut shares = Vec::with_capacity(total as usize);
        let mut running = Zeroizing::new(secret.to_vec());

        for index in 1..total {
            let mut pad = Zeroizing::new(vec![0u8; secret.len()]);
            rand::rngs::OsRng.fill_bytes(&mut pad);
            for (acc, byte) in running.iter_mut().zip(pad.iter()) {
                *acc ^= byte;
            }
            shares.push(RecoveryShare::new(index, &pad, threshold));
        }
        // The final share closes the XOR chain back to the secret.
        shares.push(RecoveryShare::new(total, &running, threshold));

        Ok(shares)
    }

    fn reconstruct(&self, shares: &[RecoveryShare]) -> Result<Zeroizing<Vec<u8>>, RecoveryError> {
        let Some(first) = shares.first() else {
            return Err(RecoveryError::invalid_shares("no shares supplied"));
        };
        let threshold = first.threshold;
        if threshold == 0 {
            return Err(RecoveryError::invalid_shares("share threshold is zero"));
        }
        if shares.iter().any(|s| s.threshold != threshold) {
            return Err(RecoveryError::invalid_shares(
                "shares disagree on the set threshold",
            ));
        }
        if shares.len() != threshold as usize {
            return Err(RecoveryError::invalid_shares(format!(
                "expected {threshold} shares, got {}",
                shares.len()
            )));
        }

        let mut seen = vec![false; threshold as usize];
        for share in shares {
            let slot = share
                .index
                .checked_sub(1)
                .and_then(|i| seen.get_mut(i as usize))
                .ok_or_else(|| {
                    RecoveryError::invalid_shares(format!(
                        "share index {} outside 1..={threshold}",
                        share.index
                    ))
                })?;
            if std::mem::replace(slot, true) {
                return Err(RecoveryError::invalid_shares(format!(
                    "duplicate share index {}",
                    share.index
                )));
            }
        }

        let mut secret: Option<Zeroizing<Vec<u8>>> = None;
        for share in shares {
            let bytes = share.decode_payload()?;
            match &mut secret {
                None => secret = Some(bytes),
                Some(acc) => {
                    if acc.len() != bytes.len() {
                        return Err(RecoveryError::invalid_shares(
                            "shares have mismatched lengths",
                        ));
                    }
                    for (a, b) in acc.iter_mut().zip(bytes.iter()) {
                        *a ^= b;
                    }
                }
            }
        }

        // Non-empty share sets were enforced above; secret is always set.
        secret.ok_or_else(|| RecoveryError::reconstruction_failed("empty share set"))
    }
}

// ============================================================================
// Tests
// ============================================================================
