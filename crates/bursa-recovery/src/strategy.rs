//! Recovery shares and the strategy interface.
//!
//! A secret (typically a wallet seed) is split into a set of
//! [`RecoveryShare`]s for backup. A share set is meaningful only as a
//! whole: the strategy contract requires that any set of fewer than
//! `threshold` shares reveals no information about the secret -
//! information-theoretically, not merely computationally. That guarantee
//! lives in the split algorithm itself, not in access control around the
//! shares.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use bursa_core::RecoveryError;

/// One share of a split secret.
///
/// The payload is base64; the index is 1-based within its set. Shares are
/// owned by the backup flow and the user's chosen storage locations - the
/// core never persists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryShare {
    /// 1-based position within the share set.
    pub index: u32,
    /// Base64-encoded share bytes.
    pub payload: String,
    /// Number of shares required to reconstruct the secret.
    pub threshold: u32,
}

impl RecoveryShare {
    /// Build a share from raw bytes.
    #[must_use]
    pub fn new(index: u32, bytes: &[u8], threshold: u32) -> Self {
        Self {
            index,
            payload: BASE64.encode(bytes),
            threshold,
        }
    }

    /// Decode the payload back to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::InvalidShares`] when the payload is not
    /// valid base64.
    pub fn decode_payload(&self) -> Result<Zeroizing<Vec<u8>>, RecoveryError> {
        BASE64
            .decode(&self.payload)
            .map(Zeroizing::new)
            .map_err(|_| {
                RecoveryError::invalid_shares(format!(
                    "share {} payload is not valid base64",
                    self.index
                ))
            })
    }
}

/// A secret-splitting scheme.
///
/// Implementations must preserve the no-information-from-partial-sets
/// guarantee. The XOR scheme in [`crate::xor`] restricts itself to
/// `threshold == total`; a polynomial k-of-n scheme would be a valid
/// alternative behind this same interface.
pub trait RecoveryStrategy: Send + Sync {
    /// Split `secret` into `total` shares requiring `threshold` to
    /// reconstruct.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::InvalidThreshold`] when the scheme does not
    /// support the requested `(total, threshold)` combination.
    fn split(
        &self,
        secret: &[u8],
        total: u32,
        threshold: u32,
    ) -> Result<Vec<RecoveryShare>, RecoveryError>;

    /// Reconstruct the secret from a complete share set.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::InvalidShares`] when the set is incomplete
    /// or inconsistent, and [`RecoveryError::ReconstructionFailed`] when
    /// the combined bytes cannot be the original secret.
    fn reconstruct(&self, shares: &[RecoveryShare]) -> Result<Zeroizing<Vec<u8>>, RecoveryError>;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_share_payload_round_trip() {
        let share = RecoveryShare::new(1, b"some bytes", 3);
        assert_eq!(share.decode_payload().unwrap().as_slice(), b"some bytes");
    }

    #[test]
    fn test_malformed_payload_is_invalid_shares() {
        let share = RecoveryShare {
            index: 2,
            payload: "!!!not base64!!!".to_string(),
            threshold: 3,
        };
        assert!(matches!(
            share.decode_payload(),
            Err(RecoveryError::InvalidShares { .. })
        ));
    }

    #[test]
    fn test_share_serde_round_trip() {
        let share = RecoveryShare::new(2, &[1, 2, 3], 3);
        let json = serde_json::to_string(&share).unwrap();
        let back: RecoveryShare = serde_json::from_str(&json).unwrap();
        assert_eq!(share, back);
    }
}
