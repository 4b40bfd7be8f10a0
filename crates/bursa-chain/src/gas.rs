//! Gas and fee routing.
//!
//! The [`GasRouter`] computes fee parameters for a pending transfer from
//! the chain's registered fee model. Estimates are advisory and short-lived:
//! they are produced fresh per request, never cached, and callers are
//! expected to re-fetch before any signing operation separated from
//! estimation by a user-perceptible delay.

use bursa_core::{parse_amount, ChainError, GasEstimate};

use crate::registry::ChainRegistry;

/// Computes [`GasEstimate`]s from registered chain fee models.
///
/// For a simple value transfer with empty payload the estimate is the
/// chain's minimum transfer cost. For payload-bearing calls this router
/// returns a conservative intrinsic-cost approximation; a production
/// implementation would size the limit by simulating execution against
/// current chain state, so the figure must never be presented as
/// authoritative.
#[derive(Debug, Clone)]
pub struct GasRouter {
    registry: ChainRegistry,
}

impl GasRouter {
    /// Create a router over the given registry.
    #[must_use]
    pub const fn new(registry: ChainRegistry) -> Self {
        Self { registry }
    }

    /// Estimate fee parameters for a transfer.
    ///
    /// Idempotent for identical inputs: the same `(to, value, payload,
    /// chain)` always yields the same estimate against the same registry.
    ///
    /// # Errors
    ///
    /// - [`ChainError::UnsupportedChain`] when `chain` is not registered
    /// - [`ChainError::InvalidAddress`] when `to` is empty
    /// - [`ChainError::Parse`] when `value` is not a non-negative integer
    ///   string
    pub fn estimate(
        &self,
        to: &str,
        value: &str,
        payload: &[u8],
        chain: &str,
    ) -> Result<GasEstimate, ChainError> {
        let spec = self
            .registry
            .get(chain)
            .ok_or_else(|| ChainError::unsupported_chain(chain))?;

        if to.trim().is_empty() {
            return Err(ChainError::invalid_address(to));
        }
        parse_amount(value).map_err(|e| ChainError::parse(e.to_string()))?;

        Ok(GasEstimate {
            chain: spec.id.clone(),
            gas_limit: spec.transfer_gas(payload.len()),
            max_fee_per_gas: spec.default_max_fee_per_gas,
            max_priority_fee_per_gas: spec.default_max_priority_fee_per_gas,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn router() -> GasRouter {
        GasRouter::new(ChainRegistry::new())
    }

    #[test]
    fn test_plain_transfer_uses_base_gas() {
        let estimate = router().estimate("0xbbb", "0x100", &[], "ethereum").unwrap();
        assert_eq!(estimate.gas_limit, 21_000);
        assert_eq!(estimate.chain, "ethereum");
        assert_eq!(estimate.max_fee_per_gas, 30_000_000_000);
    }

    #[test]
    fn test_payload_raises_the_limit() {
        let plain = router().estimate("0xbbb", "0", &[], "ethereum").unwrap();
        let call = router()
            .estimate("0xbbb", "0", &[0u8; 68], "ethereum")
            .unwrap();
        assert!(call.gas_limit > plain.gas_limit);
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let a = router().estimate("0xbbb", "42", &[1, 2, 3], "polygon").unwrap();
        let b = router().estimate("0xbbb", "42", &[1, 2, 3], "polygon").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_chain_is_rejected() {
        let err = router().estimate("0xbbb", "1", &[], "cosmos").unwrap_err();
        assert!(matches!(err, ChainError::UnsupportedChain { .. }));
    }

    #[test]
    fn test_empty_recipient_is_rejected() {
        let err = router().estimate("  ", "1", &[], "ethereum").unwrap_err();
        assert!(matches!(err, ChainError::InvalidAddress { .. }));
    }

    #[test]
    fn test_malformed_value_is_rejected() {
        let err = router().estimate("0xbbb", "1.5", &[], "ethereum").unwrap_err();
        assert!(matches!(err, ChainError::Parse { .. }));
    }
}
