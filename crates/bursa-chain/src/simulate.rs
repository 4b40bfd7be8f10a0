//! Transaction simulation against known balance state.
//!
//! The [`SimulationEngine`] dry-runs a transfer before anything is signed:
//! it predicts success or failure and the resulting balance deltas without
//! touching the network's mutable state. Simulation is strictly read-only
//! with respect to the chain.
//!
//! Two kinds of "failure" are kept apart deliberately:
//!
//! - a *failed simulation* (insufficient funds, cost overflow) is a
//!   successful dry-run whose verdict is `success == false`;
//! - a [`SimulationError`] means the dry-run itself could not be carried
//!   out (provider failure, unparseable amounts) and nothing can be said
//!   about the transaction.
//!
//! [`SimulationError`]: bursa_core::SimulationError

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::U256;
use tracing::debug;

use bursa_core::{
    format_credit, format_debit, parse_amount, ChainError, SimulationError, SimulationResult,
    Transaction,
};

use crate::provider::ChainProvider;
use crate::registry::ChainRegistry;

/// User-facing error text for a transfer the sender cannot afford.
pub const INSUFFICIENT_FUNDS: &str = "Insufficient funds";

/// User-facing error text for a cost that exceeds the representable range.
pub const COST_OVERFLOW: &str = "Transaction cost exceeds representable range";

/// Dry-runs transactions against provider-reported balances.
pub struct SimulationEngine<P> {
    provider: Arc<P>,
    registry: ChainRegistry,
}

impl<P> std::fmt::Debug for SimulationEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("provider", &"<ChainProvider>")
            .field("registry", &self.registry)
            .finish()
    }
}

impl<P: ChainProvider> SimulationEngine<P> {
    /// Create an engine over the given provider and registry.
    #[must_use]
    pub const fn new(provider: Arc<P>, registry: ChainRegistry) -> Self {
        Self { provider, registry }
    }

    /// Dry-run `tx` against the sender's current balance.
    ///
    /// Computes `total_cost = value + gas_limit * max_fee_per_gas` with
    /// checked arithmetic and compares it against the sender's balance.
    /// Balance and value are parsed as arbitrary-precision integers; a
    /// string that does not parse is an error, never a silent zero.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::Chain`] when the chain is unknown or the
    ///   provider fails
    /// - [`SimulationError::InvalidAmount`] when the balance or value is
    ///   not a non-negative integer string
    pub async fn simulate(&self, tx: &Transaction) -> Result<SimulationResult, SimulationError> {
        let spec = self
            .registry
            .get(&tx.chain)
            .ok_or_else(|| ChainError::unsupported_chain(&tx.chain))?;

        let balance = self.provider.fetch_balance(&tx.from, &tx.chain).await?;
        let balance = parse_amount(&balance.amount).map_err(|e| {
            SimulationError::invalid_amount(format!("balance for {}: {e}", tx.from))
        })?;
        let value = parse_amount(&tx.value)
            .map_err(|e| SimulationError::invalid_amount(format!("transfer value: {e}")))?;

        let gas_cost = U256::from(tx.gas_limit)
            .checked_mul(U256::from(tx.max_fee_per_gas))
            .and_then(|fee| value.checked_add(fee));
        let Some(total_cost) = gas_cost else {
            debug!(chain = %tx.chain, "transfer cost overflowed 256 bits");
            return Ok(SimulationResult::failed(COST_OVERFLOW));
        };

        if balance < total_cost {
            debug!(
                chain = %tx.chain,
                %balance,
                %total_cost,
                "simulation verdict: insufficient funds"
            );
            return Ok(SimulationResult::failed(INSUFFICIENT_FUNDS));
        }

        let mut changes = BTreeMap::new();
        if tx.from == tx.to {
            // Self-transfer: the value comes straight back, only the fee
            // leaves the account.
            changes.insert(tx.from.clone(), format_debit(total_cost - value));
        } else {
            changes.insert(tx.from.clone(), format_debit(total_cost));
            changes.insert(tx.to.clone(), format_credit(value));
        }

        Ok(SimulationResult::succeeded(
            spec.transfer_gas(tx.payload.len()),
            changes,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::provider::StaticProvider;
    use bursa_core::Balance;

    fn engine_with_balance(amount: &str) -> SimulationEngine<StaticProvider> {
        let provider = StaticProvider::new();
        provider.set_balance(
            "0xaaa",
            "ethereum",
            Balance {
                amount: amount.to_string(),
                currency: "ETH".to_string(),
                decimals: 18,
            },
        );
        SimulationEngine::new(Arc::new(provider), ChainRegistry::new())
    }

    fn transfer(value: &str) -> Transaction {
        Transaction {
            chain: "ethereum".to_string(),
            from: "0xaaa".to_string(),
            to: "0xbbb".to_string(),
            value: value.to_string(),
            payload: Vec::new(),
            nonce: 0,
            gas_limit: 21_000,
            max_fee_per_gas: 1_000_000_000,
            max_priority_fee_per_gas: 100_000_000,
        }
    }

    #[tokio::test]
    async fn test_funded_transfer_succeeds_with_two_deltas() {
        // Balance 0x100000000000000, value 0x100, 21000 gas at 1 gwei.
        let engine = engine_with_balance("0x100000000000000");
        let result = engine.simulate(&transfer("0x100")).await.unwrap();

        assert!(result.success);
        assert_eq!(result.gas_used, 21_000);
        assert!(result.error.is_none());

        let total_cost = U256::from(256u64) + U256::from(21_000u64) * U256::from(1_000_000_000u64);
        assert_eq!(
            result.balance_changes.get("0xaaa").unwrap(),
            &format!("-{total_cost}")
        );
        assert_eq!(result.balance_changes.get("0xbbb").unwrap(), "+256");
    }

    #[tokio::test]
    async fn test_value_deltas_cancel_between_sender_and_recipient() {
        let engine = engine_with_balance("1000000000000000000");
        let result = engine.simulate(&transfer("12345")).await.unwrap();

        let debit = parse_amount(
            result.balance_changes.get("0xaaa").unwrap().trim_start_matches('-'),
        )
        .unwrap();
        let credit = parse_amount(
            result.balance_changes.get("0xbbb").unwrap().trim_start_matches('+'),
        )
        .unwrap();
        let fee = U256::from(21_000u64) * U256::from(1_000_000_000u64);
        // Sender debit minus the fee component equals the recipient credit:
        // no value is created or destroyed.
        assert_eq!(debit - fee, credit);
    }

    #[tokio::test]
    async fn test_zero_balance_fails_with_insufficient_funds() {
        let engine = engine_with_balance("0x0");
        let result = engine.simulate(&transfer("1")).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.gas_used, 0);
        assert_eq!(result.error.as_deref(), Some(INSUFFICIENT_FUNDS));
        assert!(result.balance_changes.is_empty());
    }

    #[tokio::test]
    async fn test_balance_one_short_of_cost_fails() {
        let total_cost = U256::from(256u64) + U256::from(21_000u64) * U256::from(1_000_000_000u64);
        let engine = engine_with_balance(&(total_cost - U256::from(1u64)).to_string());
        let result = engine.simulate(&transfer("256")).await.unwrap();
        assert!(!result.success);

        let engine = engine_with_balance(&total_cost.to_string());
        let result = engine.simulate(&transfer("256")).await.unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_unparseable_balance_is_an_error_not_zero() {
        let engine = engine_with_balance("plenty");
        let err = engine.simulate(&transfer("1")).await.unwrap_err();
        assert!(matches!(err, SimulationError::InvalidAmount { .. }));
    }

    #[tokio::test]
    async fn test_unparseable_value_is_an_error() {
        let engine = engine_with_balance("1000000000000000000");
        let err = engine.simulate(&transfer("-1")).await.unwrap_err();
        assert!(matches!(err, SimulationError::InvalidAmount { .. }));
    }

    #[tokio::test]
    async fn test_unknown_chain_is_an_error() {
        let engine = engine_with_balance("1");
        let mut tx = transfer("1");
        tx.chain = "cosmos".to_string();
        let err = engine.simulate(&tx).await.unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Chain(ChainError::UnsupportedChain { .. })
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates_as_chain_error() {
        // No balance configured for the sender.
        let provider = StaticProvider::new();
        let engine = SimulationEngine::new(Arc::new(provider), ChainRegistry::new());
        let err = engine.simulate(&transfer("1")).await.unwrap_err();
        assert!(matches!(err, SimulationError::Chain(ChainError::Rpc { .. })));
    }

    #[tokio::test]
    async fn test_cost_overflow_is_a_failed_simulation() {
        let engine = engine_with_balance("0x10");
        let mut tx = transfer(&U256::MAX.to_string());
        tx.gas_limit = u64::MAX;
        tx.max_fee_per_gas = u128::MAX;
        let result = engine.simulate(&tx).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(COST_OVERFLOW));
    }

    #[tokio::test]
    async fn test_self_transfer_charges_only_the_fee() {
        let engine = engine_with_balance("1000000000000000000");
        let mut tx = transfer("500");
        tx.to = tx.from.clone();
        let result = engine.simulate(&tx).await.unwrap();

        assert!(result.success);
        assert_eq!(result.balance_changes.len(), 1);
        let fee = U256::from(21_000u64) * U256::from(1_000_000_000u64);
        assert_eq!(
            result.balance_changes.get("0xaaa").unwrap(),
            &format!("-{fee}")
        );
    }
}
