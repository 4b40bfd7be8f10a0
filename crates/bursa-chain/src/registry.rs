//! Chain registry for runtime chain lookup.
//!
//! Each supported chain contributes a [`ChainSpec`]: its curve family, fee
//! model, and the standard gas figures used by the gas router and the
//! simulation engine. The registry is immutable after construction and
//! cheap to clone (`Arc` internally), so it can be shared freely across
//! async tasks.
//!
//! # Example
//!
//! ```
//! use bursa_chain::ChainRegistry;
//!
//! let registry = ChainRegistry::new();
//! assert!(registry.supports("ethereum"));
//!
//! let spec = registry.get("ethereum").unwrap();
//! assert_eq!(spec.base_transfer_gas, 21_000);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// CurveFamily
// ============================================================================

/// Signature scheme family used by a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveFamily {
    /// ECDSA over secp256k1 (account-model EVM chains).
    Secp256k1,
    /// Ed25519 (Solana-family chains).
    Ed25519,
}

impl std::fmt::Display for CurveFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secp256k1 => write!(f, "secp256k1"),
            Self::Ed25519 => write!(f, "ed25519"),
        }
    }
}

// ============================================================================
// ChainSpec
// ============================================================================

/// Static parameters of one supported chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    /// Chain identifier (e.g., "ethereum").
    pub id: String,
    /// Native currency symbol.
    pub native_symbol: String,
    /// Decimal places of the native currency's smallest unit.
    pub native_decimals: u8,
    /// Signature scheme family.
    pub curve: CurveFamily,
    /// Gas consumed by a plain value transfer with empty payload.
    pub base_transfer_gas: u64,
    /// Intrinsic gas charged per payload byte.
    pub calldata_gas_per_byte: u64,
    /// Default maximum fee per unit gas, smallest unit.
    pub default_max_fee_per_gas: u128,
    /// Default maximum priority fee per unit gas, smallest unit.
    pub default_max_priority_fee_per_gas: u128,
}

impl ChainSpec {
    /// Gas limit for a transfer carrying `payload_len` bytes of calldata.
    ///
    /// For an empty payload this is exactly the chain's minimum transfer
    /// cost. For payload-bearing calls the figure is an intrinsic-cost
    /// approximation - a real implementation sizes the limit by simulating
    /// execution, so callers must treat this as conservative, not
    /// authoritative.
    #[must_use]
    pub fn transfer_gas(&self, payload_len: usize) -> u64 {
        self.base_transfer_gas
            .saturating_add(self.calldata_gas_per_byte.saturating_mul(payload_len as u64))
    }
}

// ============================================================================
// ChainRegistry
// ============================================================================

/// Registry of supported chains, keyed by identifier.
///
/// # Construction
///
/// [`ChainRegistry::new`] registers all production chains;
/// [`ChainRegistry::empty`] plus [`ChainRegistry::register`] build custom
/// sets for tests.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Arc<HashMap<String, ChainSpec>>,
}

impl ChainRegistry {
    /// Create a registry with all supported chains.
    ///
    /// Currently registered:
    /// - `ethereum` - Ethereum mainnet (secp256k1, 18 decimals)
    /// - `polygon` - Polygon PoS (secp256k1, 18 decimals)
    /// - `solana` - Solana (Ed25519, 9 decimals)
    #[must_use]
    pub fn new() -> Self {
        let mut chains = HashMap::new();
        for spec in [
            ChainSpec {
                id: "ethereum".to_string(),
                native_symbol: "ETH".to_string(),
                native_decimals: 18,
                curve: CurveFamily::Secp256k1,
                base_transfer_gas: 21_000,
                calldata_gas_per_byte: 16,
                default_max_fee_per_gas: 30_000_000_000, // 30 gwei
                default_max_priority_fee_per_gas: 1_000_000_000, // 1 gwei
            },
            ChainSpec {
                id: "polygon".to_string(),
                native_symbol: "POL".to_string(),
                native_decimals: 18,
                curve: CurveFamily::Secp256k1,
                base_transfer_gas: 21_000,
                calldata_gas_per_byte: 16,
                default_max_fee_per_gas: 60_000_000_000,
                default_max_priority_fee_per_gas: 30_000_000_000,
            },
            ChainSpec {
                id: "solana".to_string(),
                native_symbol: "SOL".to_string(),
                native_decimals: 9,
                curve: CurveFamily::Ed25519,
                // Solana charges per signature rather than per gas unit; the
                // base fee is modeled as a 5000-lamport flat cost.
                base_transfer_gas: 5_000,
                calldata_gas_per_byte: 0,
                default_max_fee_per_gas: 1,
                default_max_priority_fee_per_gas: 0,
            },
        ] {
            chains.insert(spec.id.clone(), spec);
        }
        Self {
            chains: Arc::new(chains),
        }
    }

    /// Create an empty registry (for testing).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            chains: Arc::new(HashMap::new()),
        }
    }

    /// Register a chain spec, replacing any spec with the same id.
    ///
    /// Primarily for tests; production code uses [`ChainRegistry::new`].
    pub fn register(&mut self, spec: ChainSpec) {
        let chains = Arc::make_mut(&mut self.chains);
        chains.insert(spec.id.clone(), spec);
    }

    /// Look up a chain spec by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ChainSpec> {
        self.chains.get(id)
    }

    /// Returns `true` if the chain is registered.
    #[must_use]
    pub fn supports(&self, id: &str) -> bool {
        self.chains.contains_key(id)
    }

    /// Sorted list of registered chain identifiers.
    #[must_use]
    pub fn supported_chains(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.chains.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns `true` if no chains are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
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
    fn test_new_registers_production_chains() {
        let registry = ChainRegistry::new();
        assert_eq!(registry.len(), 3);
        assert!(registry.supports("ethereum"));
        assert!(registry.supports("polygon"));
        assert!(registry.supports("solana"));
        assert!(!registry.supports("cosmos"));
    }

    #[test]
    fn test_supported_chains_is_sorted() {
        let registry = ChainRegistry::new();
        assert_eq!(
            registry.supported_chains(),
            vec!["ethereum", "polygon", "solana"]
        );
    }

    #[test]
    fn test_ethereum_fee_model() {
        let registry = ChainRegistry::new();
        let eth = registry.get("ethereum").unwrap();
        assert_eq!(eth.curve, CurveFamily::Secp256k1);
        assert_eq!(eth.transfer_gas(0), 21_000);
        // 4-byte selector + one word argument
        assert_eq!(eth.transfer_gas(36), 21_000 + 36 * 16);
    }

    #[test]
    fn test_solana_flat_fee() {
        let registry = ChainRegistry::new();
        let sol = registry.get("solana").unwrap();
        assert_eq!(sol.curve, CurveFamily::Ed25519);
        assert_eq!(sol.transfer_gas(0), sol.transfer_gas(1024));
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = ChainRegistry::empty();
        assert!(registry.is_empty());

        let mut spec = ChainRegistry::new().get("ethereum").unwrap().clone();
        spec.id = "testnet".to_string();
        registry.register(spec.clone());
        assert_eq!(registry.len(), 1);

        spec.base_transfer_gas = 42;
        registry.register(spec);
        assert_eq!(registry.get("testnet").unwrap().base_transfer_gas, 42);
    }

    #[test]
    fn test_clone_shares_chains() {
        let registry = ChainRegistry::new();
        let clone = registry.clone();
        assert_eq!(registry.supported_chains(), clone.supported_chains());
    }
}
