//! Chain provider interface.
//!
//! The wallet core never speaks a wire protocol itself. Everything that
//! touches a network - balance queries, history queries, broadcasting -
//! goes through the [`ChainProvider`] trait, and every failure arrives as a
//! tagged [`ChainError`] variant. Raw transport exceptions and vendor error
//! codes stop at the provider boundary.
//!
//! Retry policy also lives on the provider side: the core issues each
//! request exactly once.
//!
//! [`ChainError`]: bursa_core::ChainError

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use bursa_core::{Balance, ChainError, HistoryEntry};

/// External collaborator that talks to a blockchain network.
///
/// # Contract
///
/// - Failures surface as tagged [`ChainError`] variants, never raw
///   transport errors.
/// - Implementations do their own retrying (or none); the core never
///   retries.
/// - All methods are read-only except [`ChainProvider::broadcast`].
///
/// [`ChainError`]: bursa_core::ChainError
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Fetch the current balance of `address` on `chain`.
    async fn fetch_balance(&self, address: &str, chain: &str) -> Result<Balance, ChainError>;

    /// Fetch the transaction history of `address` on `chain`, oldest first.
    async fn fetch_history(
        &self,
        address: &str,
        chain: &str,
    ) -> Result<Vec<HistoryEntry>, ChainError>;

    /// Submit signed transaction bytes to `chain`.
    ///
    /// Returns the network-assigned transaction hash.
    async fn broadcast(&self, raw: &[u8], chain: &str) -> Result<String, ChainError>;
}

// ============================================================================
// StaticProvider
// ============================================================================

/// In-memory provider for tests and local development.
///
/// Serves balances and history from fixed tables and records everything
/// that is broadcast. Unknown `(address, chain)` pairs produce an
/// [`ChainError::Rpc`] error, mirroring how a real node reports missing
/// accounts.
///
/// [`ChainError::Rpc`]: bursa_core::ChainError::Rpc
#[derive(Debug, Default)]
pub struct StaticProvider {
    balances: Mutex<HashMap<(String, String), Balance>>,
    history: Mutex<HashMap<(String, String), Vec<HistoryEntry>>>,
    broadcasts: Mutex<Vec<Vec<u8>>>,
}

impl StaticProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the balance served for `(address, chain)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_balance(&self, address: &str, chain: &str, balance: Balance) {
        self.balances
            .lock()
            .expect("balance table lock poisoned")
            .insert((address.to_string(), chain.to_string()), balance);
    }

    /// Set the history served for `(address, chain)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn set_history(&self, address: &str, chain: &str, entries: Vec<HistoryEntry>) {
        self.history
            .lock()
            .expect("history table lock poisoned")
            .insert((address.to_string(), chain.to_string()), entries);
    }

    /// Raw payloads broadcast so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.broadcasts
            .lock()
            .expect("broadcast log lock poisoned")
            .clone()
    }
}

#[async_trait]
impl ChainProvider for StaticProvider {
    async fn fetch_balance(&self, address: &str, chain: &str) -> Result<Balance, ChainError> {
        self.balances
            .lock()
            .map_err(|_| ChainError::rpc("balance table lock poisoned"))?
            .get(&(address.to_string(), chain.to_string()))
            .cloned()
            .ok_or_else(|| ChainError::rpc(format!("no account state for {address} on {chain}")))
    }

    async fn fetch_history(
        &self,
        address: &str,
        chain: &str,
    ) -> Result<Vec<HistoryEntry>, ChainError> {
        Ok(self
            .history
            .lock()
            .map_err(|_| ChainError::rpc("history table lock poisoned"))?
            .get(&(address.to_string(), chain.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn broadcast(&self, raw: &[u8], _chain: &str) -> Result<String, ChainError> {
        if raw.is_empty() {
            return Err(ChainError::rpc("empty transaction payload"));
        }
        self.broadcasts
            .lock()
            .map_err(|_| ChainError::rpc("broadcast log lock poisoned"))?
            .push(raw.to_vec());
        // Deterministic pseudo-hash: enough for a local provider, where the
        // payload itself is the only identity available.
        let mut acc: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in raw {
            acc ^= u64::from(*byte);
            acc = acc.wrapping_mul(0x0000_0100_0000_01b3);
        }
        Ok(format!("0x{acc:016x}"))
    }
}

// ============================================================================
// Tests
// ============================================================================
