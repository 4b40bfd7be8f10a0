//! Core value types for the Bursa wallet core.
//!
//! Every type here is an immutable value: it is produced by exactly one
//! pipeline step (gas routing, simulation, risk analysis, signing) and flows
//! forward without mutation. A changed transfer intent requires a newly
//! constructed [`Transaction`], never an in-place edit.
//!
//! # Example
//!
//! ```rust
//! use bursa_core::types::{Transaction, SimulationResult};
//!
//! let tx = Transaction {
//!     chain: "ethereum".to_string(),
//!     from: "0xaaa".to_string(),
//!     to: "0xbbb".to_string(),
//!     value: "0x100".to_string(),
//!     payload: Vec::new(),
//!     nonce: 0,
//!     gas_limit: 21_000,
//!     max_fee_per_gas: 1_000_000_000,
//!     max_priority_fee_per_gas: 100_000_000,
//! };
//!
//! assert!(!tx.is_contract_interaction());
//! assert!(tx.intent_matches("0xbbb", "256")); // 0x100 == 256
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::units::parse_amount;

// ============================================================================
// Transaction
// ============================================================================

/// An immutable transfer description, ready for simulation and signing.
///
/// The `value` field is an arbitrary-precision amount encoded as a decimal
/// or `0x`-hex string in the chain's smallest unit; fixed-width numerics are
/// deliberately avoided to survive balances beyond 64 bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Chain identifier (e.g., "ethereum").
    pub chain: String,
    /// Sender address in chain-native format.
    pub from: String,
    /// Recipient address in chain-native format.
    pub to: String,
    /// Transfer amount, decimal or `0x`-hex string, smallest unit.
    pub value: String,
    /// Opaque call payload; empty for a plain value transfer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<u8>,
    /// Transaction nonce for replay protection.
    pub nonce: u64,
    /// Maximum gas units this transaction may consume.
    pub gas_limit: u64,
    /// Maximum fee per unit gas, smallest unit.
    pub max_fee_per_gas: u128,
    /// Maximum priority fee per unit gas, smallest unit.
    pub max_priority_fee_per_gas: u128,
}

impl Transaction {
    /// Returns `true` if this transaction carries a call payload.
    #[must_use]
    pub fn is_contract_interaction(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Returns `true` if `to`/`value` describe the same intent as this
    /// transaction.
    ///
    /// Values compare numerically when both parse (`"0x100"` matches
    /// `"256"`), falling back to literal comparison otherwise.
    #[must_use]
    pub fn intent_matches(&self, to: &str, value: &str) -> bool {
        if self.to != to {
            return false;
        }
        match (parse_amount(&self.value), parse_amount(value)) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.value == value,
        }
    }
}

// ============================================================================
// GasEstimate
// ============================================================================

/// Fee parameters computed for a pending transfer.
///
/// Estimates are produced fresh per request and are advisory: callers must
/// re-fetch before any signing operation separated from estimation by a
/// user-perceptible delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    /// Chain the estimate applies to.
    pub chain: String,
    /// Estimated gas limit.
    pub gas_limit: u64,
    /// Suggested maximum fee per unit gas.
    pub max_fee_per_gas: u128,
    /// Suggested maximum priority fee per unit gas.
    pub max_priority_fee_per_gas: u128,
}

// ============================================================================
// SimulationResult
// ============================================================================

/// Outcome of dry-running a transaction against known balance state.
///
/// Produced once per simulate call and never re-derived from stale state.
/// Balance deltas are signed decimal strings (`+`/`-` prefixed), keyed by
/// address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Whether the transaction is predicted to succeed.
    pub success: bool,
    /// Predicted gas consumption; zero when the simulation failed.
    pub gas_used: u64,
    /// Predicted balance changes, address to signed decimal delta.
    pub balance_changes: BTreeMap<String, String>,
    /// Human-readable failure description, `None` on success.
    pub error: Option<String>,
}

impl SimulationResult {
    /// Build a successful result with the given balance deltas.
    #[must_use]
    pub const fn succeeded(gas_used: u64, balance_changes: BTreeMap<String, String>) -> Self {
        Self {
            success: true,
            gas_used,
            balance_changes,
            error: None,
        }
    }

    /// Build a failed result with a user-facing description and no deltas.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            gas_used: 0,
            balance_changes: BTreeMap::new(),
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// RiskAlert
// ============================================================================

/// Severity of a risk alert, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational.
    Low,
    /// Worth surfacing prominently.
    Medium,
    /// Likely to be a mistake.
    High,
    /// Triggers the breach hook; audit-logged.
    Critical,
}

/// A human-readable risk finding about a pending transaction.
///
/// Alerts are advisory: they never block signing by themselves. Whether to
/// proceed is the orchestrator's (or ultimately the user's) decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAlert {
    /// How severe the finding is.
    pub severity: Severity,
    /// What was found, in plain language.
    pub message: String,
}

impl RiskAlert {
    /// Build an alert.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    /// Returns `true` for critical-severity alerts.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

// ============================================================================
// SignedData
// ============================================================================

/// A signed, broadcastable transaction.
///
/// Produced exactly once per successful sign call and treated as a
/// capability to broadcast on exactly one chain - the `chain` tag binds the
/// signature to its target and must never be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedData {
    /// Chain this signature is valid for.
    pub chain: String,
    /// Canonical serialized transaction bytes.
    pub raw: Vec<u8>,
    /// Signature over the content hash of `raw`.
    pub signature: Vec<u8>,
    /// `0x`-prefixed hex content hash of `raw`.
    pub hash: String,
}

// ============================================================================
// Balance / History
// ============================================================================

/// An account balance as reported by a chain provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Amount in the smallest unit, decimal or `0x`-hex string.
    pub amount: String,
    /// Currency symbol (e.g., "ETH").
    pub currency: String,
    /// Decimal places of the smallest unit.
    pub decimals: u8,
}

/// One historical transaction as reported by a chain provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Transaction hash.
    pub hash: String,
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Transferred amount, smallest unit, decimal or hex string.
    pub value: String,
    /// When the transaction was included.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// AppState
// ============================================================================

/// Externally observable wallet state.
///
/// Transitions: `Idle -> Loading -> { Loaded | Error }`. State is committed
/// atomically at suspension boundaries; observers never see a half-applied
/// flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum AppState {
    /// No account loaded yet.
    Idle,
    /// A balance fetch is in flight.
    Loading,
    /// Account loaded with its current balance.
    Loaded {
        /// The active account's balance.
        balance: Balance,
    },
    /// The last operation failed; the message is already sanitized.
    Error {
        /// User-facing failure description.
        message: String,
    },
}

impl AppState {
    /// Returns `true` if an account is loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// Returns `true` if the state is an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn transfer() -> Transaction {
        Transaction {
            chain: "ethereum".to_string(),
            from: "0xaaa".to_string(),
            to: "0xbbb".to_string(),
            value: "0x100".to_string(),
            payload: Vec::new(),
            nonce: 7,
            gas_limit: 21_000,
            max_fee_per_gas: 1_000_000_000,
            max_priority_fee_per_gas: 100_000_000,
        }
    }

    #[test]
    fn test_intent_matches_numerically() {
        let tx = transfer();
        assert!(tx.intent_matches("0xbbb", "0x100"));
        assert!(tx.intent_matches("0xbbb", "256"));
        assert!(!tx.intent_matches("0xbbb", "257"));
        assert!(!tx.intent_matches("0xccc", "256"));
    }

    #[test]
    fn test_intent_matches_falls_back_to_literal() {
        let mut tx = transfer();
        tx.value = "not-a-number".to_string();
        assert!(tx.intent_matches("0xbbb", "not-a-number"));
        assert!(!tx.intent_matches("0xbbb", "256"));
    }

    #[test]
    fn test_contract_interaction_flag() {
        let mut tx = transfer();
        assert!(!tx.is_contract_interaction());
        tx.payload = vec![0xa9, 0x05, 0x9c, 0xbb];
        assert!(tx.is_contract_interaction());
    }

    #[test]
    fn test_simulation_result_constructors() {
        let ok = SimulationResult::succeeded(21_000, BTreeMap::new());
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = SimulationResult::failed("Insufficient funds");
        assert!(!failed.success);
        assert_eq!(failed.gas_used, 0);
        assert!(failed.balance_changes.is_empty());
        assert_eq!(failed.error.as_deref(), Some("Insufficient funds"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert!(RiskAlert::new(Severity::Critical, "x").is_critical());
    }

    #[test]
    fn test_app_state_predicates() {
        assert!(!AppState::Idle.is_loaded());
        assert!(AppState::Loaded {
            balance: Balance {
                amount: "0".to_string(),
                currency: "ETH".to_string(),
                decimals: 18,
            }
        }
        .is_loaded());
        assert!(AppState::Error {
            message: "boom".to_string()
        }
        .is_error());
    }

    #[test]
    fn test_transaction_round_trips_through_serde() {
        let tx = transfer();
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
    }
}
