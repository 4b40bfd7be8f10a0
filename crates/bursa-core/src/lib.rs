//! # bursa-core
//!
//! Core types, errors, and configuration for the Bursa wallet core.
//!
//! This crate provides the foundational pieces shared across all Bursa
//! crates:
//!
//! - [`error`] - Error taxonomy and result alias
//! - [`types`] - Pipeline value types ([`Transaction`], [`SimulationResult`],
//!   [`SignedData`], ...)
//! - [`units`] - Arbitrary-precision amount parsing
//! - [`config`] - TOML-backed wallet configuration
//!
//! Nothing in this crate performs I/O except [`config`]; the value types are
//! plain data that flow through the orchestration pipeline.
//!
//! [`Transaction`]: types::Transaction
//! [`SimulationResult`]: types::SimulationResult
//! [`SignedData`]: types::SignedData

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod types;
pub mod units;

// Re-export commonly used items at the crate root for convenience
pub use config::{expand_path, LogSettings, RiskSettings, WalletConfig};
pub use error::{
    ChainError, ConfigError, CustodyError, RecoveryError, Result, SignError, SimulationError,
    WalletError,
};
pub use types::{
    AppState, Balance, GasEstimate, HistoryEntry, RiskAlert, Severity, SignedData,
    SimulationResult, Transaction,
};
pub use units::{format_credit, format_debit, parse_amount, AmountParseError};

// Re-export U256 from alloy_primitives for working with amounts
pub use alloy_primitives::U256;
