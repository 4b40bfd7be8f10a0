//! # bursa
//!
//! A non-custodial wallet's transaction lifecycle and key-custody core:
//! the subsystem that turns "send X to Y" into a signed, broadcastable
//! transaction while guarding the private key, estimating cost, flagging
//! risk, and splitting the underlying seed into recoverable shares.
//!
//! The [`WalletService`] orchestrator sequences the pipeline:
//!
//! ```text
//! load balance -> prepare (gas -> simulate -> analyze) -> confirm
//!              -> sign -> broadcast -> refresh
//! ```
//!
//! Presentation, chain wire protocols, and preference persistence are
//! external: consumers observe [`WalletSnapshot`]s and issue commands;
//! networks are reached through an injected
//! [`ChainProvider`](bursa_chain::ChainProvider); key release is gated by
//! an injected [`AuthorizationGate`](bursa_crypto::AuthorizationGate).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bursa::WalletService;
//! use bursa_chain::{ChainRegistry, StaticProvider};
//! use bursa_crypto::{AlwaysAllowGate, FileKeyCustody};
//! use bursa_recovery::XorSecretSharing;
//! use bursa_risk::{RiskConfig, TracingBreachSink};
//!
//! # async fn example() -> Result<(), bursa_core::WalletError> {
//! let custody = Arc::new(FileKeyCustody::new(
//!     "/tmp/bursa-keys".into(),
//!     AlwaysAllowGate,
//!     "unlock-secret",
//! )?);
//!
//! let wallet = WalletService::new(
//!     Arc::new(StaticProvider::new()),
//!     custody,
//!     XorSecretSharing::new(),
//!     ChainRegistry::new(),
//!     RiskConfig::default(),
//!     Arc::new(TracingBreachSink),
//!     None,
//!     "ethereum",
//! );
//!
//! wallet.load_account("0xaaa").await?;
//! let outcome = wallet.prepare_transaction("0xbbb", "0x100").await?;
//! if outcome.simulation.success {
//!     let hash = wallet.confirm_transaction("0xbbb", "0x100").await?;
//!     println!("broadcast as {hash}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod audit;
pub mod logging;
pub mod orchestrator;

pub use audit::{AuditEvent, AuditLogger, VerificationReport};
pub use logging::{init_logging, redact_sensitive, LogConfig, LogError, LogFormat, LogLevel};
pub use orchestrator::{PrepareOutcome, WalletService, WalletSnapshot};
