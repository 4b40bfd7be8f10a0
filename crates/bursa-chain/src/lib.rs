//! # bursa-chain
//!
//! Chain abstraction for the Bursa wallet core: the registry of supported
//! chains, the [`ChainProvider`] interface to external networks, gas/fee
//! routing, and the read-only transaction simulation engine.
//!
//! Nothing in this crate signs or persists anything; it turns transfer
//! intents into fee parameters and predicted outcomes, and hands network
//! I/O to whichever [`ChainProvider`] was injected at construction time.
//!
//! ## Modules
//!
//! - [`registry`] - [`ChainRegistry`] and per-chain [`ChainSpec`] parameters
//! - [`provider`] - the [`ChainProvider`] trait and a static test provider
//! - [`gas`] - [`GasRouter`] fee estimation
//! - [`simulate`] - [`SimulationEngine`] balance dry-runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod gas;
pub mod provider;
pub mod registry;
pub mod simulate;

pub use gas::GasRouter;
pub use provider::{ChainProvider, StaticProvider};
pub use registry::{ChainRegistry, ChainSpec, CurveFamily};
pub use simulate::{SimulationEngine, COST_OVERFLOW, INSUFFICIENT_FUNDS};
