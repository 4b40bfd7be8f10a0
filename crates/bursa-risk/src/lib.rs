//! # bursa-risk
//!
//! Deterministic risk analysis for the Bursa wallet core: a pure rule
//! engine over `(SimulationResult, Transaction)` pairs plus a breach sink
//! hook for audit logging of critical findings.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod analyzer;

pub use analyzer::{BreachSink, RiskAnalyzer, RiskConfig, TracingBreachSink};
