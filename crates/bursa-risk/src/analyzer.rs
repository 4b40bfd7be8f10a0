//! Risk analysis of simulated transactions.
//!
//! The analyzer inspects a `(SimulationResult, Transaction)` pair and
//! produces zero or more [`RiskAlert`]s. It is pure: identical inputs
//! always yield the identical alert list. Rules are evaluated
//! independently - no short-circuiting - and are additive, so one
//! transaction can accumulate several alerts.
//!
//! Alerts are advisory. Nothing here blocks signing; the orchestrator (and
//! ultimately the user) decides what to do with the findings. The only
//! side effect lives in [`RiskAnalyzer::analyze_and_report`], which invokes
//! the [`BreachSink`] once per critical alert for audit logging.
//!
//! # Rule set
//!
//! 1. Simulation failed → High
//! 2. Value above the configured threshold → Medium ("high value")
//! 3. Non-empty payload → Medium ("contract interaction")
//! 4. Recipient on the configured denylist → Critical

use std::collections::HashSet;

use alloy_primitives::U256;
use tracing::warn;

use bursa_core::{parse_amount, RiskAlert, RiskSettings, Severity, SimulationResult, Transaction};

// ============================================================================
// RiskConfig
// ============================================================================

/// Thresholds and lists the rule set evaluates against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskConfig {
    /// Transfers above this magnitude raise a "high value" alert.
    pub high_value_threshold: U256,
    /// Recipients that raise a critical alert.
    pub deny_recipients: HashSet<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            // 1 unit of an 18-decimal native currency.
            high_value_threshold: U256::from(1_000_000_000_000_000_000u64),
            deny_recipients: HashSet::new(),
        }
    }
}

impl RiskConfig {
    /// Set the high-value threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: U256) -> Self {
        self.high_value_threshold = threshold;
        self
    }

    /// Set the recipient denylist.
    #[must_use]
    pub fn with_deny_recipients<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny_recipients = recipients.into_iter().map(Into::into).collect();
        self
    }

    /// Build from persisted [`RiskSettings`].
    ///
    /// # Errors
    ///
    /// Returns the raw threshold string when it does not parse as an
    /// amount.
    pub fn from_settings(settings: &RiskSettings) -> Result<Self, String> {
        let threshold = parse_amount(&settings.high_value_threshold)
            .map_err(|_| settings.high_value_threshold.clone())?;
        Ok(Self {
            high_value_threshold: threshold,
            deny_recipients: settings.deny_recipients.iter().cloned().collect(),
        })
    }
}

// ============================================================================
// BreachSink
// ============================================================================

/// Side-effecting hook invoked once per critical alert.
///
/// The production sink is the audit log; tests substitute recorders. Sinks
/// are infallible by design: a failing audit path must not change the
/// analysis outcome.
pub trait BreachSink: Send + Sync {
    /// Record a critical alert.
    fn on_breach(&self, alert: &RiskAlert);
}

/// Sink that emits a `tracing` warning and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBreachSink;

impl BreachSink for TracingBreachSink {
    fn on_breach(&self, alert: &RiskAlert) {
        warn!(severity = ?alert.severity, message = %alert.message, "risk breach");
    }
}

// ============================================================================
// RiskAnalyzer
// ============================================================================

/// Deterministic rule engine over simulation results.
#[derive(Debug, Clone, Default)]
pub struct RiskAnalyzer {
    config: RiskConfig,
}

impl RiskAnalyzer {
    /// Create an analyzer with the given configuration.
    #[must_use]
    pub const fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Evaluate the full rule set. Pure; no side effects.
    #[must_use]
    pub fn analyze(&self, simulation: &SimulationResult, tx: &Transaction) -> Vec<RiskAlert> {
        let mut alerts = Vec::new();

        if !simulation.success {
            let detail = simulation.error.as_deref().unwrap_or("unknown reason");
            alerts.push(RiskAlert::new(
                Severity::High,
                format!("Simulation failed: {detail}"),
            ));
        }

        // Value rule is skipped for unparseable values; those already fail
        // simulation and are covered by the rule above.
        if let Ok(value) = parse_amount(&tx.value) {
            if value > self.config.high_value_threshold {
                alerts.push(RiskAlert::new(
                    Severity::Medium,
                    "High value transfer: double-check the recipient address",
                ));
            }
        }

        if tx.is_contract_interaction() {
            alerts.push(RiskAlert::new(
                Severity::Medium,
                "Contract interaction: this transaction executes code",
            ));
        }

        if self.config.deny_recipients.contains(&tx.to) {
            alerts.push(RiskAlert::new(
                Severity::Critical,
                format!("Recipient {} is on the configured denylist", tx.to),
            ));
        }

        alerts
    }

    /// Evaluate the rule set and report every critical alert to `sink`.
    #[must_use]
    pub fn analyze_and_report(
        &self,
        simulation: &SimulationResult,
        tx: &Transaction,
        sink: &dyn BreachSink,
    ) -> Vec<RiskAlert> {
        let alerts = self.analyze(simulation, tx);
        for alert in alerts.iter().filter(|a| a.is_critical()) {
            sink.on_breach(alert);
        }
        alerts
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn ok_simulation() -> SimulationResult {
        SimulationResult::succeeded(21_000, BTreeMap::new())
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

    fn analyzer() -> RiskAnalyzer {
        RiskAnalyzer::new(
            RiskConfig::default()
                .with_threshold(U256::from(1_000_000u64))
                .with_deny_recipients(["0xbad"]),
        )
    }

    #[test]
    fn test_clean_transfer_produces_no_alerts() {
        let alerts = analyzer().analyze(&ok_simulation(), &transfer("100"));
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_failed_simulation_is_high_severity() {
        let failed = SimulationResult::failed("Insufficient funds");
        let alerts = analyzer().analyze(&failed, &transfer("100"));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::High);
        assert!(alerts[0].message.contains("Insufficient funds"));
    }

    #[test]
    fn test_high_value_is_medium_severity() {
        let alerts = analyzer().analyze(&ok_simulation(), &transfer("1000001"));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Medium);

        // Exactly the threshold does not exceed it: silent.
        let alerts = analyzer().analyze(&ok_simulation(), &transfer("1000000"));
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_contract_interaction_is_flagged() {
        let mut tx = transfer("100");
        tx.payload = vec![0xa9, 0x05, 0x9c, 0xbb];
        let alerts = analyzer().analyze(&ok_simulation(), &tx);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].message.contains("Contract interaction"));
    }

    #[test]
    fn test_denylisted_recipient_is_critical() {
        let mut tx = transfer("100");
        tx.to = "0xbad".to_string();
        let alerts = analyzer().analyze(&ok_simulation(), &tx);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].is_critical());
    }

    #[test]
    fn test_rules_are_additive() {
        // Failed simulation + high value + payload + denylisted recipient.
        let mut tx = transfer("2000000");
        tx.payload = vec![0x01];
        tx.to = "0xbad".to_string();
        let failed = SimulationResult::failed("Insufficient funds");

        let alerts = analyzer().analyze(&failed, &tx);
        assert_eq!(alerts.len(), 4);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let mut tx = transfer("2000000");
        tx.payload = vec![0x01];
        let a = analyzer().analyze(&ok_simulation(), &tx);
        let b = analyzer().analyze(&ok_simulation(), &tx);
        assert_eq!(a, b);
    }

    #[test]
    fn test_breach_sink_fires_only_for_critical() {
        #[derive(Default)]
        struct Recorder(Mutex<Vec<RiskAlert>>);
        impl BreachSink for Recorder {
            fn on_breach(&self, alert: &RiskAlert) {
                self.0.lock().unwrap().push(alert.clone());
            }
        }

        let sink = Recorder::default();

        // High-severity alert only: sink stays quiet.
        let failed = SimulationResult::failed("Insufficient funds");
        let _ = analyzer().analyze_and_report(&failed, &transfer("100"), &sink);
        assert!(sink.0.lock().unwrap().is_empty());

        // Critical alert: sink fires once.
        let mut tx = transfer("100");
        tx.to = "0xbad".to_string();
        let _ = analyzer().analyze_and_report(&ok_simulation(), &tx, &sink);
        let recorded = sink.0.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].is_critical());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = RiskSettings {
            high_value_threshold: "0x100".to_string(),
            deny_recipients: vec!["0xbad".to_string()],
        };
        let config = RiskConfig::from_settings(&settings).unwrap();
        assert_eq!(config.high_value_threshold, U256::from(256u64));
        assert!(config.deny_recipients.contains("0xbad"));

        let broken = RiskSettings {
            high_value_threshold: "lots".to_string(),
            deny_recipients: Vec::new(),
        };
        assert!(RiskConfig::from_settings(&broken).is_err());
    }
}
