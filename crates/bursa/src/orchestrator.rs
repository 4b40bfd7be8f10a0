//! The wallet orchestrator: the state machine that sequences custody, gas
//! routing, simulation, risk analysis, signing, and broadcast into the
//! end-to-end transfer flow.
//!
//! # State machine
//!
//! `Idle -> Loading -> { Loaded(balance) | Error(message) }`
//!
//! Preparation and confirmation form a single linear pipeline: prepare must
//! always precede confirm, each prepare invalidates the previous pending
//! context, and confirm re-checks the caller's intent against the exact
//! prepared [`Transaction`] before anything touches the signer or the
//! chain.
//!
//! # Concurrency
//!
//! Observable state lives behind one async mutex and is committed
//! atomically at suspension boundaries. Every mutating operation takes a
//! monotonically increasing issue number at entry; a commit applies only
//! when no newer operation has already committed, so an in-flight result
//! that arrives late cannot clobber state written by a newer request
//! (last-writer-by-issue-order, not by completion order).
//!
//! Sign-plus-broadcast runs on a spawned task: dropping the caller's future
//! abandons nothing mid-signature. Nothing here retries; retry policy
//! belongs to the chain provider.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use bursa_chain::{ChainProvider, ChainRegistry, GasRouter, SimulationEngine};
use bursa_core::{
    AppState, HistoryEntry, RecoveryError, RiskAlert, SimulationResult, Transaction, WalletError,
};
use bursa_crypto::{KeyCustody, TransactionSigner};
use bursa_recovery::{RecoveryShare, RecoveryStrategy};
use bursa_risk::{BreachSink, RiskAnalyzer, RiskConfig};

use crate::audit::{AuditEvent, AuditLogger};

// ============================================================================
// Observable state
// ============================================================================

/// A consistent snapshot of everything a consumer can observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSnapshot {
    /// Current top-level state.
    pub app: AppState,
    /// Active account address, when loaded.
    pub address: Option<String>,
    /// Transaction history of the active account.
    pub history: Vec<HistoryEntry>,
    /// Result of the most recent preparation.
    pub last_simulation: Option<SimulationResult>,
    /// Alerts from the most recent preparation.
    pub alerts: Vec<RiskAlert>,
    /// Network hash of the last broadcast transaction.
    pub last_broadcast: Option<String>,
}

/// What `prepare_transaction` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareOutcome {
    /// The dry-run verdict.
    pub simulation: SimulationResult,
    /// Advisory findings about the transfer.
    pub alerts: Vec<RiskAlert>,
}

/// The exact prepared transaction held between prepare and confirm.
#[derive(Debug, Clone)]
struct PendingTransfer {
    tx: Transaction,
    simulation: SimulationResult,
}

#[derive(Debug)]
struct WalletState {
    app: AppState,
    address: Option<String>,
    history: Vec<HistoryEntry>,
    last_simulation: Option<SimulationResult>,
    alerts: Vec<RiskAlert>,
    pending: Option<PendingTransfer>,
    last_broadcast: Option<String>,
    applied_issue: u64,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            app: AppState::Idle,
            address: None,
            history: Vec::new(),
            last_simulation: None,
            alerts: Vec::new(),
            pending: None,
            last_broadcast: None,
            applied_issue: 0,
        }
    }
}

// ============================================================================
// WalletService
// ============================================================================

struct Inner<P, K, R> {
    provider: Arc<P>,
    signer: TransactionSigner<K>,
    gas_router: GasRouter,
    simulator: SimulationEngine<P>,
    analyzer: RiskAnalyzer,
    breach_sink: Arc<dyn BreachSink>,
    audit: Option<Arc<AuditLogger>>,
    recovery: R,
    default_chain: String,
    state: Mutex<WalletState>,
    issue: AtomicU64,
}

/// The wallet orchestrator.
///
/// Cheap to clone (`Arc` internally); every clone observes and mutates the
/// same wallet state. All collaborators are injected at construction time -
/// there is no ambient global lookup - so providers, custody backends, and
/// recovery strategies can be swapped without touching this type.
pub struct WalletService<P, K, R> {
    inner: Arc<Inner<P, K, R>>,
}

impl<P, K, R> Clone for WalletService<P, K, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, K, R> std::fmt::Debug for WalletService<P, K, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletService")
            .field("default_chain", &self.inner.default_chain)
            .finish_non_exhaustive()
    }
}

impl<P, K, R> WalletService<P, K, R>
where
    P: ChainProvider + Send + Sync + 'static,
    K: KeyCustody + 'static,
    R: RecoveryStrategy + 'static,
{
    /// Wire up the orchestrator from its collaborators.
    ///
    /// `audit`, when present, receives signing and broadcast events; the
    /// breach sink covers critical risk alerts either way.
    #[must_use]
    pub fn new(
        provider: Arc<P>,
        custody: Arc<K>,
        recovery: R,
        registry: ChainRegistry,
        risk: RiskConfig,
        breach_sink: Arc<dyn BreachSink>,
        audit: Option<Arc<AuditLogger>>,
        default_chain: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                signer: TransactionSigner::new(custody, registry.clone()),
                gas_router: GasRouter::new(registry.clone()),
                simulator: SimulationEngine::new(Arc::clone(&provider), registry),
                analyzer: RiskAnalyzer::new(risk),
                breach_sink,
                audit,
                provider,
                recovery,
                default_chain: default_chain.into(),
                state: Mutex::new(WalletState::default()),
                issue: AtomicU64::new(0),
            }),
        }
    }

    /// Record an audit event when a logger is configured.
    ///
    /// Audit failures are logged and swallowed: an unwritable audit file
    /// must not break the transfer flow mid-signature.
    fn audit(&self, event: AuditEvent) {
        if let Some(audit) = &self.inner.audit {
            if let Err(err) = audit.log(event) {
                warn!(%err, "failed to write audit entry");
            }
        }
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    /// A consistent snapshot of the observable state.
    pub async fn snapshot(&self) -> WalletSnapshot {
        let state = self.inner.state.lock().await;
        WalletSnapshot {
            app: state.app.clone(),
            address: state.address.clone(),
            history: state.history.clone(),
            last_simulation: state.last_simulation.clone(),
            alerts: state.alerts.clone(),
            last_broadcast: state.last_broadcast.clone(),
        }
    }

    /// Current top-level state.
    pub async fn app_state(&self) -> AppState {
        self.inner.state.lock().await.app.clone()
    }

    // ------------------------------------------------------------------------
    // Account loading
    // ------------------------------------------------------------------------

    /// Load an account: set the active address and fetch balance + history.
    ///
    /// Transitions `Loading -> Loaded` on success, `Loading -> Error` on
    /// failure. Any pending transfer context from a previous account is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`WalletError`]; the same failure is mirrored
    /// into [`AppState::Error`] with a sanitized message.
    pub async fn load_account(&self, address: &str) -> Result<(), WalletError> {
        let issue = self.next_issue();
        debug!(issue, address, "load_account");

        self.commit(issue, |state| {
            state.address = Some(address.to_string());
            state.app = AppState::Loading;
            state.pending = None;
            state.last_simulation = None;
            state.alerts.clear();
        })
        .await;

        self.fetch_and_commit(issue, address).await
    }

    /// Re-fetch balance and history for the active account.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::NoActiveAccount`] when no account is loaded,
    /// otherwise as [`Self::load_account`].
    pub async fn refresh_balance(&self) -> Result<(), WalletError> {
        let address = self
            .active_address()
            .await
            .ok_or(WalletError::NoActiveAccount)?;

        let issue = self.next_issue();
        debug!(issue, "refresh_balance");
        self.commit(issue, |state| state.app = AppState::Loading).await;
        self.fetch_and_commit(issue, &address).await
    }

    // ------------------------------------------------------------------------
    // Transfer pipeline
    // ------------------------------------------------------------------------

    /// Prepare a transfer: estimate gas, simulate, analyze risk, and store
    /// the exact prepared transaction as the pending-confirmation context.
    ///
    /// The top-level [`AppState`] is untouched on success; failures set
    /// [`AppState::Error`]. Each call replaces any previous pending
    /// context - stale simulations are never reused across differing
    /// intents.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`WalletError`] (also mirrored into the
    /// error state).
    pub async fn prepare_transaction(
        &self,
        to: &str,
        value: &str,
    ) -> Result<PrepareOutcome, WalletError> {
        let issue = self.next_issue();
        debug!(issue, to, value, "prepare_transaction");

        let Some(from) = self.active_address().await else {
            return self.fail(issue, WalletError::NoActiveAccount).await;
        };
        let nonce = self.next_nonce(&from).await;
        let chain = self.inner.default_chain.clone();

        let estimate = match self.inner.gas_router.estimate(to, value, &[], &chain) {
            Ok(estimate) => estimate,
            Err(err) => return self.fail(issue, err.into()).await,
        };

        // The prepared transaction is immutable from here on; confirm will
        // sign exactly these fields or nothing.
        let tx = Transaction {
            chain,
            from,
            to: to.to_string(),
            value: value.to_string(),
            payload: Vec::new(),
            nonce,
            gas_limit: estimate.gas_limit,
            max_fee_per_gas: estimate.max_fee_per_gas,
            max_priority_fee_per_gas: estimate.max_priority_fee_per_gas,
        };

        let simulation = match self.inner.simulator.simulate(&tx).await {
            Ok(simulation) => simulation,
            Err(err) => return self.fail(issue, err.into()).await,
        };
        let alerts =
            self.inner
                .analyzer
                .analyze_and_report(&simulation, &tx, self.inner.breach_sink.as_ref());

        info!(
            success = simulation.success,
            alerts = alerts.len(),
            "transfer prepared"
        );
        self.commit(issue, {
            let simulation = simulation.clone();
            let alerts = alerts.clone();
            move |state| {
                state.last_simulation = Some(simulation.clone());
                state.alerts = alerts;
                state.pending = Some(PendingTransfer { tx, simulation });
            }
        })
        .await;

        Ok(PrepareOutcome { simulation, alerts })
    }

    /// Confirm the prepared transfer: sign, broadcast, and refresh.
    ///
    /// Requires a pending context whose simulation succeeded and whose
    /// `to`/`value` match the arguments; otherwise fails immediately
    /// without contacting the signer or the chain. The pending context is
    /// consumed either way once signing begins.
    ///
    /// Signing and broadcast run on a spawned task, so an impatient caller
    /// dropping this future cannot abandon a signature halfway.
    ///
    /// # Errors
    ///
    /// - [`WalletError::ConfirmWithoutPrepare`] when the precondition fails
    /// - signing/broadcast failures, also mirrored into the error state
    pub async fn confirm_transaction(&self, to: &str, value: &str) -> Result<String, WalletError> {
        let issue = self.next_issue();
        debug!(issue, to, value, "confirm_transaction");

        let pending = {
            let mut state = self.inner.state.lock().await;
            match state.pending.take() {
                // Single-shot: a failed confirm requires a fresh prepare.
                Some(pending)
                    if pending.simulation.success && pending.tx.intent_matches(to, value) =>
                {
                    pending
                }
                other => {
                    // Leave a non-matching context in place; the original
                    // intent can still be confirmed.
                    state.pending = other;
                    return Err(WalletError::ConfirmWithoutPrepare);
                }
            }
        };

        let service = self.clone();
        let handle =
            tokio::spawn(async move { service.sign_and_broadcast(issue, pending.tx).await });
        handle.await.unwrap_or_else(|join_err| {
            Err(bursa_core::SignError::signature_failed(format!(
                "signing task aborted: {join_err}"
            ))
            .into())
        })
    }

    /// The tail of a confirmed transfer. Runs on its own task.
    async fn sign_and_broadcast(&self, issue: u64, tx: Transaction) -> Result<String, WalletError> {
        let key_id = tx.from.clone();
        let signed = match self.inner.signer.sign_transaction(&tx, &key_id) {
            Ok(signed) => signed,
            Err(err) => return self.fail(issue, err.into()).await,
        };
        self.audit(AuditEvent::TransactionSigned {
            chain: signed.chain.clone(),
            tx_hash: signed.hash.clone(),
            recipient: tx.to.clone(),
            value: tx.value.clone(),
        });

        let network_hash = match self
            .inner
            .provider
            .broadcast(&signed.raw, &signed.chain)
            .await
        {
            Ok(hash) => hash,
            Err(err) => return self.fail(issue, err.into()).await,
        };
        info!(hash = %network_hash, chain = %signed.chain, "transaction broadcast");
        self.audit(AuditEvent::TransactionBroadcast {
            chain: signed.chain.clone(),
            tx_hash: signed.hash.clone(),
            network_hash: network_hash.clone(),
        });

        self.commit(issue, {
            let network_hash = network_hash.clone();
            move |state| state.last_broadcast = Some(network_hash)
        })
        .await;

        // Post-broadcast refresh mirrors load_account. The broadcast itself
        // succeeded; a refresh failure leaves the error state for observers
        // but does not fail the confirm.
        let refresh_issue = self.next_issue();
        self.commit(refresh_issue, |state| state.app = AppState::Loading)
            .await;
        if let Err(err) = self.fetch_and_commit(refresh_issue, &tx.from).await {
            warn!(%err, "post-broadcast balance refresh failed");
        }

        Ok(network_hash)
    }

    // ------------------------------------------------------------------------
    // Recovery commands (independent of the transfer path)
    // ------------------------------------------------------------------------

    /// Split a secret into recovery shares.
    ///
    /// # Errors
    ///
    /// Propagates [`RecoveryError`] from the strategy.
    ///
    /// [`RecoveryError`]: bursa_core::RecoveryError
    pub fn generate_shares(
        &self,
        secret: &str,
        total: u32,
        threshold: u32,
    ) -> Result<Vec<RecoveryShare>, WalletError> {
        Ok(self
            .inner
            .recovery
            .split(secret.as_bytes(), total, threshold)?)
    }

    /// Reconstruct a secret from a complete share set.
    ///
    /// # Errors
    ///
    /// Propagates [`RecoveryError`] from the strategy;
    /// [`RecoveryError::ReconstructionFailed`] when the recovered bytes are
    /// not valid UTF-8.
    ///
    /// [`RecoveryError`]: bursa_core::RecoveryError
    /// [`RecoveryError::ReconstructionFailed`]: bursa_core::RecoveryError::ReconstructionFailed
    pub fn reconstruct_secret(&self, shares: &[RecoveryShare]) -> Result<String, WalletError> {
        let bytes = self.inner.recovery.reconstruct(shares)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            RecoveryError::reconstruction_failed("recovered bytes are not valid UTF-8").into()
        })
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn next_issue(&self) -> u64 {
        self.inner.issue.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a mutation unless a newer operation has already committed.
    ///
    /// Returns `true` when the mutation was applied.
    async fn commit<F>(&self, issue: u64, mutate: F) -> bool
    where
        F: FnOnce(&mut WalletState),
    {
        let mut state = self.inner.state.lock().await;
        if issue < state.applied_issue {
            debug!(issue, applied = state.applied_issue, "stale commit dropped");
            return false;
        }
        state.applied_issue = issue;
        mutate(&mut state);
        true
    }

    /// Record a failure: sanitized message into the error state, full error
    /// back to the caller.
    async fn fail<T>(&self, issue: u64, err: WalletError) -> Result<T, WalletError> {
        warn!(%err, "wallet operation failed");
        self.commit(issue, |state| {
            state.app = AppState::Error {
                message: err.user_message(),
            };
        })
        .await;
        Err(err)
    }

    async fn active_address(&self) -> Option<String> {
        self.inner.state.lock().await.address.clone()
    }

    /// Next nonce for `address`, derived from loaded history.
    ///
    /// The provider interface has no nonce endpoint, so the count of
    /// outgoing transactions stands in for it. A production provider would
    /// expose a chain-side nonce query.
    async fn next_nonce(&self, address: &str) -> u64 {
        let state = self.inner.state.lock().await;
        state.history.iter().filter(|h| h.from == address).count() as u64
    }

    /// Fetch balance and history, then commit `Loaded` (or `Error`).
    async fn fetch_and_commit(&self, issue: u64, address: &str) -> Result<(), WalletError> {
        let chain = &self.inner.default_chain;
        let fetched = async {
            let balance = self.inner.provider.fetch_balance(address, chain).await?;
            let history = self.inner.provider.fetch_history(address, chain).await?;
            Ok::<_, WalletError>((balance, history))
        }
        .await;

        match fetched {
            Ok((balance, history)) => {
                let applied = self
                    .commit(issue, move |state| {
                        state.app = AppState::Loaded { balance };
                        state.history = history;
                    })
                    .await;
                if !applied {
                    debug!(issue, "fetch result superseded by newer operation");
                }
                Ok(())
            }
            Err(err) => self.fail(issue, err).await,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use bursa_chain::StaticProvider;
    use bursa_core::Balance;
    use bursa_crypto::{AlwaysAllowGate, FileKeyCustody, SecretKey};
    use bursa_recovery::XorSecretSharing;
    use bursa_risk::TracingBreachSink;
    use tempfile::TempDir;

    type Service =
        WalletService<StaticProvider, FileKeyCustody<AlwaysAllowGate>, XorSecretSharing>;

    fn eth_balance(amount: &str) -> Balance {
        Balance {
            amount: amount.to_string(),
            currency: "ETH".to_string(),
            decimals: 18,
        }
    }

    fn service() -> (Service, Arc<StaticProvider>, TempDir) {
        let provider = Arc::new(StaticProvider::new());
        let dir = TempDir::new().unwrap();
        let custody = Arc::new(
            FileKeyCustody::new(dir.path().to_path_buf(), AlwaysAllowGate, "unlock").unwrap(),
        );
        custody.store("0xaaa", &SecretKey::new([0x42u8; 32])).unwrap();

        let service = WalletService::new(
            Arc::clone(&provider),
            custody,
            XorSecretSharing::new(),
            ChainRegistry::new(),
            RiskConfig::default(),
            Arc::new(TracingBreachSink),
            None,
            "ethereum",
        );
        (service, provider, dir)
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let (service, _provider, _dir) = service();
        assert_eq!(service.app_state().await, AppState::Idle);
        assert!(service.snapshot().await.address.is_none());
    }

    #[tokio::test]
    async fn test_load_account_reaches_loaded() {
        let (service, provider, _dir) = service();
        provider.set_balance("0xaaa", "ethereum", eth_balance("1000"));

        service.load_account("0xaaa").await.unwrap();

        let snapshot = service.snapshot().await;
        assert_eq!(
            snapshot.app,
            AppState::Loaded {
                balance: eth_balance("1000")
            }
        );
        assert_eq!(snapshot.address.as_deref(), Some("0xaaa"));
    }

    #[tokio::test]
    async fn test_load_account_failure_reaches_error() {
        let (service, _provider, _dir) = service();

        let err = service.load_account("0xaaa").await.unwrap_err();
        assert!(matches!(err, WalletError::Chain(_)));

        let app = service.app_state().await;
        assert!(app.is_error());
        // Error text is sanitized, not the raw provider message.
        if let AppState::Error { message } = app {
            assert!(!message.contains("no account state"));
        }
    }

    #[tokio::test]
    async fn test_refresh_without_account_is_rejected() {
        let (service, _provider, _dir) = service();
        let err = service.refresh_balance().await.unwrap_err();
        assert!(matches!(err, WalletError::NoActiveAccount));
    }

    #[tokio::test]
    async fn test_prepare_requires_account() {
        let (service, _provider, _dir) = service();
        let err = service.prepare_transaction("0xbbb", "1").await.unwrap_err();
        assert!(matches!(err, WalletError::NoActiveAccount));
    }

    #[tokio::test]
    async fn test_confirm_without_prepare_fails_without_side_effects() {
        let (service, provider, _dir) = service();
        provider.set_balance("0xaaa", "ethereum", eth_balance("0x100000000000000"));
        service.load_account("0xaaa").await.unwrap();

        let err = service.confirm_transaction("0xbbb", "0x100").await.unwrap_err();
        assert!(matches!(err, WalletError::ConfirmWithoutPrepare));
        assert_eq!(
            err.to_string(),
            "Cannot confirm: Simulation failed or not run"
        );
        assert!(provider.broadcasts().is_empty());
        // The precondition failure does not poison the loaded state.
        assert!(service.app_state().await.is_loaded());
    }

    #[tokio::test]
    async fn test_prepare_then_confirm_happy_path() {
        let (service, provider, _dir) = service();
        provider.set_balance("0xaaa", "ethereum", eth_balance("0x10000000000000000"));
        service.load_account("0xaaa").await.unwrap();

        let outcome = service.prepare_transaction("0xbbb", "0x100").await.unwrap();
        assert!(outcome.simulation.success);
        assert_eq!(outcome.simulation.gas_used, 21_000);

        let hash = service.confirm_transaction("0xbbb", "0x100").await.unwrap();
        assert!(hash.starts_with("0x"));
        assert_eq!(provider.broadcasts().len(), 1);

        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.last_broadcast, Some(hash));
        assert!(snapshot.app.is_loaded());
    }

    #[tokio::test]
    async fn test_prepare_does_not_change_loaded_state() {
        let (service, provider, _dir) = service();
        provider.set_balance("0xaaa", "ethereum", eth_balance("0x10000000000000000"));
        service.load_account("0xaaa").await.unwrap();

        service.prepare_transaction("0xbbb", "0x100").await.unwrap();
        assert!(service.app_state().await.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_simulation_blocks_confirm() {
        let (service, provider, _dir) = service();
        provider.set_balance("0xaaa", "ethereum", eth_balance("0x0"));
        service.load_account("0xaaa").await.unwrap();

        let outcome = service.prepare_transaction("0xbbb", "1").await.unwrap();
        assert!(!outcome.simulation.success);
        assert_eq!(outcome.simulation.error.as_deref(), Some("Insufficient funds"));

        let err = service.confirm_transaction("0xbbb", "1").await.unwrap_err();
        assert!(matches!(err, WalletError::ConfirmWithoutPrepare));
        assert!(provider.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_rejects_changed_intent() {
        let (service, provider, _dir) = service();
        provider.set_balance("0xaaa", "ethereum", eth_balance("0x10000000000000000"));
        service.load_account("0xaaa").await.unwrap();
        service.prepare_transaction("0xbbb", "0x100").await.unwrap();

        // Different recipient, then different value.
        let err = service.confirm_transaction("0xccc", "0x100").await.unwrap_err();
        assert!(matches!(err, WalletError::ConfirmWithoutPrepare));
        let err = service.confirm_transaction("0xbbb", "0x101").await.unwrap_err();
        assert!(matches!(err, WalletError::ConfirmWithoutPrepare));

        // The matching intent still confirms; value may use either radix.
        service.confirm_transaction("0xbbb", "256").await.unwrap();
        assert_eq!(provider.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_consumes_the_pending_context() {
        let (service, provider, _dir) = service();
        provider.set_balance("0xaaa", "ethereum", eth_balance("0x10000000000000000"));
        service.load_account("0xaaa").await.unwrap();
        service.prepare_transaction("0xbbb", "0x100").await.unwrap();

        service.confirm_transaction("0xbbb", "0x100").await.unwrap();
        let err = service.confirm_transaction("0xbbb", "0x100").await.unwrap_err();
        assert!(matches!(err, WalletError::ConfirmWithoutPrepare));
        assert_eq!(provider.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn test_each_prepare_replaces_the_pending_context() {
        let (service, provider, _dir) = service();
        provider.set_balance("0xaaa", "ethereum", eth_balance("0x10000000000000000"));
        service.load_account("0xaaa").await.unwrap();

        service.prepare_transaction("0xbbb", "0x100").await.unwrap();
        service.prepare_transaction("0xccc", "0x200").await.unwrap();

        // The first intent is gone; only the latest can confirm.
        let err = service.confirm_transaction("0xbbb", "0x100").await.unwrap_err();
        assert!(matches!(err, WalletError::ConfirmWithoutPrepare));
        service.confirm_transaction("0xccc", "0x200").await.unwrap();
    }

    #[tokio::test]
    async fn test_recovery_round_trip_through_service() {
        let (service, _provider, _dir) = service();

        let shares = service.generate_shares("my secret", 3, 3).unwrap();
        assert_eq!(shares.len(), 3);

        let recovered = service.reconstruct_secret(&shares).unwrap();
        assert_eq!(recovered, "my secret");

        // Two of three reveal nothing and do not reconstruct.
        assert!(service.reconstruct_secret(&shares[..2]).is_err());
    }

    #[tokio::test]
    async fn test_recovery_rejects_threshold_mismatch() {
        let (service, _provider, _dir) = service();
        let err = service.generate_shares("seed", 3, 2).unwrap_err();
        assert!(matches!(
            err,
            WalletError::Recovery(RecoveryError::InvalidThreshold { .. })
        ));
    }

    #[tokio::test]
    async fn test_nonce_counts_outgoing_history() {
        let (service, provider, _dir) = service();
        provider.set_balance("0xaaa", "ethereum", eth_balance("0x10000000000000000"));
        provider.set_history(
            "0xaaa",
            "ethereum",
            vec![
                HistoryEntry {
                    hash: "0x01".to_string(),
                    from: "0xaaa".to_string(),
                    to: "0xbbb".to_string(),
                    value: "1".to_string(),
                    timestamp: chrono::Utc::now(),
                },
                HistoryEntry {
                    hash: "0x02".to_string(),
                    from: "0xother".to_string(),
                    to: "0xaaa".to_string(),
                    value: "2".to_string(),
                    timestamp: chrono::Utc::now(),
                },
            ],
        );
        service.load_account("0xaaa").await.unwrap();

        service.prepare_transaction("0xbbb", "1").await.unwrap();
        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.history.len(), 2);
        // Only the outgoing entry counts toward the nonce; verified via the
        // signed payload in the integration suite.
    }
}
