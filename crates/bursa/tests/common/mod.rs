//! Shared fixtures for the wallet flow tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use bursa_chain::ChainProvider;
use bursa_core::{Balance, ChainError, CustodyError, HistoryEntry};
use bursa_crypto::AuthorizationGate;

/// Build an 18-decimal ETH balance.
pub fn eth_balance(amount: &str) -> Balance {
    Balance {
        amount: amount.to_string(),
        currency: "ETH".to_string(),
        decimals: 18,
    }
}

/// One scripted balance response.
pub struct ScriptedBalance {
    pub balance: Balance,
    /// Signalled when the provider starts serving this response.
    pub entered: Option<Arc<Notify>>,
    /// Awaited before the response is returned, to force interleavings.
    pub hold: Option<Arc<Notify>>,
}

impl ScriptedBalance {
    pub fn immediate(balance: Balance) -> Self {
        Self {
            balance,
            entered: None,
            hold: None,
        }
    }

    pub fn held(balance: Balance, entered: Arc<Notify>, hold: Arc<Notify>) -> Self {
        Self {
            balance,
            entered: Some(entered),
            hold: Some(hold),
        }
    }
}

/// Provider that serves a scripted sequence of balance responses, with
/// optional barriers to orchestrate interleavings deterministically.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ScriptedBalance>>,
    broadcasts: Mutex<Vec<Vec<u8>>>,
    history: Mutex<Vec<HistoryEntry>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: ScriptedBalance) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn set_history(&self, entries: Vec<HistoryEntry>) {
        *self.history.lock().unwrap() = entries;
    }

    pub fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.broadcasts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainProvider for ScriptedProvider {
    async fn fetch_balance(&self, _address: &str, _chain: &str) -> Result<Balance, ChainError> {
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChainError::rpc("scripted responses exhausted"))?;

        if let Some(entered) = &response.entered {
            entered.notify_one();
        }
        if let Some(hold) = &response.hold {
            hold.notified().await;
        }
        Ok(response.balance)
    }

    async fn fetch_history(
        &self,
        _address: &str,
        _chain: &str,
    ) -> Result<Vec<HistoryEntry>, ChainError> {
        Ok(self.history.lock().unwrap().clone())
    }

    async fn broadcast(&self, raw: &[u8], _chain: &str) -> Result<String, ChainError> {
        self.broadcasts.lock().unwrap().push(raw.to_vec());
        Ok(format!("0x{:064x}", self.broadcasts.lock().unwrap().len()))
    }
}

/// Gate with a switchable verdict.
#[derive(Default)]
pub struct SwitchableGate {
    pub deny: std::sync::atomic::AtomicBool,
}

impl AuthorizationGate for SwitchableGate {
    fn authorize(&self, _key_id: &str) -> Result<(), CustodyError> {
        if self.deny.load(std::sync::atomic::Ordering::SeqCst) {
            Err(CustodyError::authorization_failed("user rejected the prompt"))
        } else {
            Ok(())
        }
    }

    fn requires_user_presence(&self) -> bool {
        true
    }
}

/// Walk the canonical encoding and return the nth length-prefixed field.
///
/// Field order: chain, from, to, value, payload, nonce, gas_limit,
/// max_fee_per_gas, max_priority_fee_per_gas.
pub fn canonical_field(raw: &[u8], n: usize) -> Vec<u8> {
    let mut offset = 1; // skip the version byte
    for index in 0.. {
        let len = u32::from_be_bytes(raw[offset..offset + 4].try_into().unwrap()) as usize;
        offset += 4;
        if index == n {
            return raw[offset..offset + len].to_vec();
        }
        offset += len;
    }
    unreachable!("field {n} out of range");
}
