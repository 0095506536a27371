#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use core_logic::{RetryConfig, SigningKey};
use ethers::prelude::*;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use unit0_sender::config::Unit0Config;
use unit0_sender::ledger::{LedgerClient, ReceiptSummary};
use unit0_sender::transfer::Transfer;

pub const KEY_A: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const KEY_B: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
/// Valid hex but not a valid secp256k1 scalar
pub const KEY_ZERO: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub fn key(raw: &str) -> SigningKey {
    SigningKey::parse(raw, 0).unwrap()
}

pub fn ether(amount: f64) -> U256 {
    ethers::utils::parse_ether(amount).unwrap()
}

pub fn receipt(success: bool) -> ReceiptSummary {
    ReceiptSummary {
        success,
        block_number: 4242,
        gas_used: U256::from(21_000u64),
    }
}

/// Every delay zeroed, monitor ticking every few milliseconds.
pub fn fast_config() -> Unit0Config {
    let mut config = Unit0Config::default();
    config.retry = RetryConfig::new(5, 0);
    config.lifecycle.monitor_interval_ms = 5;
    config.lifecycle.propagation_delay_ms = 0;
    config.lifecycle.poll_interval_ms = 0;
    config
}

/// Ledger fake answering from scripted queues. An empty queue falls back to
/// the default answer.
pub struct ScriptedLedger {
    balances: Mutex<VecDeque<Result<U256, String>>>,
    default_balance: U256,
    submissions: Mutex<VecDeque<Result<TxHash, String>>>,
    receipts: Mutex<VecDeque<Result<Option<ReceiptSummary>, String>>>,
    default_receipt: Option<ReceiptSummary>,
    pub balance_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    pub submitted: Mutex<Vec<Transfer>>,
}

impl ScriptedLedger {
    pub fn new(default_balance: U256) -> Self {
        Self {
            balances: Mutex::new(VecDeque::new()),
            default_balance,
            submissions: Mutex::new(VecDeque::new()),
            receipts: Mutex::new(VecDeque::new()),
            default_receipt: None,
            balance_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn with_balances(self, balances: Vec<Result<U256, String>>) -> Self {
        *self.balances.lock().unwrap() = balances.into();
        self
    }

    pub fn with_submissions(self, submissions: Vec<Result<TxHash, String>>) -> Self {
        *self.submissions.lock().unwrap() = submissions.into();
        self
    }

    pub fn with_receipts(self, receipts: Vec<Result<Option<ReceiptSummary>, String>>) -> Self {
        *self.receipts.lock().unwrap() = receipts.into();
        self
    }

    pub fn with_default_receipt(mut self, receipt: Option<ReceiptSummary>) -> Self {
        self.default_receipt = receipt;
        self
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn balance(&self, _account: Address) -> Result<U256> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.balances.lock().unwrap().pop_front();
        match next {
            Some(Ok(balance)) => Ok(balance),
            Some(Err(msg)) => Err(anyhow!(msg)),
            None => Ok(self.default_balance),
        }
    }

    async fn submit(&self, _signer: &LocalWallet, transfer: &Transfer) -> Result<TxHash> {
        let call = self.submit_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.submitted.lock().unwrap().push(transfer.clone());
        let next = self.submissions.lock().unwrap().pop_front();
        match next {
            Some(Ok(hash)) => Ok(hash),
            Some(Err(msg)) => Err(anyhow!(msg)),
            None => Ok(TxHash::from_low_u64_be(call as u64)),
        }
    }

    async fn receipt(&self, _hash: TxHash) -> Result<Option<ReceiptSummary>> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.receipts.lock().unwrap().pop_front();
        match next {
            Some(Ok(receipt)) => Ok(receipt),
            Some(Err(msg)) => Err(anyhow!(msg)),
            None => Ok(self.default_receipt),
        }
    }
}

/// In-memory sink for log lines emitted on the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Routes this thread's events into the capture until the guard drops.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(level))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
