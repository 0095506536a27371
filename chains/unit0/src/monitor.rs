use crate::ledger::LedgerClient;
use core_logic::{RetryExecutor, RESULT_TARGET};
use ethers::types::{Address, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    BelowThreshold,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Number of balances reported
    pub reports: u32,
    pub last_balance: Option<U256>,
    pub failed_queries: u32,
    pub stop_reason: StopReason,
}

/// Periodically reports an account's balance until it drops below the
/// threshold or the owner cancels it.
///
/// Read-only: it never touches the signer, so it can interleave freely with
/// the account's transfer loop.
pub struct BalanceMonitor {
    ledger: Arc<dyn LedgerClient>,
    account: Address,
    threshold: U256,
    interval: Duration,
    retry: RetryExecutor,
}

impl BalanceMonitor {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        account: Address,
        threshold: U256,
        interval: Duration,
        retry: RetryExecutor,
    ) -> Self {
        Self {
            ledger,
            account,
            threshold,
            interval,
            retry,
        }
    }

    pub fn spawn(self, token: CancellationToken) -> JoinHandle<MonitorSummary> {
        tokio::spawn(self.run(token))
    }

    /// A query in flight is always finished; cancellation is observed before
    /// each query and during the pause between cycles.
    pub async fn run(self, token: CancellationToken) -> MonitorSummary {
        let mut reports = 0;
        let mut last_balance = None;
        let mut failed_queries = 0;
        let account = self.account;
        let ledger = &self.ledger;

        let stop_reason = loop {
            if token.is_cancelled() {
                break StopReason::Cancelled;
            }

            match self
                .retry
                .execute("balance check", || ledger.balance(account))
                .await
            {
                Ok(balance) => {
                    info!(
                        target: RESULT_TARGET,
                        "Current Balance: {} ETH ({:?})",
                        ethers::utils::format_ether(balance),
                        account
                    );
                    reports += 1;
                    last_balance = Some(balance);

                    if balance < self.threshold {
                        warn!(
                            target: RESULT_TARGET,
                            "Insufficient balance for transactions on {:?}.", account
                        );
                        break StopReason::BelowThreshold;
                    }
                }
                Err(e) => {
                    failed_queries += 1;
                    error!("Failed to check balance for {:?}: {:#}", account, e);
                }
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => break StopReason::Cancelled,
                _ = tokio::time::sleep(self.interval) => {}
            }
        };

        MonitorSummary {
            reports,
            last_balance,
            failed_queries,
            stop_reason,
        }
    }
}
