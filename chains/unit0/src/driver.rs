//! Runs the transfer lifecycle for every loaded account.
//!
//! Accounts are processed one after another. For each funded account a
//! [`BalanceMonitor`] runs next to a strictly sequential transfer loop:
//! plan, submit (with retries), wait for propagation, poll for settlement.
//! A failure is contained to the transfer or account it happened in.

use crate::config::Unit0Config;
use crate::ledger::LedgerClient;
use crate::monitor::{BalanceMonitor, MonitorSummary};
use crate::poller::{ConfirmationPoller, Settlement};
use crate::report::{AccountReport, AccountStatus, RunSummary, SkipReason, TransferOutcome};
use crate::transfer::TransferPlanner;
use anyhow::Result;
use core_logic::{CountPrompt, RetryExecutor, SigningKey, RESULT_TARGET};
use ethers::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

pub struct LifecycleDriver {
    ledger: Arc<dyn LedgerClient>,
    prompt: Arc<dyn CountPrompt>,
    planner: TransferPlanner,
    retry: RetryExecutor,
    poller: ConfirmationPoller,
    threshold: U256,
    monitor_interval: Duration,
    propagation_delay: Duration,
    seed: Option<u64>,
}

impl LifecycleDriver {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        prompt: Arc<dyn CountPrompt>,
        config: &Unit0Config,
    ) -> Result<Self> {
        let lifecycle = &config.lifecycle;
        let retry = RetryExecutor::new(config.retry);

        Ok(Self {
            ledger,
            prompt,
            planner: TransferPlanner::from_config(lifecycle, config.chain_id),
            retry,
            poller: ConfirmationPoller::new(
                retry,
                lifecycle.max_polls,
                lifecycle.poll_interval(),
            ),
            threshold: lifecycle.threshold_wei()?,
            monitor_interval: lifecycle.monitor_interval(),
            propagation_delay: lifecycle.propagation_delay(),
            seed: None,
        })
    }

    /// Makes destinations and amounts reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub async fn run(&self, credentials: &[SigningKey]) -> RunSummary {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut summary = RunSummary::default();
        for (index, key) in credentials.iter().enumerate() {
            let span = tracing::info_span!("account", wallet_id = %format!("{:03}", index + 1));
            let report = self
                .process_account(index, key, &mut rng)
                .instrument(span)
                .await;
            summary.accounts.push(report);
        }
        summary
    }

    async fn process_account(
        &self,
        index: usize,
        key: &SigningKey,
        rng: &mut StdRng,
    ) -> AccountReport {
        let wallet = match key.expose().parse::<LocalWallet>() {
            Ok(wallet) => wallet,
            Err(e) => {
                let reason = SkipReason::InvalidCredential(e.to_string());
                error!(
                    target: RESULT_TARGET,
                    "Invalid private key at entry {} ({}). Skipping to next address.", index, reason
                );
                return AccountReport::skipped(index, None, reason);
            }
        };
        let address = wallet.address();

        info!(
            target: RESULT_TARGET,
            "Processing transactions for address: {:?}", address
        );

        let ledger = &self.ledger;
        let balance = match self
            .retry
            .execute("balance check", || ledger.balance(address))
            .await
        {
            Ok(balance) => balance,
            Err(e) => {
                error!(
                    target: RESULT_TARGET,
                    "Failed to check balance for {:?}: {:#}. Skipping to next address.", address, e
                );
                return AccountReport::skipped(
                    index,
                    Some(address),
                    SkipReason::BalanceUnavailable(format!("{:#}", e)),
                );
            }
        };

        if balance < self.threshold {
            warn!(
                target: RESULT_TARGET,
                "Insufficient or zero balance ({} ETH). Skipping to next address.",
                ethers::utils::format_ether(balance)
            );
            return AccountReport::skipped(
                index,
                Some(address),
                SkipReason::InsufficientBalance { balance },
            );
        }

        let token = CancellationToken::new();
        let monitor = BalanceMonitor::new(
            Arc::clone(&self.ledger),
            address,
            self.threshold,
            self.monitor_interval,
            self.retry,
        )
        .spawn(token.child_token());

        let (status, transfers) = match self.ask_count(address).await {
            Ok(count) => (
                AccountStatus::Finished,
                self.send_batch(&wallet, count, rng).await,
            ),
            Err(reason) => {
                error!(
                    target: RESULT_TARGET,
                    "No transfer count for {:?} ({}). Skipping to next address.", address, reason
                );
                (AccountStatus::Skipped(reason), Vec::new())
            }
        };

        token.cancel();
        let monitor = match monitor.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!("Balance monitor for {:?} did not shut down cleanly: {}", address, e);
                None
            }
        };
        log_monitor(address, monitor.as_ref());

        if status == AccountStatus::Finished {
            info!(
                target: RESULT_TARGET,
                "Finished transactions for address: {:?}", address
            );
        }

        AccountReport {
            index,
            address: Some(address),
            status,
            transfers,
            monitor,
        }
    }

    /// The prompt may block on stdin, so it runs off the runtime thread and
    /// the monitor keeps reporting meanwhile.
    async fn ask_count(&self, address: Address) -> Result<u64, SkipReason> {
        let prompt = Arc::clone(&self.prompt);
        let text = format!(
            "Enter the number of transactions you want to send for address {:?}",
            address
        );

        match tokio::task::spawn_blocking(move || prompt.ask_count(&text)).await {
            Ok(Ok(count)) => Ok(count),
            Ok(Err(e)) => Err(SkipReason::PromptFailed(format!("{:#}", e))),
            Err(e) => Err(SkipReason::PromptFailed(e.to_string())),
        }
    }

    async fn send_batch(
        &self,
        wallet: &LocalWallet,
        count: u64,
        rng: &mut StdRng,
    ) -> Vec<TransferOutcome> {
        let mut outcomes = Vec::new();
        for i in 1..=count {
            outcomes.push(self.send_transfer(i, wallet, rng).await);
        }
        outcomes
    }

    async fn send_transfer(
        &self,
        i: u64,
        wallet: &LocalWallet,
        rng: &mut StdRng,
    ) -> TransferOutcome {
        let transfer = match self.planner.plan(wallet.address(), rng) {
            Ok(transfer) => transfer,
            Err(e) => {
                error!(target: RESULT_TARGET, "Failed to build transaction {}: {:#}", i, e);
                return TransferOutcome::SubmissionFailed {
                    reason: format!("{:#}", e),
                };
            }
        };
        info!(
            target: RESULT_TARGET,
            "Generated address {}: {:?}", i, transfer.to
        );

        let ledger = &self.ledger;
        let hash = match self
            .retry
            .execute("send transaction", || ledger.submit(wallet, &transfer))
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                error!(
                    target: RESULT_TARGET,
                    "Failed to send transaction {}: {:#}", i, e
                );
                return TransferOutcome::SubmissionFailed {
                    reason: format!("{:#}", e),
                };
            }
        };

        info!(
            target: RESULT_TARGET,
            "Transaction {}: Hash {:?} | From {:?} | To {:?} | Amount {} ETH | Gas Price {} Gwei",
            i,
            hash,
            transfer.from,
            transfer.to,
            transfer.value_ether(),
            transfer.gas_price_gwei()
        );

        tokio::time::sleep(self.propagation_delay).await;

        let outcome = self.poller.poll(self.ledger.as_ref(), hash).await;
        match outcome.settlement {
            Settlement::Confirmed {
                block_number,
                gas_used,
            } => info!(
                target: RESULT_TARGET,
                "Transaction {} Success! Block Number: {} | Gas Used: {}", i, block_number, gas_used
            ),
            Settlement::Reverted => error!(
                target: RESULT_TARGET,
                "Transaction {} FAILED (reverted): {:?}", i, hash
            ),
            Settlement::Unknown => warn!(
                target: RESULT_TARGET,
                "Transaction {} is still pending after {} polls: {:?}", i, outcome.attempts, hash
            ),
        }

        TransferOutcome::Settled {
            hash,
            settlement: outcome.settlement,
            polls: outcome.attempts,
        }
    }
}

fn log_monitor(address: Address, summary: Option<&MonitorSummary>) {
    if let Some(summary) = summary {
        info!(
            "Balance monitor for {:?} stopped ({:?}) after {} reports, {} failed queries",
            address,
            summary.stop_reason,
            summary.reports,
            summary.failed_queries
        );
    }
}
