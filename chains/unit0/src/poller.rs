//! Settlement polling for a submitted transfer.
//!
//! The poller asks for the receipt a bounded number of times. Running out of
//! attempts yields [`Settlement::Unknown`], which is an expected outcome on a
//! slow testnet and never an error.

use crate::ledger::{LedgerClient, ReceiptSummary};
use core_logic::RetryExecutor;
use ethers::types::{TxHash, U256};
use std::time::Duration;
use tracing::warn;

/// Terminal outcome of a submitted transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Confirmed { block_number: u64, gas_used: U256 },
    Reverted,
    /// Still pending after the last poll
    Unknown,
}

/// What one poll attempt saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Receipt(ReceiptSummary),
    NoReceipt,
    QueryFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Settled(Settlement),
}

impl PollState {
    /// Applies attempt number `attempt` (1-based) out of `max_polls`.
    /// Settled states never change.
    pub fn advance(self, observation: Observation, attempt: u32, max_polls: u32) -> PollState {
        if let PollState::Settled(_) = self {
            return self;
        }

        match observation {
            Observation::Receipt(receipt) if receipt.success => {
                PollState::Settled(Settlement::Confirmed {
                    block_number: receipt.block_number,
                    gas_used: receipt.gas_used,
                })
            }
            Observation::Receipt(_) => PollState::Settled(Settlement::Reverted),
            Observation::NoReceipt | Observation::QueryFailed if attempt >= max_polls => {
                PollState::Settled(Settlement::Unknown)
            }
            Observation::NoReceipt | Observation::QueryFailed => PollState::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub settlement: Settlement,
    /// Poll attempts used, between 1 and `max_polls`
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct ConfirmationPoller {
    retry: RetryExecutor,
    max_polls: u32,
    interval: Duration,
}

impl ConfirmationPoller {
    pub fn new(retry: RetryExecutor, max_polls: u32, interval: Duration) -> Self {
        Self {
            retry,
            max_polls: max_polls.max(1),
            interval,
        }
    }

    pub async fn poll(&self, ledger: &dyn LedgerClient, hash: TxHash) -> PollOutcome {
        let mut state = PollState::Pending;
        let mut attempt = 0;

        while let PollState::Pending = state {
            attempt += 1;

            let observation = match self
                .retry
                .execute("receipt check", || ledger.receipt(hash))
                .await
            {
                Ok(Some(receipt)) => Observation::Receipt(receipt),
                Ok(None) => Observation::NoReceipt,
                Err(e) => {
                    warn!(
                        "Error checking transaction status for {:?} (poll {}/{}): {:#}",
                        hash, attempt, self.max_polls, e
                    );
                    Observation::QueryFailed
                }
            };

            state = state.advance(observation, attempt, self.max_polls);

            if state == PollState::Pending {
                tokio::time::sleep(self.interval).await;
            }
        }

        let settlement = match state {
            PollState::Settled(settlement) => settlement,
            PollState::Pending => Settlement::Unknown,
        };

        PollOutcome {
            settlement,
            attempts: attempt,
        }
    }
}
