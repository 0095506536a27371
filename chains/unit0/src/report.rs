//! Per-account and per-run results returned by the driver.

use crate::monitor::MonitorSummary;
use crate::poller::Settlement;
use core_logic::RESULT_TARGET;
use ethers::types::{Address, TxHash, U256};
use thiserror::Error;
use tracing::info;

/// Why an account produced no transfers. None of these abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("failed to check balance: {0}")]
    BalanceUnavailable(String),

    #[error("insufficient or zero balance ({balance} wei)")]
    InsufficientBalance { balance: U256 },

    #[error("no transfer count: {0}")]
    PromptFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Settled {
        hash: TxHash,
        settlement: Settlement,
        polls: u32,
    },
    SubmissionFailed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStatus {
    Finished,
    Skipped(SkipReason),
}

#[derive(Debug, Clone)]
pub struct AccountReport {
    /// Position in the credential list
    pub index: usize,
    /// `None` when the credential could not be turned into a signer
    pub address: Option<Address>,
    pub status: AccountStatus,
    pub transfers: Vec<TransferOutcome>,
    pub monitor: Option<MonitorSummary>,
}

impl AccountReport {
    pub fn skipped(index: usize, address: Option<Address>, reason: SkipReason) -> Self {
        Self {
            index,
            address,
            status: AccountStatus::Skipped(reason),
            transfers: Vec::new(),
            monitor: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == AccountStatus::Finished
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub accounts: Vec<AccountReport>,
}

impl RunSummary {
    fn settlements(&self) -> impl Iterator<Item = &Settlement> {
        self.accounts
            .iter()
            .flat_map(|a| a.transfers.iter())
            .filter_map(|t| match t {
                TransferOutcome::Settled { settlement, .. } => Some(settlement),
                TransferOutcome::SubmissionFailed { .. } => None,
            })
    }

    pub fn confirmed(&self) -> usize {
        self.settlements()
            .filter(|s| matches!(s, Settlement::Confirmed { .. }))
            .count()
    }

    pub fn reverted(&self) -> usize {
        self.settlements()
            .filter(|s| matches!(s, Settlement::Reverted))
            .count()
    }

    pub fn unknown(&self) -> usize {
        self.settlements()
            .filter(|s| matches!(s, Settlement::Unknown))
            .count()
    }

    pub fn failed_submissions(&self) -> usize {
        self.accounts
            .iter()
            .flat_map(|a| a.transfers.iter())
            .filter(|t| matches!(t, TransferOutcome::SubmissionFailed { .. }))
            .count()
    }

    pub fn finished_accounts(&self) -> usize {
        self.accounts.iter().filter(|a| a.is_finished()).count()
    }

    pub fn skipped_accounts(&self) -> usize {
        self.accounts.len() - self.finished_accounts()
    }

    pub fn log(&self) {
        info!(
            target: RESULT_TARGET,
            "Run complete | Accounts: {} finished, {} skipped | Confirmed: {} | Reverted: {} | Still pending: {} | Failed submissions: {}",
            self.finished_accounts(),
            self.skipped_accounts(),
            self.confirmed(),
            self.reverted(),
            self.unknown(),
            self.failed_submissions()
        );
    }
}
