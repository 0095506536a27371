mod common;

use common::{receipt, ScriptedLedger};
use core_logic::{RetryConfig, RetryExecutor};
use ethers::types::{TxHash, U256};
use std::time::Duration;
use unit0_sender::poller::{ConfirmationPoller, Settlement};

fn poller(max_polls: u32, retry: RetryConfig) -> ConfirmationPoller {
    ConfirmationPoller::new(RetryExecutor::new(retry), max_polls, Duration::ZERO)
}

#[tokio::test]
async fn test_confirmed_on_third_attempt() {
    let ledger = ScriptedLedger::new(U256::zero()).with_receipts(vec![
        Ok(None),
        Ok(None),
        Ok(Some(receipt(true))),
    ]);

    let outcome = poller(5, RetryConfig::no_retry())
        .poll(&ledger, TxHash::random())
        .await;

    assert_eq!(
        outcome.settlement,
        Settlement::Confirmed {
            block_number: 4242,
            gas_used: U256::from(21_000u64),
        }
    );
    assert_eq!(outcome.attempts, 3);
    assert_eq!(ledger.receipt_calls(), 3);
}

#[tokio::test]
async fn test_unknown_after_cap() {
    let ledger = ScriptedLedger::new(U256::zero()).with_default_receipt(None);

    let outcome = poller(5, RetryConfig::no_retry())
        .poll(&ledger, TxHash::random())
        .await;

    assert_eq!(outcome.settlement, Settlement::Unknown);
    assert_eq!(outcome.attempts, 5);
    assert_eq!(ledger.receipt_calls(), 5);
}

#[tokio::test]
async fn test_reverted_immediately() {
    let ledger = ScriptedLedger::new(U256::zero()).with_receipts(vec![Ok(Some(receipt(false)))]);

    let outcome = poller(5, RetryConfig::no_retry())
        .poll(&ledger, TxHash::random())
        .await;

    assert_eq!(outcome.settlement, Settlement::Reverted);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(ledger.receipt_calls(), 1);
}

#[tokio::test]
async fn test_query_errors_exhaust_to_unknown() {
    let errors = (0..6).map(|_| Err("rpc down".to_string())).collect();
    let ledger = ScriptedLedger::new(U256::zero()).with_receipts(errors);

    let outcome = poller(3, RetryConfig::new(2, 0))
        .poll(&ledger, TxHash::random())
        .await;

    assert_eq!(outcome.settlement, Settlement::Unknown);
    assert_eq!(outcome.attempts, 3);
    // Every poll attempt retried once before giving up
    assert_eq!(ledger.receipt_calls(), 6);
}

#[tokio::test]
async fn test_query_error_then_receipt() {
    let ledger = ScriptedLedger::new(U256::zero()).with_receipts(vec![
        Err("rpc down".to_string()),
        Ok(Some(receipt(true))),
    ]);

    let outcome = poller(5, RetryConfig::no_retry())
        .poll(&ledger, TxHash::random())
        .await;

    assert!(matches!(outcome.settlement, Settlement::Confirmed { .. }));
    assert_eq!(outcome.attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn test_waits_between_polls_only() {
    let ledger = ScriptedLedger::new(U256::zero()).with_default_receipt(None);
    let poller = ConfirmationPoller::new(
        RetryExecutor::new(RetryConfig::no_retry()),
        3,
        Duration::from_secs(10),
    );

    let start = tokio::time::Instant::now();
    poller.poll(&ledger, TxHash::random()).await;

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(20));
    assert!(elapsed < Duration::from_secs(30));
}
