use crate::transfer::Transfer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::config::ProxyConfig;
use core_logic::ConfigError;
use ethers::prelude::*;
use reqwest::Client;
use std::time::Duration;

/// What the poller needs from a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub success: bool,
    pub block_number: u64,
    pub gas_used: U256,
}

impl From<&TransactionReceipt> for ReceiptSummary {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            success: receipt.status == Some(U64::from(1)),
            block_number: receipt.block_number.map(|b| b.as_u64()).unwrap_or_default(),
            gas_used: receipt.gas_used.unwrap_or_default(),
        }
    }
}

/// Network calls made by the lifecycle. Every method may fail transiently.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn balance(&self, account: Address) -> Result<U256>;

    /// Signs and broadcasts; returns as soon as the node accepts the tx.
    async fn submit(&self, signer: &LocalWallet, transfer: &Transfer) -> Result<TxHash>;

    /// `None` while the transaction is not mined yet.
    async fn receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>>;
}

/// JSON-RPC over HTTP(S), optionally through a proxy.
#[derive(Debug, Clone)]
pub struct EthersLedger {
    provider: Provider<Http>,
}

impl EthersLedger {
    pub fn new(
        rpc_url: &str,
        proxy_config: Option<&ProxyConfig>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut client_builder = Client::builder().timeout(timeout);

        if let Some(proxy_conf) = proxy_config {
            let mut proxy = reqwest::Proxy::all(&proxy_conf.url)
                .context(format!("Invalid proxy url {}", proxy_conf.url))?;
            if let (Some(u), Some(p)) = (&proxy_conf.username, &proxy_conf.password) {
                proxy = proxy.basic_auth(u, p);
            }
            client_builder = client_builder.proxy(proxy);
        }
        let client = client_builder.build()?;

        let url = reqwest::Url::parse(rpc_url).map_err(|_| ConfigError::InvalidRpcUrl {
            url: rpc_url.to_string(),
        })?;

        Ok(Self {
            provider: Provider::new(Http::new_with_client(url, client)),
        })
    }
}

#[async_trait]
impl LedgerClient for EthersLedger {
    async fn balance(&self, account: Address) -> Result<U256> {
        Ok(self.provider.get_balance(account, None).await?)
    }

    async fn submit(&self, signer: &LocalWallet, transfer: &Transfer) -> Result<TxHash> {
        let client = SignerMiddleware::new(
            self.provider.clone(),
            signer.clone().with_chain_id(transfer.chain_id),
        );
        let pending_tx = client.send_transaction(transfer.to_request(), None).await?;
        Ok(pending_tx.tx_hash())
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.as_ref().map(ReceiptSummary::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_summary_success() {
        let receipt = TransactionReceipt {
            status: Some(U64::from(1)),
            block_number: Some(U64::from(1234)),
            gas_used: Some(U256::from(21_000u64)),
            ..Default::default()
        };

        assert_eq!(
            ReceiptSummary::from(&receipt),
            ReceiptSummary {
                success: true,
                block_number: 1234,
                gas_used: U256::from(21_000u64),
            }
        );
    }

    #[test]
    fn test_receipt_summary_failure_status() {
        let receipt = TransactionReceipt {
            status: Some(U64::zero()),
            ..Default::default()
        };
        assert!(!ReceiptSummary::from(&receipt).success);
    }

    #[test]
    fn test_new_rejects_bad_url() {
        let err = EthersLedger::new("::nope::", None, Duration::from_secs(1)).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_new_with_proxy() {
        let proxy = ProxyConfig {
            url: "http://127.0.0.1:8080".to_string(),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
        };
        let ledger = EthersLedger::new(
            "https://rpc-testnet.unit0.dev",
            Some(&proxy),
            Duration::from_secs(5),
        );
        assert!(ledger.is_ok());
    }
}
