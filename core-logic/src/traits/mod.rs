use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait WalletLoader: Send + Sync {
    type Wallet;

    /// Load the ordered list of signing credentials
    async fn load_wallets(&self) -> Result<Vec<Self::Wallet>>;
}

/// Asks the operator how many transfers to send for one account.
///
/// Implementations may block; callers run them on the blocking pool.
pub trait CountPrompt: Send + Sync {
    fn ask_count(&self, prompt: &str) -> Result<u64>;
}
