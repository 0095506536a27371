//! # Core Logic - Shared Utilities for Testnet Senders
//!
//! This crate provides the chain-agnostic pieces used by every chain crate:
//! bounded retries, logging, key loading and the transfer count prompt.
//!
//! ## Modules
//!
//! - [`config`] - Shared configuration structures (key source, proxy)
//! - [`error`] - Typed error handling with thiserror
//! - [`traits`] - Collaborator trait definitions
//! - [`utils`] - Utility modules (retry, logger, wallet, prompt)

// Module declarations - internal modules marked pub(crate)
pub mod config;
pub mod error;
pub mod traits;
pub(crate) mod utils;

// Selective exports - only public API types
pub use config::{ProxyConfig, WalletSource};
pub use error::{ConfigError, CoreError, WalletError};
pub use traits::{CountPrompt, WalletLoader};

// Utils are pub(crate) - only export specific public utilities
pub use utils::{
    setup_logger, FixedCount, SigningKey, TerminalPrompt, WalletManager, RESULT_TARGET,
};

// Export retry utilities for the chain crates and tests
pub use utils::retry::{RetryConfig, RetryExecutor};
