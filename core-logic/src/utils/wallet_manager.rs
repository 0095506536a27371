use crate::config::WalletSource;
use crate::error::{ConfigError, CoreError, WalletError};
use crate::traits::WalletLoader;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A validated hex private key (no `0x` prefix). Wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey(String);

impl SigningKey {
    /// Accepts 64 hex chars with an optional `0x` prefix.
    pub fn parse(raw: &str, index: usize) -> Result<Self, WalletError> {
        let trimmed = raw.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_part.len() != 64 {
            return Err(WalletError::InvalidKeyLength {
                index,
                length: hex_part.len(),
            });
        }
        if hex::decode(hex_part).is_err() {
            return Err(WalletError::InvalidKeyFormat { index });
        }

        Ok(Self(hex_part.to_ascii_lowercase()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningKey").field(&"***REDACTED***").finish()
    }
}

pub struct WalletManager {
    source: WalletSource,
}

impl WalletManager {
    pub fn new(source: WalletSource) -> Self {
        Self { source }
    }

    fn read_key_file(path: &str) -> Result<Vec<SigningKey>, CoreError> {
        if !Path::new(path).exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string(),
            }
            .into());
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_string(),
            msg: e.to_string(),
        })?;

        Self::parse_keys(path, &content)
    }

    /// Parses either a JSON array of strings (`privateKeys.json`) or a
    /// line-based list (`pv.txt`). Blank lines and `#` comments are ignored.
    pub fn parse_keys(path: &str, content: &str) -> Result<Vec<SigningKey>, CoreError> {
        let raw_keys: Vec<String> = if content.trim_start().starts_with('[') {
            serde_json::from_str(content).map_err(|e| WalletError::MalformedKeyFile {
                path: path.to_string(),
                reason: e.to_string(),
            })?
        } else {
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect()
        };

        let keys = raw_keys
            .iter()
            .enumerate()
            .map(|(i, raw)| SigningKey::parse(raw, i))
            .collect::<Result<Vec<_>, _>>()?;

        if keys.is_empty() {
            return Err(WalletError::NoKeys {
                source_name: path.to_string(),
            }
            .into());
        }

        Ok(keys)
    }

    fn read_env_key(var: &str) -> Result<Vec<SigningKey>, CoreError> {
        let raw = std::env::var(var).map_err(|_| ConfigError::MissingField {
            field: var.to_string(),
        })?;
        Ok(vec![SigningKey::parse(&raw, 0)?])
    }
}

#[async_trait]
impl WalletLoader for WalletManager {
    type Wallet = SigningKey;

    async fn load_wallets(&self) -> Result<Vec<SigningKey>> {
        let keys = match &self.source {
            WalletSource::File { path } => {
                info!("[WalletManager] Loading keys from {}", path);
                Self::read_key_file(path)?
            }
            WalletSource::Env { key } => {
                info!("[WalletManager] Loading key from ${}", key);
                Self::read_env_key(key)?
            }
        };
        Ok(keys)
    }
}
