use serde::{Deserialize, Serialize};

/// Where the signing keys come from.
///
/// Deserialised from a tagged table, e.g.
///
/// ```toml
/// [wallet]
/// type = "file"
/// path = "privateKeys.json"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WalletSource {
    /// JSON array of hex keys, or one key per line (`#` starts a comment)
    File { path: String },
    /// A single key held in an environment variable
    Env { key: String },
}

impl Default for WalletSource {
    fn default() -> Self {
        WalletSource::File {
            path: "privateKeys.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}
