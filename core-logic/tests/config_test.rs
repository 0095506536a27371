use core_logic::config::{ProxyConfig, WalletSource};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Wrapper {
    wallet: WalletSource,
    proxy: Option<ProxyConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_source_file_parsing() {
        let parsed: Wrapper =
            serde_json::from_str(r#"{"wallet": {"type": "file", "path": "pv.txt"}}"#).unwrap();

        match parsed.wallet {
            WalletSource::File { path } => assert_eq!(path, "pv.txt"),
            _ => panic!("Expected File variant"),
        }
        assert!(parsed.proxy.is_none());
    }

    #[test]
    fn test_wallet_source_env_parsing() {
        let parsed: Wrapper =
            serde_json::from_str(r#"{"wallet": {"type": "env", "key": "PRIVATE_KEY"}}"#).unwrap();

        assert_eq!(
            parsed.wallet,
            WalletSource::Env {
                key: "PRIVATE_KEY".to_string()
            }
        );
    }

    #[test]
    fn test_wallet_source_default_is_private_keys_json() {
        assert_eq!(
            WalletSource::default(),
            WalletSource::File {
                path: "privateKeys.json".to_string()
            }
        );
    }

    #[test]
    fn test_proxy_config_optional_credentials() {
        let parsed: Wrapper = serde_json::from_str(
            r#"{"wallet": {"type": "file", "path": "k.json"},
                "proxy": {"url": "socks5://127.0.0.1:1080"}}"#,
        )
        .unwrap();

        let proxy = parsed.proxy.expect("proxy should parse");
        assert_eq!(proxy.url, "socks5://127.0.0.1:1080");
        assert!(proxy.username.is_none());
        assert!(proxy.password.is_none());
    }

    #[test]
    fn test_unknown_wallet_type_rejected() {
        let parsed = serde_json::from_str::<Wrapper>(r#"{"wallet": {"type": "ledger"}}"#);
        assert!(parsed.is_err());
    }
}
