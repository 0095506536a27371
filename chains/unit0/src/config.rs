use crate::transfer::TransferPlanner;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use core_logic::config::{ProxyConfig, WalletSource};
use core_logic::{ConfigError, RetryConfig};
use ethers::types::U256;
use serde::Deserialize;
use std::time::Duration;

pub const UNIT0_TESTNET_RPC: &str = "https://rpc-testnet.unit0.dev";
pub const UNIT0_TESTNET_CHAIN_ID: u64 = 88817;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Unit0Config {
    pub rpc_url: String,
    pub chain_id: u64,
    pub request_timeout_ms: u64,
    /// Skips the interactive prompt when set
    pub transfer_count: Option<u64>,
    pub wallet: WalletSource,
    pub proxy: Option<ProxyConfig>,
    pub retry: RetryConfig,
    pub lifecycle: LifecycleConfig,
}

impl Default for Unit0Config {
    fn default() -> Self {
        Self {
            rpc_url: UNIT0_TESTNET_RPC.to_string(),
            chain_id: UNIT0_TESTNET_CHAIN_ID,
            request_timeout_ms: 30_000,
            transfer_count: None,
            wallet: WalletSource::default(),
            proxy: None,
            retry: RetryConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

/// Timings, threshold and sampling ranges of the transfer lifecycle.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LifecycleConfig {
    pub threshold_ether: f64,
    pub monitor_interval_ms: u64,
    pub propagation_delay_ms: u64,
    pub max_polls: u32,
    pub poll_interval_ms: u64,
    pub min_value_ether: f64,
    pub max_value_ether: f64,
    pub min_gas_price_gwei: f64,
    pub max_gas_price_gwei: f64,
    pub gas_limit: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            threshold_ether: 0.01,
            monitor_interval_ms: 5_000,
            propagation_delay_ms: 15_000,
            max_polls: 5,
            poll_interval_ms: 10_000,
            min_value_ether: 0.00000001,
            max_value_ether: 0.0000001,
            min_gas_price_gwei: 0.0009,
            max_gas_price_gwei: 0.0015,
            gas_limit: 21_000,
        }
    }
}

impl LifecycleConfig {
    pub fn threshold_wei(&self) -> Result<U256> {
        parse_units(self.threshold_ether, "ether")
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    pub fn propagation_delay(&self) -> Duration {
        Duration::from_millis(self.propagation_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "value_ether",
            self.min_value_ether,
            self.max_value_ether,
            TransferPlanner::VALUE_DECIMALS,
        )?;
        check_range(
            "gas_price_gwei",
            self.min_gas_price_gwei,
            self.max_gas_price_gwei,
            TransferPlanner::GAS_PRICE_DECIMALS,
        )?;

        if !(self.threshold_ether.is_finite() && self.threshold_ether >= 0.0) {
            return Err(invalid("threshold_ether", "must be a non-negative number"));
        }
        if self.max_polls == 0 {
            return Err(invalid("max_polls", "must be at least 1"));
        }
        if self.gas_limit == 0 {
            return Err(invalid("gas_limit", "must be positive"));
        }
        Ok(())
    }
}

impl Unit0Config {
    /// Reads the TOML file (optional) and `UNIT0_*` environment overrides,
    /// e.g. `UNIT0_RPC_URL` or `UNIT0_LIFECYCLE__MAX_POLLS`.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("UNIT0")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context(format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to parse config")
    }

    /// Rejects configurations that would make every transfer fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if reqwest::Url::parse(&self.rpc_url).is_err() {
            return Err(ConfigError::InvalidRpcUrl {
                url: self.rpc_url.clone(),
            });
        }
        if self.chain_id == 0 {
            return Err(invalid("chain_id", "must be non-zero"));
        }
        self.lifecycle.validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// `decimals` is the precision amounts are rounded to before conversion;
/// a lower bound that rounds to zero could yield a zero amount.
fn check_range(field: &str, min: f64, max: f64, decimals: usize) -> Result<(), ConfigError> {
    if !(min.is_finite() && max.is_finite()) {
        return Err(invalid(field, "bounds must be finite"));
    }
    if min <= 0.0 {
        return Err(invalid(field, "lower bound must be strictly positive"));
    }
    let rounded_min: f64 = format!("{:.*}", decimals, min).parse().unwrap_or(0.0);
    if rounded_min <= 0.0 {
        return Err(invalid(
            field,
            &format!("lower bound {} rounds to zero at {} decimals", min, decimals),
        ));
    }
    if min > max {
        return Err(invalid(
            field,
            &format!("lower bound {} exceeds upper bound {}", min, max),
        ));
    }
    Ok(())
}

/// Decimal amount in `unit` to wei.
pub fn parse_units<K>(amount: K, unit: &str) -> Result<U256>
where
    K: Into<f64> + std::fmt::Display + Copy,
{
    let amount_str = format!("{}", amount);
    Ok(ethers::utils::parse_units(amount_str, unit)?.into())
}
