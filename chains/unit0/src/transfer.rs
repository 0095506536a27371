//! Transfer drafts and the planner that samples them.

use crate::config::LifecycleConfig;
use anyhow::{bail, Result};
use ethers::prelude::*;
use rand::{CryptoRng, Rng};

/// One outgoing value movement. Built once, resubmitted unchanged on retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub chain_id: u64,
}

impl Transfer {
    /// Legacy (gas price) transaction, as the Unit Zero testnet expects.
    pub fn to_request(&self) -> TransactionRequest {
        TransactionRequest::new()
            .from(self.from)
            .to(self.to)
            .value(self.value)
            .gas(self.gas_limit)
            .gas_price(self.gas_price)
            .chain_id(self.chain_id)
    }

    pub fn value_ether(&self) -> String {
        ethers::utils::format_ether(self.value)
    }

    pub fn gas_price_gwei(&self) -> String {
        ethers::utils::format_units(self.gas_price, "gwei")
            .unwrap_or_else(|_| self.gas_price.to_string())
    }
}

/// Samples destination, value and gas price for each transfer.
#[derive(Debug, Clone)]
pub struct TransferPlanner {
    value_ether: (f64, f64),
    gas_price_gwei: (f64, f64),
    gas_limit: u64,
    chain_id: u64,
}

impl TransferPlanner {
    /// Fractional digits kept after sampling
    pub const VALUE_DECIMALS: usize = 10;
    pub const GAS_PRICE_DECIMALS: usize = 9;

    pub fn new(chain_id: u64) -> Self {
        Self::from_config(&LifecycleConfig::default(), chain_id)
    }

    pub fn from_config(config: &LifecycleConfig, chain_id: u64) -> Self {
        Self {
            value_ether: (config.min_value_ether, config.max_value_ether),
            gas_price_gwei: (config.min_gas_price_gwei, config.max_gas_price_gwei),
            gas_limit: config.gas_limit,
            chain_id,
        }
    }

    /// Draws a fresh transfer from `from` to a newly generated address.
    ///
    /// The destination key is discarded right away; nothing checks that the
    /// address is reachable.
    pub fn plan<R>(&self, from: Address, rng: &mut R) -> Result<Transfer>
    where
        R: Rng + CryptoRng,
    {
        let to = LocalWallet::new(rng).address();
        let value = sample_units(rng, self.value_ether, Self::VALUE_DECIMALS, "ether")?;
        let gas_price = sample_units(
            rng,
            self.gas_price_gwei,
            Self::GAS_PRICE_DECIMALS,
            "gwei",
        )?;

        Ok(Transfer {
            from,
            to,
            value,
            gas_price,
            gas_limit: U256::from(self.gas_limit),
            chain_id: self.chain_id,
        })
    }
}

/// Uniform sample in `[min, max]`, rounded to `decimals` digits, in wei.
fn sample_units<R: Rng>(
    rng: &mut R,
    (min, max): (f64, f64),
    decimals: usize,
    unit: &str,
) -> Result<U256> {
    let sampled = rng.gen_range(min..=max);
    let rounded = format!("{:.*}", decimals, sampled);
    let amount: U256 = ethers::utils::parse_units(&rounded, unit)?.into();
    if amount.is_zero() {
        bail!("{} {} rounds to zero at {} decimals", sampled, unit, decimals);
    }
    Ok(amount)
}
