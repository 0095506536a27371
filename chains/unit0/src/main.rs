use unit0_sender::config;
use unit0_sender::driver;
use unit0_sender::ledger;

use anyhow::Result;
use clap::Parser;
use config::Unit0Config;
use core_logic::{setup_logger, CountPrompt, FixedCount, TerminalPrompt, WalletLoader};
use core_logic::{WalletManager, WalletSource, RESULT_TARGET};
use dotenv::dotenv;
use driver::LifecycleDriver;
use ledger::EthersLedger;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "chains/unit0/config.toml")]
    config: String,
    /// Key file, overrides the [wallet] section
    #[arg(short, long)]
    keys: Option<String>,
    /// Transfers per account; skips the interactive prompt
    #[arg(long)]
    count: Option<u64>,
    /// Seed for destinations and amounts
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let log_guard = setup_logger("logs", "unit0");
    dotenv().ok();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("An unexpected error occurred: {:#}", e);
        // Flush the file log before exiting
        drop(log_guard);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Loading config from: {}", args.config);
    let mut config = Unit0Config::load(&args.config)?;

    if let Some(path) = args.keys {
        config.wallet = WalletSource::File { path };
    }
    if let Some(count) = args.count {
        config.transfer_count = Some(count);
    }
    config.validate()?;

    info!(
        "Configuration loaded for chain ID: {} ({})",
        config.chain_id, config.rpc_url
    );

    let keys = WalletManager::new(config.wallet.clone()).load_wallets().await?;
    info!(target: RESULT_TARGET, "Loaded {} keys.", keys.len());

    if let Some(ref p) = config.proxy {
        info!("Routing RPC traffic through proxy {}", p.url);
    }
    let ledger = Arc::new(EthersLedger::new(
        &config.rpc_url,
        config.proxy.as_ref(),
        config.request_timeout(),
    )?);

    let prompt: Arc<dyn CountPrompt> = match config.transfer_count {
        Some(count) => Arc::new(FixedCount(count)),
        None => Arc::new(TerminalPrompt),
    };

    let mut driver = LifecycleDriver::new(ledger, prompt, &config)?;
    if let Some(seed) = args.seed {
        driver = driver.with_seed(seed);
    }

    let shutdown = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        summary = driver.run(&keys) => summary.log(),
        _ = shutdown => {
            warn!("🛑 Received Ctrl+C. Stopping without waiting for pending transfers.");
        }
    }

    Ok(())
}
