//! Lamport Transfer CLI
//!
//! Runs the configured transfer sequence against a deployed transfer program,
//! or submits a single ad-hoc transfer.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(dead_code)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::{pubkey::Pubkey, signature::Signer};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lamport_transfer::config::Config;
use lamport_transfer::metrics::Metrics;
use lamport_transfer::rpc_manager::{LedgerRpc, RpcSettings, SolanaRpc};
use lamport_transfer::submitter::TransferSubmitter;
use lamport_transfer::tx_builder::parse_lamports;
use lamport_transfer::types::{TransferReceipt, TransferRequest};
use lamport_transfer::wallet::KeyStore;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit the configured transfers in order
    Run,

    /// Submit one transfer
    Send {
        /// Sender account name
        #[arg(long)]
        from: String,

        /// Recipient account name or base58 address
        #[arg(long)]
        to: String,

        /// Amount in lamports
        #[arg(long)]
        lamports: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    info!("Starting lamport-transfer v{}", env!("CARGO_PKG_VERSION"));

    let result = execute(args).await;
    if let Err(e) = &result {
        error!(error = %format!("{:#}", e), "Run failed");
    }
    result
}

async fn execute(args: Args) -> Result<()> {
    info!("Loading configuration from: {}", args.config);
    let config = load_config(&args.config)?;
    config.validate().context("Invalid configuration")?;

    let settings = RpcSettings::from_network_config(&config.network)
        .context("Failed to resolve RPC settings")?;
    info!(
        url = %settings.url,
        commitment = ?settings.commitment.commitment,
        "Using RPC endpoint"
    );
    let rpc: Arc<dyn LedgerRpc> = Arc::new(SolanaRpc::new(settings));

    let submitter_config = config
        .submitter_config()
        .context("Failed to resolve program id")?;
    info!(program_id = %submitter_config.program_id, "Target program");

    let metrics = Arc::new(Metrics::new()?);
    let submitter = TransferSubmitter::new(rpc, submitter_config, Arc::clone(&metrics));
    let mut keys = KeyStore::new(&config.accounts.keypair_dir);

    let outcome = match args.command.unwrap_or(Command::Run) {
        Command::Run => run_sequence(&config, &submitter, &mut keys).await,
        Command::Send { from, to, lamports } => {
            send_one(&config, &submitter, &mut keys, &from, &to, &lamports).await
        }
    };

    info!(
        submitted = metrics.transfers_submitted.get(),
        confirmed = metrics.transfers_confirmed.get(),
        failed = metrics.transfers_failed.get(),
        "Transfer summary"
    );
    match metrics.gather_text() {
        Ok(text) => debug!("Metrics snapshot:\n{}", text),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }

    outcome
}

/// Submit every configured transfer, stopping at the first failure
async fn run_sequence(
    config: &Config,
    submitter: &TransferSubmitter,
    keys: &mut KeyStore,
) -> Result<()> {
    let mut requests = Vec::with_capacity(config.transfers.len());
    let mut accounts = BTreeMap::new();

    for route in &config.transfers {
        let sender = keys
            .load(&route.from)
            .with_context(|| format!("Failed to load sender '{}'", route.from))?;
        let recipient = keys
            .resolve_pubkey(&route.to)
            .with_context(|| format!("Failed to resolve recipient '{}'", route.to))?;
        let amount = route
            .amount()
            .with_context(|| format!("Invalid amount for {}", route.label()))?;

        accounts.insert(route.from.clone(), sender.pubkey());
        accounts.insert(route.to.clone(), recipient);
        requests.push(TransferRequest::new(sender, recipient, amount).with_label(route.label()));
    }

    for (name, pubkey) in &accounts {
        info!(account = %name, pubkey = %pubkey, "Account");
    }

    if config.monitoring.log_balances {
        log_balances(submitter, &accounts, "before").await;
    }

    let result = submitter.submit_sequence(requests).await;

    if config.monitoring.log_balances {
        log_balances(submitter, &accounts, "after").await;
    }

    match result {
        Ok(receipts) => {
            receipts.iter().for_each(log_receipt);
            info!(count = receipts.len(), "All transfers confirmed");
            Ok(())
        }
        Err(e) => {
            e.completed.iter().for_each(log_receipt);
            Err(e).context("Transfer sequence halted")
        }
    }
}

/// Submit one ad-hoc transfer
async fn send_one(
    config: &Config,
    submitter: &TransferSubmitter,
    keys: &mut KeyStore,
    from: &str,
    to: &str,
    lamports: &str,
) -> Result<()> {
    let amount = parse_lamports(lamports).context("Invalid --lamports")?;
    let sender = keys
        .load(from)
        .with_context(|| format!("Failed to load sender '{}'", from))?;
    let recipient = keys
        .resolve_pubkey(to)
        .with_context(|| format!("Failed to resolve recipient '{}'", to))?;

    let accounts = BTreeMap::from([
        (from.to_string(), sender.pubkey()),
        (to.to_string(), recipient),
    ]);

    if config.monitoring.log_balances {
        log_balances(submitter, &accounts, "before").await;
    }

    let request = TransferRequest::new(sender, recipient, amount).with_label(format!("{from} -> {to}"));
    let result = submitter.submit(request).await;

    if config.monitoring.log_balances {
        log_balances(submitter, &accounts, "after").await;
    }

    let receipt = result.context("Transfer failed")?;
    log_receipt(&receipt);
    Ok(())
}

async fn log_balances(
    submitter: &TransferSubmitter,
    accounts: &BTreeMap<String, Pubkey>,
    phase: &str,
) {
    for (name, pubkey) in accounts {
        match submitter.rpc().balance(pubkey).await {
            Ok(lamports) => info!(phase = %phase, account = %name, lamports = lamports, "Balance"),
            Err(e) => warn!(phase = %phase, account = %name, error = %e, "Balance unavailable"),
        }
    }
}

fn log_receipt(receipt: &TransferReceipt) {
    info!(
        signature = %receipt.signature,
        sender = %receipt.sender,
        recipient = %receipt.recipient,
        amount = receipt.amount,
        commitment = ?receipt.commitment,
        latency_ms = receipt.latency_ms,
        "Transfer confirmed"
    );
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        "lamport_transfer=debug,info"
    } else {
        "lamport_transfer=info,warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        dotenvy::dotenv().ok();
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }
}
