//! Sociogram TUI entry point.
//!
//! # Usage
//!
//! ```bash
//! # Chat on testnet through the web wallet
//! sociogram-tui --log-file sociogram.log
//!
//! # Seeded in-memory network, already signed in as alice
//! sociogram-tui --simulate --sim-account alice.testnet
//!
//! # Seeded network, signing in a new account through the simulated wallet
//! sociogram-tui --simulate --callback '?account_id=dave.testnet&public_key=ed25519:sim'
//! ```

use std::{error::Error, fs::OpenOptions, path::PathBuf, sync::Arc};

use clap::Parser;
use sociogram_client::{ClientConfig, Environment, Platform, SessionClient, SystemEnv, rpc::NearPlatform};
use sociogram_harness::SimEnv;
use sociogram_tui::{App, Bridge, Runtime, TerminalDriver, demo};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Sociogram terminal chat client
#[derive(Parser, Debug)]
#[command(name = "sociogram-tui")]
#[command(about = "Terminal chat client for the Sociogram contract")]
#[command(version)]
struct Args {
    /// Network identifier (overrides SOCIOGRAM_NETWORK_ID)
    #[arg(long)]
    network: Option<String>,

    /// JSON-RPC node URL (overrides SOCIOGRAM_NODE_URL)
    #[arg(long)]
    node_url: Option<String>,

    /// Wallet base URL (overrides SOCIOGRAM_WALLET_URL)
    #[arg(long)]
    wallet_url: Option<String>,

    /// Chat contract account (overrides SOCIOGRAM_CONTRACT_NAME)
    #[arg(long)]
    contract: Option<String>,

    /// Origin the wallet redirects back to (overrides SOCIOGRAM_APP_URL)
    #[arg(long)]
    app_url: Option<String>,

    /// Wallet redirect URL to complete sign-in at startup
    #[arg(long)]
    callback: Option<String>,

    /// Run against a seeded in-memory network instead of a node
    #[arg(long)]
    simulate: bool,

    /// Account already signed in when simulating
    #[arg(long, requires = "simulate")]
    sim_account: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to this file; logs are discarded without it
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(network) = &self.network {
            config.network_id.clone_from(network);
        }
        if let Some(node_url) = &self.node_url {
            config.node_url.clone_from(node_url);
        }
        if let Some(wallet_url) = &self.wallet_url {
            config.wallet_url.clone_from(wallet_url);
        }
        if let Some(contract) = &self.contract {
            config.contract_name = contract.as_str().into();
        }
        if let Some(app_url) = &self.app_url {
            config.app_url.clone_from(app_url);
        }
        config
    }

    fn app(&self) -> App {
        match &self.callback {
            Some(redirect) => App::new().with_callback(redirect.clone()),
            None => App::new(),
        }
    }
}

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::sync::Mutex::new(file)).with_ansi(false))
        .with(filter)
        .init();
    Ok(())
}

async fn run<P, E>(platform: P, env: E, config: ClientConfig, app: App) -> Result<(), Box<dyn Error>>
where
    P: Platform,
    E: Environment,
{
    let client = SessionClient::new(platform, env, config);
    let driver = TerminalDriver::new()?;
    let mut runtime = Runtime::new(driver, app, Bridge::new(Arc::new(client)));

    runtime.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = args.config();
    let app = args.app();

    if args.simulate {
        tracing::info!(account = ?args.sim_account, "Sociogram TUI starting in simulation mode");
        let network = demo::seeded_network();
        let platform = demo::platform(&network, args.sim_account.as_deref());
        let app = app.with_sign_in_notice(demo::sign_in_notice("dave.testnet"));
        return run(platform, SimEnv::default(), config, app).await;
    }

    tracing::info!(network = %config.network_id, contract = %config.contract_name, "Sociogram TUI starting");
    let platform = NearPlatform::new(SystemEnv::new(), config.clone())?;
    run(platform, SystemEnv::new(), config, app).await
}
