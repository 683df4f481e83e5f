//! Polymarket Gasless Trading CLI
//!
//! Manages the encrypted key vault and prints signed orders and auth headers.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use polymarket_gasless::session::ORDER_PATH;
use polymarket_gasless::{
    generate_wallet, Config, OrderRequest, Secret, Side, TimeInForce, TradingSession, VaultStore,
};
use rust_decimal::Decimal;
use std::env;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "polymarket-gasless")]
#[command(about = "Gasless Polymarket order signing and request authentication")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Environment variable holding the vault password
    #[arg(long, global = true, default_value = "VAULT_PASSWORD")]
    password_env: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the vault from a new or imported key
    Init {
        /// Generate a fresh random key
        #[arg(long, conflicts_with = "key_env")]
        generate: bool,

        /// Import the hex key held in this environment variable
        #[arg(long)]
        key_env: Option<String>,
    },

    /// Print the signer and maker addresses
    Address,

    /// Re-encrypt the vault under a new password
    Rotate {
        /// Environment variable holding the new password
        #[arg(long)]
        new_password_env: String,
    },

    /// Sign an order and print the submission (body + headers)
    SignOrder {
        /// Outcome token id (decimal)
        #[arg(long)]
        token_id: String,

        #[arg(long)]
        side: Side,

        /// Price per share in (0, 1]
        #[arg(long)]
        price: Decimal,

        /// Number of shares
        #[arg(long)]
        size: Decimal,

        #[arg(long, default_value = "GTC")]
        tif: TimeInForce,

        /// Unix seconds, GTD only
        #[arg(long)]
        expiration: Option<u64>,

        #[arg(long, default_value = "0")]
        nonce: u64,

        #[arg(long, default_value = "0")]
        fee_rate_bps: u32,

        /// Fixed salt (random when omitted)
        #[arg(long)]
        salt: Option<u64>,

        /// Endpoint path the headers are signed for
        #[arg(long, default_value = ORDER_PATH)]
        path: String,
    },

    /// Print builder auth headers for a request
    AuthHeaders {
        #[arg(long, default_value = "GET")]
        method: String,

        #[arg(long)]
        path: String,

        #[arg(long, default_value = "")]
        body: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let store = VaultStore::new(&config.vault_path);
    let password = read_env(&cli.password_env)?;

    match cli.command {
        Commands::Init { generate, key_env } => init_vault(&store, &config, &password, generate, key_env).await?,
        Commands::Address => show_address(&store, &config, &password).await?,
        Commands::Rotate { new_password_env } => {
            let new_password = read_env(&new_password_env)?;
            store
                .rotate_password(&password, &new_password, config.kdf_iterations)
                .await
                .context("Password rotation failed")?;
            println!("Password rotated for {}", store.path().display());
        }
        Commands::SignOrder {
            token_id,
            side,
            price,
            size,
            tif,
            expiration,
            nonce,
            fee_rate_bps,
            salt,
            path,
        } => {
            let request = OrderRequest {
                token_id,
                side,
                price,
                size,
                time_in_force: tif,
                expiration,
                nonce,
                fee_rate_bps,
                salt,
            };
            let session = unlock(&store, &config, &password).await?;
            let submission = session.prepare_submission(&request, &path)?;
            println!("{}", serde_json::to_string_pretty(&submission)?);
        }
        Commands::AuthHeaders { method, path, body } => {
            let session = unlock(&store, &config, &password).await?;
            let Some(builder) = session.builder() else {
                bail!("POLY_BUILDER_API_KEY, POLY_BUILDER_SECRET and POLY_BUILDER_PASSPHRASE are not set");
            };
            let headers = builder.authenticate(&method, &path, body.as_bytes())?;
            for (name, value) in builder.header_pairs(&headers) {
                println!("{}: {}", name, value);
            }
        }
    }

    Ok(())
}

fn read_env(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("{} is not set", name))?;
    if value.is_empty() {
        bail!("{} is empty", name);
    }
    Ok(value)
}

async fn unlock(store: &VaultStore, config: &Config, password: &str) -> Result<TradingSession> {
    TradingSession::unlock(store, password, config)
        .await
        .with_context(|| format!("Failed to unlock {}", store.path().display()))
}

async fn init_vault(
    store: &VaultStore,
    config: &Config,
    password: &str,
    generate: bool,
    key_env: Option<String>,
) -> Result<()> {
    let secret = match (generate, key_env) {
        (true, _) => {
            let wallet = generate_wallet();
            info!("Generated new wallet {}", wallet.address);
            wallet.secret
        }
        (false, Some(var)) => Secret::from_hex(&read_env(&var)?).with_context(|| format!("{} is not a hex key", var))?,
        (false, None) => bail!("pass --generate or --key-env <VAR>"),
    };

    // Fail before writing anything if the key cannot sign
    let session = TradingSession::new(&secret, config)?;
    store
        .create(&secret, password, config.kdf_iterations)
        .await
        .context("Failed to create vault")?;

    println!("Vault:  {}", store.path().display());
    println!("Signer: {}", session.address().to_checksum(None));
    println!("Maker:  {}", session.maker().to_checksum(None));
    Ok(())
}

async fn show_address(store: &VaultStore, config: &Config, password: &str) -> Result<()> {
    let session = unlock(store, config, password).await?;

    println!("Signer: {}", session.address().to_checksum(None));
    println!("Maker:  {}", session.maker().to_checksum(None));
    println!("Chain:  {}", session.domain().chain_id);
    println!("Owner:  {}", session.owner());
    Ok(())
}
