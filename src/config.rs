//! Configuration management for the gasless trading client

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::Address;
use anyhow::{anyhow, bail, Context, Result};
use secrecy::SecretString;

use crate::signing::{DomainParams, RoundingPolicy, ScalingRules, CTF_EXCHANGE, NEG_RISK_CTF_EXCHANGE};
use crate::types::SignatureType;
use crate::wallet::{DEFAULT_ITERATIONS, MAX_ITERATIONS, MIN_ITERATIONS};

/// Key, base64 secret and passphrase as read from the environment
#[derive(Debug)]
pub struct CredentialsConfig {
    pub key: String,
    pub secret: SecretString,
    pub passphrase: SecretString,
}

/// Client configuration loaded from environment
#[derive(Debug)]
pub struct Config {
    /// Encrypted key file
    pub vault_path: PathBuf,

    /// PBKDF2 rounds for new vaults and password rotation
    pub kdf_iterations: u32,

    /// Exchange the orders are signed for
    pub domain: DomainParams,

    /// Safe or proxy wallet holding the funds (None = the key's own address)
    pub funder: Option<Address>,

    pub signature_type: SignatureType,

    /// Price tick, amount precision and rounding
    pub scaling: ScalingRules,

    /// Polymarket Builder credentials (order attribution / relay)
    pub builder_credentials: Option<CredentialsConfig>,

    /// CLOB L2 API credentials
    pub api_credentials: Option<CredentialsConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let vault_path = get("VAULT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("vault.json"));

        let kdf_iterations: u32 = parse_or(get("VAULT_KDF_ITERATIONS"), "VAULT_KDF_ITERATIONS", DEFAULT_ITERATIONS)?;
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&kdf_iterations) {
            bail!(
                "VAULT_KDF_ITERATIONS={} is outside {}..={}",
                kdf_iterations,
                MIN_ITERATIONS,
                MAX_ITERATIONS
            );
        }

        // Exchange domain
        let neg_risk = match get("POLY_NEG_RISK") {
            None => false,
            Some(v) => parse_bool(&v).with_context(|| format!("POLY_NEG_RISK={}", v))?,
        };
        let preset = if neg_risk {
            DomainParams::polymarket_neg_risk()
        } else {
            DomainParams::polymarket_ctf()
        };
        let verifying_contract = match get("POLY_EXCHANGE_ADDRESS") {
            Some(v) => parse_address(&v, "POLY_EXCHANGE_ADDRESS")?,
            None if neg_risk => NEG_RISK_CTF_EXCHANGE,
            None => CTF_EXCHANGE,
        };
        let domain = DomainParams {
            name: get("POLY_EXCHANGE_NAME").unwrap_or(preset.name),
            version: get("POLY_EXCHANGE_VERSION").unwrap_or(preset.version),
            chain_id: parse_or(get("POLY_CHAIN_ID"), "POLY_CHAIN_ID", preset.chain_id)?,
            verifying_contract,
        };
        domain.validate().context("Invalid exchange domain")?;

        // Account
        let funder = get("POLY_FUNDER_ADDRESS")
            .map(|v| parse_address(&v, "POLY_FUNDER_ADDRESS"))
            .transpose()?;
        let signature_type = match get("POLY_SIGNATURE_TYPE") {
            None => SignatureType::Eoa,
            Some(v) => SignatureType::from_str(&v).map_err(|e| anyhow!("POLY_SIGNATURE_TYPE: {}", e))?,
        };
        if signature_type != SignatureType::Eoa && funder.is_none() {
            bail!("POLY_SIGNATURE_TYPE={:?} requires POLY_FUNDER_ADDRESS", signature_type);
        }

        // Amount scaling
        let defaults = ScalingRules::default();
        let rounding = match get("ORDER_ROUNDING") {
            None => defaults.rounding,
            Some(v) => RoundingPolicy::from_str(&v).map_err(|e| anyhow!("ORDER_ROUNDING: {}", e))?,
        };
        let scaling = ScalingRules {
            price_decimals: parse_or(get("ORDER_PRICE_DECIMALS"), "ORDER_PRICE_DECIMALS", defaults.price_decimals)?,
            rounding,
            ..defaults
        };
        scaling.validate().context("Invalid order scaling")?;

        // API credentials
        let builder_credentials = credentials(
            &get,
            ["POLY_BUILDER_API_KEY", "POLY_BUILDER_SECRET", "POLY_BUILDER_PASSPHRASE"],
        )?;
        let api_credentials = credentials(&get, ["POLY_API_KEY", "POLY_API_SECRET", "POLY_API_PASSPHRASE"])?;

        Ok(Self {
            vault_path,
            kdf_iterations,
            domain,
            funder,
            signature_type,
            scaling,
            builder_credentials,
            api_credentials,
        })
    }

    /// Check if builder attribution is configured
    pub fn has_builder(&self) -> bool {
        self.builder_credentials.is_some()
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e| anyhow!("{}={}: {}", name, v, e)),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => bail!("expected true or false"),
    }
}

fn parse_address(value: &str, name: &str) -> Result<Address> {
    let address = Address::from_str(value).with_context(|| format!("{} is not an address: {}", name, value))?;
    if address == Address::ZERO {
        bail!("{} is the zero address", name);
    }
    Ok(address)
}

/// All three parts or none
fn credentials<G>(get: &G, names: [&str; 3]) -> Result<Option<CredentialsConfig>>
where
    G: Fn(&str) -> Option<String>,
{
    match (get(names[0]), get(names[1]), get(names[2])) {
        (Some(key), Some(secret), Some(passphrase)) => Ok(Some(CredentialsConfig {
            key,
            secret: SecretString::from(secret),
            passphrase: SecretString::from(passphrase),
        })),
        (None, None, None) => Ok(None),
        _ => bail!("{}, {} and {} must be set together", names[0], names[1], names[2]),
    }
}
