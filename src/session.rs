//! Trading session: an unlocked key plus everything needed to submit orders
//!
//! Ties the vault, the order signer and the request authenticators together.
//! The session produces the exact body and headers for a submission; sending
//! them is the transport's job.

use std::sync::Arc;

use alloy::primitives::Address;
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::info;

use crate::auth::{ApiCredentials, Clock, RequestAuthenticator};
use crate::config::{Config, CredentialsConfig};
use crate::error::{Error, Result};
use crate::signing::{DomainParams, OrderIntent, OrderSigner, ScalingRules, SignedOrder};
use crate::types::OrderRequest;
use crate::wallet::{Secret, VaultStore};

/// Order submission endpoint
pub const ORDER_PATH: &str = "/order";

/// Everything a transport needs to POST one order
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub method: &'static str,
    pub path: String,
    /// Compact JSON, signed byte for byte
    pub body: String,
    pub headers: Vec<(&'static str, String)>,
}

pub struct TradingSession {
    signer: Arc<OrderSigner>,
    domain: DomainParams,
    scaling: ScalingRules,
    builder: Option<RequestAuthenticator>,
    l2: Option<RequestAuthenticator>,
}

impl TradingSession {
    pub fn new(secret: &Secret, config: &Config) -> Result<Self> {
        config.domain.validate()?;
        config.scaling.validate()?;

        let signer = OrderSigner::new(secret, config.funder, config.signature_type)?;

        let builder = config
            .builder_credentials
            .as_ref()
            .map(|c| api_credentials(c).map(RequestAuthenticator::builder))
            .transpose()?;
        let l2 = config
            .api_credentials
            .as_ref()
            .map(|c| api_credentials(c).map(|creds| RequestAuthenticator::l2(creds, signer.address())))
            .transpose()?;

        info!(
            "[Signer] Session for {} (maker {}, chain {}, builder: {}, l2: {})",
            signer.address(),
            signer.maker(),
            config.domain.chain_id,
            builder.is_some(),
            l2.is_some()
        );

        Ok(Self {
            signer: Arc::new(signer),
            domain: config.domain.clone(),
            scaling: config.scaling.clone(),
            builder,
            l2,
        })
    }

    /// Unlock the vault and start a session from it
    pub async fn unlock(store: &VaultStore, password: &str, config: &Config) -> Result<Self> {
        let secret = store.unlock(password).await?;
        Self::new(&secret, config)
    }

    /// Use one clock for every authenticator
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.builder = self.builder.map(|a| a.with_clock(Arc::clone(&clock)));
        self.l2 = self.l2.map(|a| a.with_clock(Arc::clone(&clock)));
        self
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn maker(&self) -> Address {
        self.signer.maker()
    }

    pub fn domain(&self) -> &DomainParams {
        &self.domain
    }

    /// Shared handle for signing from other tasks
    pub fn signer(&self) -> Arc<OrderSigner> {
        Arc::clone(&self.signer)
    }

    pub fn builder(&self) -> Option<&RequestAuthenticator> {
        self.builder.as_ref()
    }

    /// Account the order is booked under: the L2 API key, else the maker
    pub fn owner(&self) -> String {
        match &self.l2 {
            Some(auth) => auth.key_id().to_string(),
            None => self.maker().to_checksum(None),
        }
    }

    pub fn sign_order(&self, request: &OrderRequest) -> Result<SignedOrder> {
        let intent = OrderIntent::new(request, &self.scaling)?;
        self.signer.sign_order(&intent, &self.domain)
    }

    /// Sign an order and authenticate the POST that carries it
    pub fn prepare_submission(&self, request: &OrderRequest, path: &str) -> Result<Submission> {
        let signed = self.sign_order(request)?;
        let body = signed
            .to_post_body(self.owner())?
            .to_json()
            .map_err(|e| Error::validation(format!("order body: {}", e)))?;

        let mut headers = Vec::new();
        for auth in [&self.l2, &self.builder].into_iter().flatten() {
            let signed_headers = auth.authenticate("POST", path, body.as_bytes())?;
            headers.extend(auth.header_pairs(&signed_headers));
        }

        Ok(Submission {
            method: "POST",
            path: path.to_string(),
            body,
            headers,
        })
    }
}

fn api_credentials(config: &CredentialsConfig) -> Result<ApiCredentials> {
    ApiCredentials::new(
        config.key.clone(),
        config.secret.expose_secret(),
        config.passphrase.expose_secret(),
    )
}
