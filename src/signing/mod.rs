//! Order construction and EIP-712 signing

pub mod amounts;
pub mod domain;
pub mod intent;
pub mod order;
pub mod signer;

pub use amounts::{Amounts, Precision, RoundingPolicy, ScalingRules, BASE_DECIMALS, BASE_UNIT};
pub use domain::{
    DomainParams, AMOY_CHAIN_ID, CTF_EXCHANGE, CTF_EXCHANGE_NAME, CTF_EXCHANGE_VERSION, NEG_RISK_CTF_EXCHANGE,
    POLYGON_CHAIN_ID,
};
pub use intent::{OrderIntent, MAX_FEE_RATE_BPS, MAX_TOKEN_ID_LEN};
pub use order::{ClobAuth, Order, OrderPayload, PostOrderBody, SignedOrder, CLOB_AUTH_MESSAGE};
pub use signer::{
    clob_auth_signing_hash, parse_signature, recover_signer, signing_hash, verify_order, OrderSigner,
};
