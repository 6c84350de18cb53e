//! Ledger registration client
//!
//! Mints a token in the configured collection contract and registers it as an
//! IP asset pointing at the two stored documents. The provided implementation
//! talks to a registration gateway over HTTP.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("rights-ingest/", env!("CARGO_PKG_VERSION"));
const MINT_AND_REGISTER_PATH: &str = "/ip-assets/mint-and-register";

static CONTRACT_ADDRESS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex"));
static LEDGER_HASH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("static regex"));

/// Registration failure, subtyped by what the ledger objected to
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Hash format error: {0}")]
    HashFormat(String),

    #[error("Contract error: {0}")]
    ContractReference(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl RegistrationError {
    /// Sort a raw ledger/gateway error message into a subtype
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if lowered.contains("bytes") {
            RegistrationError::HashFormat(message)
        } else if lowered.contains("contract") {
            RegistrationError::ContractReference(message)
        } else {
            RegistrationError::Transaction(message)
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RegistrationError::HashFormat(m)
            | RegistrationError::ContractReference(m)
            | RegistrationError::Transaction(m) => m,
        }
    }
}

/// Everything the ledger needs to register one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub ip_uri: String,
    /// `0x`-prefixed SHA-256
    pub ip_hash: String,
    pub display_uri: String,
    /// `0x`-prefixed SHA-256
    pub display_hash: String,
}

/// Ledger's answer to a successful registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReceipt {
    pub asset_id: String,
    pub transaction_receipt: String,
}

#[async_trait]
pub trait LedgerRegistrar: Send + Sync {
    async fn register_asset(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationReceipt, RegistrationError>;
}

/// Prefix a hex digest with `0x` unless it already carries one
pub fn to_ledger_hash(hex: &str) -> String {
    if hex.starts_with("0x") {
        hex.to_string()
    } else {
        format!("0x{}", hex)
    }
}

pub fn is_ledger_hash(value: &str) -> bool {
    LEDGER_HASH_REGEX.is_match(value)
}

pub fn is_contract_address(value: &str) -> bool {
    CONTRACT_ADDRESS_REGEX.is_match(value)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintResponse {
    ip_id: String,
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    #[serde(alias = "error")]
    message: String,
}

/// Registrar backed by a mint-and-register HTTP gateway
pub struct GatewayRegistrar {
    http_client: reqwest::Client,
    base_url: String,
    spg_nft_contract: String,
    network: String,
}

impl GatewayRegistrar {
    pub fn new(
        base_url: impl Into<String>,
        spg_nft_contract: impl Into<String>,
        network: impl Into<String>,
    ) -> Result<Self, RegistrationError> {
        Self::with_timeout(base_url, spg_nft_contract, network, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        spg_nft_contract: impl Into<String>,
        network: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RegistrationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RegistrationError::Transaction(format!("client setup: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            spg_nft_contract: spg_nft_contract.into(),
            network: network.into(),
        })
    }

    /// Reject requests the ledger would refuse anyway
    fn preflight(&self, request: &RegistrationRequest) -> Result<(), RegistrationError> {
        if self.base_url.is_empty() {
            return Err(RegistrationError::Transaction(
                "ledger gateway URL not configured".to_string(),
            ));
        }
        if !is_contract_address(&self.spg_nft_contract) {
            return Err(RegistrationError::ContractReference(format!(
                "collection contract '{}' is not a 20-byte hex address",
                self.spg_nft_contract
            )));
        }
        for (name, hash) in [("ip", &request.ip_hash), ("display", &request.display_hash)] {
            if !is_ledger_hash(hash) {
                return Err(RegistrationError::HashFormat(format!(
                    "{} metadata hash '{}' is not 32 bytes of 0x-prefixed hex",
                    name, hash
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRegistrar for GatewayRegistrar {
    async fn register_asset(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        self.preflight(request)?;

        let url = format!("{}{}", self.base_url, MINT_AND_REGISTER_PATH);
        let body = json!({
            "spgNftContract": self.spg_nft_contract,
            "allowDuplicates": true,
            "network": self.network,
            "ipMetadata": {
                "ipMetadataURI": request.ip_uri,
                "ipMetadataHash": request.ip_hash,
                "nftMetadataURI": request.display_uri,
                "nftMetadataHash": request.display_hash,
            },
            "txOptions": { "waitForTransaction": true },
        });

        tracing::debug!(network = %self.network, ip_uri = %request.ip_uri, "Submitting registration");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RegistrationError::Transaction(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GatewayErrorBody>(&text)
                .map(|b| b.message)
                .unwrap_or(text);
            return Err(RegistrationError::classify(format!(
                "gateway returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let minted: MintResponse = response
            .json()
            .await
            .map_err(|e| RegistrationError::Transaction(format!("unreadable response: {}", e)))?;

        tracing::info!(asset_id = %minted.ip_id, tx = %minted.tx_hash, "IP asset registered");

        Ok(RegistrationReceipt {
            asset_id: minted.ip_id,
            transaction_receipt: minted.tx_hash,
        })
    }
}
