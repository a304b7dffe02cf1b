//! Explorer and RPC requests needed to recover constructor arguments.
//!
//! Every explorer request first waits on the injected [`Throttle`]; RPC
//! requests go straight to the node. There is no retry here: callers inspect
//! [`VerifyError::is_retryable`] and decide.

use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

use chainverify_core::config::{ChainMetadata, ExplorerSettings};
use chainverify_core::decoder::normalize_hex;
use chainverify_core::policy::Throttle;
use chainverify_core::types::{ChainExplorerConfig, ExplorerFamily, RawCreationTx};
use chainverify_core::VerifyError;

use crate::http::{HttpFetch, ReqwestFetch};
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// ZKSync explorers publish the verification endpoint as their API URL; the
/// Etherscan-compatible API lives next to it.
const ZKSYNC_VERIFICATION_PATH: &str = "verification/contract_verification";
const ZKSYNC_API_PATH: &str = "api";

/// Issues explorer and JSON-RPC requests for one verification run.
#[derive(Clone)]
pub struct ExplorerClient {
    http: Arc<dyn HttpFetch>,
    throttle: Arc<dyn Throttle>,
}

impl ExplorerClient {
    pub fn new(http: Arc<dyn HttpFetch>, throttle: Arc<dyn Throttle>) -> Self {
        Self { http, throttle }
    }

    /// Client using `reqwest` with pacing and timeout from `settings`.
    pub fn from_settings(settings: &ExplorerSettings) -> Result<Self, VerifyError> {
        let http = ReqwestFetch::new(settings.request_timeout())?;
        Ok(Self::new(Arc::new(http), settings.pacing.build()?))
    }

    /// Look up the hash of the transaction that created `address`.
    pub async fn fetch_creation_tx(
        &self,
        chain: &ChainMetadata,
        address: &str,
    ) -> Result<String, VerifyError> {
        let explorer = chain.explorer_api()?;
        let url = creation_tx_url(explorer, address)?;

        self.throttle.acquire().await;
        tracing::debug!(
            chain = %chain.name,
            host = url.host_str().unwrap_or_default(),
            path = url.path(),
            address,
            "fetching contract creation tx"
        );
        let body = self.http.get_json(&url).await?;

        match body["result"][0]["txHash"].as_str() {
            Some(tx_hash) if !tx_hash.is_empty() => {
                tracing::debug!(chain = %chain.name, address, tx_hash, "found creation tx");
                Ok(tx_hash.to_string())
            }
            _ => {
                tracing::warn!(
                    chain = %chain.name,
                    address,
                    explorer_message = body["message"].as_str().unwrap_or_default(),
                    "contract creation transaction not found"
                );
                Err(VerifyError::CreationTxNotFound {
                    chain: chain.name.clone(),
                    address: address.to_string(),
                })
            }
        }
    }

    /// Fetch the raw `input` of a transaction from the chain's RPC node.
    pub async fn fetch_transaction_input(
        &self,
        chain: &ChainMetadata,
        tx_hash: &str,
    ) -> Result<String, VerifyError> {
        let tx = self
            .rpc_call(chain, "eth_getTransactionByHash", vec![json!(tx_hash)])
            .await?;
        if tx.is_null() {
            return Err(VerifyError::MissingField {
                field: "result".into(),
            });
        }
        tx["input"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| VerifyError::MissingField {
                field: "result.input".into(),
            })
    }

    /// Creation tx hash followed by its input.
    pub async fn fetch_creation_tx_input(
        &self,
        chain: &ChainMetadata,
        address: &str,
    ) -> Result<RawCreationTx, VerifyError> {
        let tx_hash = self.fetch_creation_tx(chain, address).await?;
        let input = self.fetch_transaction_input(chain, &tx_hash).await?;
        Ok(RawCreationTx { tx_hash, input })
    }

    /// Constructor arguments as indexed by a Blockscout explorer.
    ///
    /// This is an explorer API call, so it waits on the throttle like the
    /// creation-tx lookup. Blockscout instances enforce per-IP limits of their
    /// own; inject [`chainverify_core::policy::Unthrottled`] or a faster
    /// [`chainverify_core::policy::RateLimiter`] to skip the default delay.
    pub async fn fetch_blockscout_constructor_args(
        &self,
        chain: &ChainMetadata,
        address: &str,
    ) -> Result<String, VerifyError> {
        let explorer = chain.explorer_api()?;
        let url = blockscout_contract_url(explorer, address)?;

        self.throttle.acquire().await;
        tracing::debug!(chain = %chain.name, url = %url, "fetching smart contract from blockscout");
        let body = self.http.get_json(&url).await?;

        match &body["constructor_args"] {
            Value::String(args) => Ok(normalize_hex(args)),
            // Contracts deployed without arguments.
            Value::Null => Ok(String::new()),
            other => Err(VerifyError::MissingField {
                field: format!("constructor_args (got {other})"),
            }),
        }
    }

    /// `eth_getStorageAt(address, slot, "latest")`.
    pub async fn get_storage_at(
        &self,
        chain: &ChainMetadata,
        address: &str,
        slot: &str,
    ) -> Result<String, VerifyError> {
        let value = self
            .rpc_call(
                chain,
                "eth_getStorageAt",
                vec![json!(address), json!(slot), json!("latest")],
            )
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| VerifyError::MissingField {
                field: "result".into(),
            })
    }

    async fn rpc_call(
        &self,
        chain: &ChainMetadata,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, VerifyError> {
        let url = parse_url(chain.rpc_url()?)?;
        let req = JsonRpcRequest::new(1, method, params);
        let body = self.http.post_json(&url, &serde_json::to_value(&req)?).await?;
        let resp: JsonRpcResponse = serde_json::from_value(body)?;
        resp.into_result()
    }
}

impl std::fmt::Debug for ExplorerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerClient").finish_non_exhaustive()
    }
}

/// `<apiUrl>?module=contract&action=getcontractcreation&contractaddresses=<address>[&apikey=<key>]`
pub fn creation_tx_url(explorer: &ChainExplorerConfig, address: &str) -> Result<Url, VerifyError> {
    let base = match explorer.family {
        ExplorerFamily::ZkSync => explorer
            .api_url
            .replace(ZKSYNC_VERIFICATION_PATH, ZKSYNC_API_PATH),
        _ => explorer.api_url.clone(),
    };
    let mut url = parse_url(&base)?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("module", "contract")
            .append_pair("action", "getcontractcreation")
            .append_pair("contractaddresses", address);
        if let Some(key) = explorer.api_key.as_deref().filter(|k| !k.is_empty()) {
            query.append_pair("apikey", key);
        }
    }
    Ok(url)
}

/// `/api/v2/smart-contracts/<address>` on the explorer's host.
pub fn blockscout_contract_url(
    explorer: &ChainExplorerConfig,
    address: &str,
) -> Result<Url, VerifyError> {
    let base = parse_url(&explorer.api_url)?;
    let path = format!("/api/v2/smart-contracts/{address}");
    base.join(&path).map_err(|e| VerifyError::InvalidUrl {
        url: path,
        reason: e.to_string(),
    })
}

fn parse_url(s: &str) -> Result<Url, VerifyError> {
    Url::parse(s).map_err(|e| VerifyError::InvalidUrl {
        url: s.to_string(),
        reason: e.to_string(),
    })
}
