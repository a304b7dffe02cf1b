//! Chain and explorer configuration.
//!
//! Configuration is loaded once and passed explicitly into the explorer
//! client and resolver; nothing here is global.
//!
//! A registry file maps chain names to chain metadata:
//! ```yaml
//! ethereum:
//!   chainId: 1
//!   rpcUrls:
//!     - http: https://eth.llamarpc.com
//!   blockExplorers:
//!     - apiUrl: https://api.etherscan.io/api
//!       family: etherscan
//! ```
//! API keys and RPC URLs can be supplied through the environment:
//! `CHAINVERIFY_EXPLORER_API_KEY_<CHAIN>` and `CHAINVERIFY_RPC_<CHAIN>`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::VerifyError;
use crate::policy::{FixedDelay, RateLimiter, RateLimiterConfig, Throttle, Unthrottled};
use crate::types::ChainExplorerConfig;

/// One RPC endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcUrl {
    pub http: String,
}

/// What this crate needs to know about a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadata {
    /// Filled from the registry key when omitted.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub rpc_urls: Vec<RpcUrl>,
    #[serde(default)]
    pub block_explorers: Vec<ChainExplorerConfig>,
}

impl ChainMetadata {
    pub fn new(name: impl Into<String>, rpc_url: impl Into<String>, explorer: ChainExplorerConfig) -> Self {
        Self {
            name: name.into(),
            chain_id: None,
            rpc_urls: vec![RpcUrl { http: rpc_url.into() }],
            block_explorers: vec![explorer],
        }
    }

    /// The explorer used for API calls (the first one listed).
    pub fn explorer_api(&self) -> Result<&ChainExplorerConfig, VerifyError> {
        self.block_explorers
            .first()
            .ok_or_else(|| VerifyError::MissingExplorer {
                chain: self.name.clone(),
            })
    }

    /// The RPC endpoint used for node calls (the first one listed).
    pub fn rpc_url(&self) -> Result<&str, VerifyError> {
        self.rpc_urls
            .first()
            .map(|u| u.http.as_str())
            .ok_or_else(|| VerifyError::MissingRpcUrl {
                chain: self.name.clone(),
            })
    }
}

/// Chain name → [`ChainMetadata`].
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: HashMap<String, ChainMetadata>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metadata: ChainMetadata) {
        self.chains.insert(metadata.name.clone(), metadata);
    }

    pub fn get(&self, chain: &str) -> Result<&ChainMetadata, VerifyError> {
        self.chains.get(chain).ok_or_else(|| VerifyError::UnknownChain {
            chain: chain.to_string(),
        })
    }

    /// Sorted chain names.
    pub fn chain_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.chains.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn from_json_str(s: &str) -> Result<Self, VerifyError> {
        let chains: HashMap<String, ChainMetadata> = serde_json::from_str(s)?;
        Ok(Self::from_map(chains))
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, VerifyError> {
        let chains: HashMap<String, ChainMetadata> =
            serde_yaml::from_str(s).map_err(|e| VerifyError::Config(format!("invalid YAML: {e}")))?;
        Ok(Self::from_map(chains))
    }

    /// Load a registry file; `.yaml` / `.yml` are parsed as YAML, anything
    /// else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, VerifyError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let registry = if is_yaml {
            Self::from_yaml_str(&contents)?
        } else {
            Self::from_json_str(&contents)?
        };
        tracing::debug!(path = %path.display(), chains = registry.len(), "loaded chain registry");
        Ok(registry)
    }

    /// Apply `CHAINVERIFY_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` to read variables.
    ///
    /// `CHAINVERIFY_EXPLORER_API_KEY_<CHAIN>` replaces the first explorer's
    /// API key; `CHAINVERIFY_RPC_<CHAIN>` becomes the first RPC URL. `<CHAIN>`
    /// is the chain name uppercased with `-` replaced by `_`.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (name, metadata) in self.chains.iter_mut() {
            let suffix = env_suffix(name);
            if let Some(key) = lookup(&format!("CHAINVERIFY_EXPLORER_API_KEY_{suffix}")) {
                if let Some(explorer) = metadata.block_explorers.first_mut() {
                    explorer.api_key = Some(key);
                }
            }
            if let Some(url) = lookup(&format!("CHAINVERIFY_RPC_{suffix}")) {
                metadata.rpc_urls.insert(0, RpcUrl { http: url });
            }
        }
    }

    fn from_map(chains: HashMap<String, ChainMetadata>) -> Self {
        let chains = chains
            .into_iter()
            .map(|(key, mut metadata)| {
                if metadata.name.is_empty() {
                    metadata.name = key.clone();
                }
                (key, metadata)
            })
            .collect();
        Self { chains }
    }
}

fn env_suffix(chain: &str) -> String {
    chain.to_uppercase().replace('-', "_")
}

/// How explorer requests are paced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Pacing {
    /// Unconditional sleep before every request.
    FixedDelay { ms: u64 },
    /// Token bucket: burst of `capacity`, refilled at `refillPerSec`.
    TokenBucket {
        capacity: f64,
        #[serde(rename = "refillPerSec")]
        refill_per_sec: f64,
    },
    None,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::FixedDelay { ms: 6_000 }
    }
}

impl Pacing {
    /// Build the throttle this pacing describes.
    pub fn build(&self) -> Result<Arc<dyn Throttle>, VerifyError> {
        match *self {
            Self::FixedDelay { ms } => Ok(Arc::new(FixedDelay::new(Duration::from_millis(ms)))),
            Self::TokenBucket {
                capacity,
                refill_per_sec,
            } => Ok(Arc::new(RateLimiter::try_new(RateLimiterConfig {
                capacity,
                refill_rate: refill_per_sec,
            })?)),
            Self::None => Ok(Arc::new(Unthrottled)),
        }
    }
}

/// Settings for the explorer client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerSettings {
    #[serde(default)]
    pub pacing: Pacing,
    /// Per-request HTTP timeout. Unset means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl ExplorerSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
