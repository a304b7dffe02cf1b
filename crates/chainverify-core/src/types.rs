//! Core data types: explorer families, explorer config, verification records.

use serde::{Deserialize, Serialize};

/// Block-explorer API dialect.
///
/// The family decides how constructor arguments are recovered for a chain.
/// `Voyager` and `Other` are recognised in configuration but have no
/// argument strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorerFamily {
    Etherscan,
    Routescan,
    Blockscout,
    #[serde(rename = "zksync")]
    ZkSync,
    Voyager,
    Other,
}

impl ExplorerFamily {
    pub const ALL: [ExplorerFamily; 6] = [
        Self::Etherscan,
        Self::Routescan,
        Self::Blockscout,
        Self::ZkSync,
        Self::Voyager,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Etherscan => "etherscan",
            Self::Routescan => "routescan",
            Self::Blockscout => "blockscout",
            Self::ZkSync => "zksync",
            Self::Voyager => "voyager",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ExplorerFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExplorerFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown explorer family '{s}'"))
    }
}

/// Block-explorer API settings for one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainExplorerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human-facing explorer URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Base URL of the explorer's API.
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub family: ExplorerFamily,
}

impl ChainExplorerConfig {
    pub fn new(api_url: impl Into<String>, family: ExplorerFamily) -> Self {
        Self {
            name: None,
            url: None,
            api_url: api_url.into(),
            api_key: None,
            family,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// A contract's creation transaction as fetched from the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCreationTx {
    pub tx_hash: String,
    /// Raw transaction input, as returned by the node (0x-prefixed hex).
    pub input: String,
}

/// Normalized record consumed by a verification submitter.
///
/// Field names on the wire are `name`, `address`, `constructorArguments`,
/// `isProxy` and `expectedimplementation`. The last one is all lowercase, as
/// the submitter expects; the rest are camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationInput {
    pub name: String,
    pub address: String,
    /// ABI-encoded constructor arguments, hex without a `0x` prefix.
    pub constructor_arguments: String,
    pub is_proxy: bool,
    #[serde(
        rename = "expectedimplementation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_implementation: Option<String>,
}
