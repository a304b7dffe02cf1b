//! Error types for the verification-argument pipeline.

use thiserror::Error;

use crate::types::ExplorerFamily;

/// Errors that can occur while reconstructing a verification input.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// HTTP request failed (connection refused, non-2xx status, bad body).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Response body could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The explorer has no creation transaction for the address.
    #[error("Contract creation transaction not found for {address} on {chain}")]
    CreationTxNotFound { chain: String, address: String },

    /// An expected field is absent from an explorer or RPC response.
    #[error("Missing field in response: {field}")]
    MissingField { field: String },

    #[error("ABI encoding failed: {reason}")]
    AbiEncoding { reason: String },

    #[error("ABI decoding failed: {reason}")]
    AbiDecoding { reason: String },

    /// Calldata does not start with the selector of the expected function.
    #[error("Selector mismatch: expected 0x{expected}, got 0x{got}")]
    SelectorMismatch { expected: String, got: String },

    /// No argument strategy is registered for the explorer family.
    #[error("Explorer family {family} unsupported")]
    UnsupportedFamily { family: ExplorerFamily },

    #[error("Unknown chain: {chain}")]
    UnknownChain { chain: String },

    #[error("No RPC URL configured for chain {chain}")]
    MissingRpcUrl { chain: String },

    #[error("No block explorer configured for chain {chain}")]
    MissingExplorer { chain: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifyError {
    /// Returns `true` if retrying the same call later may succeed.
    ///
    /// A missing creation transaction is treated as transient: explorers
    /// commonly lag behind the chain head, so "not indexed yet" and
    /// "never existed" look identical from a single response.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::CreationTxNotFound { .. }
        )
    }

    /// Returns `true` for failures caused by malformed ABI data.
    pub fn is_abi_error(&self) -> bool {
        matches!(
            self,
            Self::AbiEncoding { .. } | Self::AbiDecoding { .. } | Self::SelectorMismatch { .. }
        )
    }
}
