//! chainverify-explorer — recovers constructor arguments of deployed
//! contracts from block explorers and RPC nodes.
//!
//! # Flow
//! ```text
//! chain's explorer family
//!   → StrategyTable picks a strategy
//!   → ExplorerClient: creation tx hash (explorer) → tx input (RPC)
//!   → decoder strips bytecode / decodes create(...)
//!   → VerificationInput
//! ```
//!
//! # Quick start
//! ```rust,no_run
//! use std::sync::Arc;
//! use chainverify_core::{ChainRegistry, ExplorerSettings};
//! use chainverify_explorer::{ConstructorArgsResolver, ExplorerClient};
//!
//! # async fn run() -> Result<(), chainverify_core::VerifyError> {
//! let registry = Arc::new(ChainRegistry::from_path("chains.yaml")?);
//! let client = ExplorerClient::from_settings(&ExplorerSettings::default())?;
//! let resolver = ConstructorArgsResolver::new(registry, client);
//! let input = resolver
//!     .implementation_input("ethereum", "Mailbox", "0xc005dc82818d67af737725bd4bf75435d065d239", "0x6080...")
//!     .await?;
//! # Ok(()) }
//! ```

pub mod client;
pub mod http;
pub mod request;
pub mod resolver;
pub mod strategy;

pub use client::ExplorerClient;
pub use http::{HttpFetch, ReqwestFetch};
pub use request::{JsonRpcRequest, JsonRpcResponse, RpcId};
pub use resolver::{ConstructorArgsResolver, ProxyAndAdminInputs};
pub use strategy::{
    BlockscoutStrategy, BytecodeStripStrategy, ConstructorArgsStrategy, StrategyTable,
    ZkSyncCreateStrategy,
};
