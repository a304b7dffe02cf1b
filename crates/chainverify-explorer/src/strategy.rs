//! Explorer family → constructor-argument strategy.
//!
//! | Family                | Strategy                    |
//! |-----------------------|-----------------------------|
//! | Etherscan, Routescan  | [`BytecodeStripStrategy`]   |
//! | Blockscout            | [`BlockscoutStrategy`]      |
//! | ZKSync                | [`ZkSyncCreateStrategy`]    |
//!
//! Further families are supported by registering a strategy on the table;
//! a family without one is rejected with `UnsupportedFamily`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use chainverify_core::config::ChainMetadata;
use chainverify_core::decoder::{decode_create_call, strip_bytecode_prefix};
use chainverify_core::types::ExplorerFamily;
use chainverify_core::VerifyError;

use crate::client::ExplorerClient;

/// Recovers the constructor arguments of a deployed contract.
#[async_trait]
pub trait ConstructorArgsStrategy: Send + Sync + 'static {
    /// Constructor arguments of `address` as hex without `0x`.
    ///
    /// `bytecode` is the contract's known creation bytecode; strategies that
    /// do not need it ignore it.
    async fn fetch_args(
        &self,
        client: &ExplorerClient,
        chain: &ChainMetadata,
        address: &str,
        bytecode: &str,
    ) -> Result<String, VerifyError>;
}

/// Creation tx input minus the known bytecode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytecodeStripStrategy;

#[async_trait]
impl ConstructorArgsStrategy for BytecodeStripStrategy {
    async fn fetch_args(
        &self,
        client: &ExplorerClient,
        chain: &ChainMetadata,
        address: &str,
        bytecode: &str,
    ) -> Result<String, VerifyError> {
        let tx = client.fetch_creation_tx_input(chain, address).await?;
        Ok(strip_bytecode_prefix(&tx.input, bytecode))
    }
}

/// Arguments as already decoded by Blockscout.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockscoutStrategy;

#[async_trait]
impl ConstructorArgsStrategy for BlockscoutStrategy {
    async fn fetch_args(
        &self,
        client: &ExplorerClient,
        chain: &ChainMetadata,
        address: &str,
        _bytecode: &str,
    ) -> Result<String, VerifyError> {
        client.fetch_blockscout_constructor_args(chain, address).await
    }
}

/// Third argument of the deployer's `create(bytes32,bytes32,bytes)` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZkSyncCreateStrategy;

#[async_trait]
impl ConstructorArgsStrategy for ZkSyncCreateStrategy {
    async fn fetch_args(
        &self,
        client: &ExplorerClient,
        chain: &ChainMetadata,
        address: &str,
        _bytecode: &str,
    ) -> Result<String, VerifyError> {
        let tx = client.fetch_creation_tx_input(chain, address).await?;
        decode_create_call(&tx.input)
    }
}

/// Dispatch table from explorer family to strategy.
#[derive(Clone)]
pub struct StrategyTable {
    strategies: HashMap<ExplorerFamily, Arc<dyn ConstructorArgsStrategy>>,
}

impl StrategyTable {
    /// A table with no strategies.
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Register `strategy` for `family`, returning the one it replaces.
    pub fn register(
        &mut self,
        family: ExplorerFamily,
        strategy: Arc<dyn ConstructorArgsStrategy>,
    ) -> Option<Arc<dyn ConstructorArgsStrategy>> {
        self.strategies.insert(family, strategy)
    }

    pub fn get(&self, family: ExplorerFamily) -> Result<Arc<dyn ConstructorArgsStrategy>, VerifyError> {
        self.strategies
            .get(&family)
            .cloned()
            .ok_or(VerifyError::UnsupportedFamily { family })
    }

    pub fn supports(&self, family: ExplorerFamily) -> bool {
        self.strategies.contains_key(&family)
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        let strip: Arc<dyn ConstructorArgsStrategy> = Arc::new(BytecodeStripStrategy);
        let mut table = Self::empty();
        table.register(ExplorerFamily::Etherscan, strip.clone());
        table.register(ExplorerFamily::Routescan, strip);
        table.register(ExplorerFamily::Blockscout, Arc::new(BlockscoutStrategy));
        table.register(ExplorerFamily::ZkSync, Arc::new(ZkSyncCreateStrategy));
        table
    }
}

impl std::fmt::Debug for StrategyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut families: Vec<&str> = self.strategies.keys().map(|f| f.as_str()).collect();
        families.sort_unstable();
        f.debug_struct("StrategyTable").field("families", &families).finish()
    }
}
