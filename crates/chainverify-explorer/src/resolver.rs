//! End-to-end reconstruction of verification inputs.

use std::sync::Arc;

use chainverify_core::builder::build_verification_input;
use chainverify_core::config::{ChainMetadata, ChainRegistry};
use chainverify_core::proxy::{
    storage_to_address, EIP1967_ADMIN_SLOT, EIP1967_IMPL_SLOT, PROXY_ADMIN_NAME,
    TRANSPARENT_PROXY_NAME,
};
use chainverify_core::{VerificationInput, VerifyError};

use crate::client::ExplorerClient;
use crate::strategy::StrategyTable;

/// Verification inputs for a transparent proxy and its admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAndAdminInputs {
    pub proxy_admin: VerificationInput,
    pub transparent_upgradeable_proxy: VerificationInput,
}

/// Recovers constructor arguments for deployed contracts and turns them into
/// [`VerificationInput`]s.
///
/// Calls run one after another; nothing is shared between calls besides the
/// configuration and the client's throttle.
#[derive(Debug, Clone)]
pub struct ConstructorArgsResolver {
    registry: Arc<ChainRegistry>,
    client: ExplorerClient,
    strategies: StrategyTable,
}

impl ConstructorArgsResolver {
    /// Resolver with the default family → strategy table.
    pub fn new(registry: Arc<ChainRegistry>, client: ExplorerClient) -> Self {
        Self {
            registry,
            client,
            strategies: StrategyTable::default(),
        }
    }

    pub fn with_strategies(mut self, strategies: StrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn client(&self) -> &ExplorerClient {
        &self.client
    }

    /// Constructor arguments of `address` on `chain`, hex without `0x`.
    pub async fn constructor_arguments(
        &self,
        chain: &str,
        address: &str,
        bytecode: &str,
    ) -> Result<String, VerifyError> {
        let metadata = self.registry.get(chain)?;
        self.constructor_arguments_for(metadata, address, bytecode).await
    }

    async fn constructor_arguments_for(
        &self,
        metadata: &ChainMetadata,
        address: &str,
        bytecode: &str,
    ) -> Result<String, VerifyError> {
        let family = metadata.explorer_api()?.family;
        let strategy = self.strategies.get(family)?;
        let args = strategy
            .fetch_args(&self.client, metadata, address, bytecode)
            .await?;
        tracing::info!(
            chain = %metadata.name,
            %family,
            address,
            args_len = args.len(),
            "recovered constructor arguments"
        );
        Ok(args)
    }

    /// Verification input for an implementation contract.
    pub async fn implementation_input(
        &self,
        chain: &str,
        contract_name: &str,
        implementation_address: &str,
        bytecode: &str,
    ) -> Result<VerificationInput, VerifyError> {
        let args = self
            .constructor_arguments(chain, implementation_address, bytecode)
            .await?;
        Ok(build_verification_input(
            contract_name,
            implementation_address,
            &args,
            None,
            None,
        ))
    }

    /// Verification inputs for a transparent upgradeable proxy and the
    /// ProxyAdmin that controls it.
    ///
    /// The admin and implementation addresses are read from the proxy's
    /// EIP-1967 storage slots.
    pub async fn proxy_and_admin_inputs(
        &self,
        chain: &str,
        proxy_address: &str,
        proxy_admin_bytecode: &str,
        proxy_bytecode: &str,
    ) -> Result<ProxyAndAdminInputs, VerifyError> {
        let metadata = self.registry.get(chain)?;

        let admin_address = self
            .read_address_slot(metadata, proxy_address, EIP1967_ADMIN_SLOT, "admin")
            .await?;
        let admin_args = self
            .constructor_arguments_for(metadata, &admin_address, proxy_admin_bytecode)
            .await?;
        let proxy_admin = build_verification_input(
            PROXY_ADMIN_NAME,
            admin_address,
            &admin_args,
            None,
            None,
        );

        let proxy_args = self
            .constructor_arguments_for(metadata, proxy_address, proxy_bytecode)
            .await?;
        let implementation = self
            .read_address_slot(metadata, proxy_address, EIP1967_IMPL_SLOT, "implementation")
            .await?;
        let transparent_upgradeable_proxy = build_verification_input(
            TRANSPARENT_PROXY_NAME,
            proxy_address,
            &proxy_args,
            Some(true),
            Some(implementation),
        );

        Ok(ProxyAndAdminInputs {
            proxy_admin,
            transparent_upgradeable_proxy,
        })
    }

    async fn read_address_slot(
        &self,
        metadata: &ChainMetadata,
        proxy_address: &str,
        slot: &str,
        label: &str,
    ) -> Result<String, VerifyError> {
        let word = self.client.get_storage_at(metadata, proxy_address, slot).await?;
        storage_to_address(&word).ok_or_else(|| VerifyError::MissingField {
            field: format!("EIP-1967 {label} slot of {proxy_address} (got {word})"),
        })
    }
}
