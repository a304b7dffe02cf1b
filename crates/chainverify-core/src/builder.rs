//! Construction of [`VerificationInput`] records.

use serde_json::Value;

use crate::decoder::{encode_constructor_args, normalize_hex, strip_bytecode_prefix};
use crate::error::VerifyError;
use crate::types::VerificationInput;

/// Suffix that marks a contract as an upgradeable proxy by name.
pub const PROXY_SUFFIX: &str = "Proxy";

/// Build a verification record.
///
/// The first character of `name` is uppercased, nothing else is touched.
/// `is_proxy` defaults to whether `name` ends with `"Proxy"`.
pub fn build_verification_input(
    name: &str,
    address: impl Into<String>,
    constructor_arguments: &str,
    is_proxy: Option<bool>,
    expected_implementation: Option<String>,
) -> VerificationInput {
    VerificationInput {
        name: capitalize(name),
        address: address.into(),
        constructor_arguments: normalize_hex(constructor_arguments),
        is_proxy: is_proxy.unwrap_or_else(|| name.ends_with(PROXY_SUFFIX)),
        expected_implementation,
    }
}

/// Build a record for a contract whose deployment transaction data is known
/// locally: the arguments are the data minus the creation bytecode.
pub fn contract_verification_input(
    name: &str,
    address: impl Into<String>,
    deploy_data: &str,
    bytecode: &str,
    is_proxy: Option<bool>,
    expected_implementation: Option<String>,
) -> VerificationInput {
    let args = strip_bytecode_prefix(deploy_data, bytecode);
    build_verification_input(name, address, &args, is_proxy, expected_implementation)
}

/// Build a record for a ZKSync deployment, re-encoding the deploy arguments
/// against the artifact's ABI.
pub fn zksync_contract_verification_input(
    name: &str,
    address: impl Into<String>,
    abi_json: &str,
    constructor_args: &[Value],
    is_proxy: Option<bool>,
    expected_implementation: Option<String>,
) -> Result<VerificationInput, VerifyError> {
    let args = encode_constructor_args(abi_json, constructor_args)?;
    Ok(build_verification_input(
        name,
        address,
        &args,
        is_proxy,
        expected_implementation,
    ))
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
