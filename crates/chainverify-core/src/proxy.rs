//! EIP-1967 transparent-proxy storage slots.
//!
//! A transparent upgradeable proxy stores its admin and implementation
//! addresses at fixed slots. Reading them with `eth_getStorageAt` is how the
//! ProxyAdmin and implementation contracts behind a proxy are discovered.

/// `keccak256("eip1967.proxy.implementation") - 1`
pub const EIP1967_IMPL_SLOT: &str =
    "0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";

/// `keccak256("eip1967.proxy.admin") - 1`
pub const EIP1967_ADMIN_SLOT: &str =
    "0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103";

/// Contract name recorded for the proxy admin.
pub const PROXY_ADMIN_NAME: &str = "ProxyAdmin";

/// Contract name recorded for the proxy itself.
pub const TRANSPARENT_PROXY_NAME: &str = "TransparentUpgradeableProxy";

/// Extract the address held in a 32-byte storage word.
///
/// Returns `None` unless the upper 12 bytes are zero and the address is
/// non-zero.
pub fn storage_to_address(slot_value: &str) -> Option<String> {
    let hex = crate::decoder::strip_hex_prefix(slot_value);
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let (padding, addr) = hex.split_at(24);
    if padding.chars().all(|c| c == '0') && !addr.chars().all(|c| c == '0') {
        Some(format!("0x{}", addr.to_ascii_lowercase()))
    } else {
        None
    }
}
