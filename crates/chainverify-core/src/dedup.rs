//! Duplicate filtering for per-chain verification input lists.

use std::collections::HashMap;

use crate::types::VerificationInput;

/// Chain name → value.
pub type ChainMap<T> = HashMap<String, T>;

/// Case-insensitive address comparison, ignoring a `0x` prefix.
pub fn eq_address(a: &str, b: &str) -> bool {
    crate::decoder::strip_hex_prefix(a).eq_ignore_ascii_case(crate::decoder::strip_hex_prefix(b))
}

impl VerificationInput {
    /// Identity used for deduplication: name, address, arguments, proxy flag.
    /// `expected_implementation` is not part of it.
    pub fn same_artifact(&self, other: &VerificationInput) -> bool {
        self.name == other.name
            && eq_address(&self.address, &other.address)
            && self.constructor_arguments == other.constructor_arguments
            && self.is_proxy == other.is_proxy
    }
}

/// Returns `false` iff `inputs[chain]` already holds an entry with the same
/// identity as `candidate`. Does not modify `inputs`.
pub fn should_add_verification_input(
    inputs: &ChainMap<Vec<VerificationInput>>,
    chain: &str,
    candidate: &VerificationInput,
) -> bool {
    inputs
        .get(chain)
        .map_or(true, |existing| !existing.iter().any(|e| e.same_artifact(candidate)))
}

/// Append `candidate` to `inputs[chain]` unless an identical entry exists.
///
/// Returns `true` if it was added.
pub fn add_verification_input(
    inputs: &mut ChainMap<Vec<VerificationInput>>,
    chain: &str,
    candidate: VerificationInput,
) -> bool {
    if !should_add_verification_input(inputs, chain, &candidate) {
        tracing::debug!(chain, name = %candidate.name, "skipping duplicate verification input");
        return false;
    }
    inputs.entry(chain.to_string()).or_default().push(candidate);
    true
}
