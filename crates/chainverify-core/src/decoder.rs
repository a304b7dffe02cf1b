//! Constructor-argument recovery and encoding.
//!
//! Two recovery strategies exist, chosen by explorer family:
//!
//! - **Bytecode strip** — a plain deployment transaction's input is
//!   `creation_bytecode ++ abi_encode(constructor_args)`, so the arguments are
//!   whatever follows the known bytecode.
//! - **Factory call** — on ZKSync, deployments go through the system deployer's
//!   `create(bytes32 salt, bytes32 bytecodeHash, bytes input)`; the arguments
//!   are the third parameter.
//!
//! Every function here returns hex without a `0x` prefix.

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_dyn_abi::Specifier;
use alloy_json_abi::{JsonAbi, Param};
use alloy_primitives::keccak256;
use serde_json::Value;

use crate::error::VerifyError;

/// Signature of the ZKSync contract deployer entrypoint.
pub const CREATE_SIGNATURE: &str = "create(bytes32,bytes32,bytes)";

/// Strip a single leading `0x` / `0X`.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Strip the `0x` prefix and lowercase.
pub fn normalize_hex(s: &str) -> String {
    strip_hex_prefix(s).to_ascii_lowercase()
}

/// Recover constructor arguments by removing the known creation bytecode
/// from the front of a deployment input.
///
/// When the input does not start with `bytecode` the (normalized) input is
/// returned unchanged. A compiler metadata hash that differs from the local
/// artifact is enough to cause this, and the result is then not a valid
/// argument encoding.
pub fn strip_bytecode_prefix(raw_input: &str, bytecode: &str) -> String {
    let input = normalize_hex(raw_input);
    let code = normalize_hex(bytecode);
    match input.strip_prefix(code.as_str()) {
        Some(args) => args.to_string(),
        None => {
            tracing::warn!(
                input_len = input.len(),
                bytecode_len = code.len(),
                "deployment input does not start with the known bytecode"
            );
            input
        }
    }
}

/// 4-byte selector of [`CREATE_SIGNATURE`].
pub fn create_selector() -> [u8; 4] {
    let hash = keccak256(CREATE_SIGNATURE.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Decode a `create(bytes32,bytes32,bytes)` call and return its third
/// argument as hex.
pub fn decode_create_call(raw_input: &str) -> Result<String, VerifyError> {
    let calldata = hex::decode(strip_hex_prefix(raw_input)).map_err(|e| {
        VerifyError::AbiDecoding {
            reason: format!("invalid calldata hex: {e}"),
        }
    })?;

    if calldata.len() < 4 {
        return Err(VerifyError::AbiDecoding {
            reason: format!(
                "calldata too short: {} bytes (need at least 4 for selector)",
                calldata.len()
            ),
        });
    }

    let expected = create_selector();
    if calldata[..4] != expected {
        return Err(VerifyError::SelectorMismatch {
            expected: hex::encode(expected),
            got: hex::encode(&calldata[..4]),
        });
    }

    let params = DynSolType::Tuple(vec![
        DynSolType::FixedBytes(32),
        DynSolType::FixedBytes(32),
        DynSolType::Bytes,
    ]);
    let decoded = params
        .abi_decode_params(&calldata[4..])
        .map_err(|e| VerifyError::AbiDecoding {
            reason: format!("create call: {e}"),
        })?;

    match decoded {
        DynSolValue::Tuple(mut values) if values.len() == 3 => match values.pop() {
            Some(DynSolValue::Bytes(input)) => Ok(hex::encode(input)),
            _ => Err(VerifyError::AbiDecoding {
                reason: "create call: third argument is not bytes".into(),
            }),
        },
        _ => Err(VerifyError::AbiDecoding {
            reason: "create call: unexpected parameter shape".into(),
        }),
    }
}

/// ABI-encode deploy arguments against the constructor in `abi_json`.
///
/// Arguments are JSON values: strings are parsed as Solidity literals for the
/// parameter type, numbers and booleans are taken as-is, arrays map to
/// Solidity arrays.
pub fn encode_constructor_args(abi_json: &str, args: &[Value]) -> Result<String, VerifyError> {
    let abi: JsonAbi = serde_json::from_str(abi_json).map_err(|e| VerifyError::AbiEncoding {
        reason: format!("invalid ABI JSON: {e}"),
    })?;

    let inputs: &[Param] = abi.constructor().map(|c| c.inputs.as_slice()).unwrap_or(&[]);
    if inputs.len() != args.len() {
        return Err(VerifyError::AbiEncoding {
            reason: format!(
                "cannot encode constructor args: constructor takes {}, got {}",
                inputs.len(),
                args.len()
            ),
        });
    }

    let mut values = Vec::with_capacity(args.len());
    for (i, (param, arg)) in inputs.iter().zip(args).enumerate() {
        let ty = param.resolve().map_err(|e| VerifyError::AbiEncoding {
            reason: format!("param {i}: {e}"),
        })?;
        let literal = json_to_literal(arg).ok_or_else(|| VerifyError::AbiEncoding {
            reason: format!("param '{}': unsupported JSON value {arg}", param.name),
        })?;
        let value = ty.coerce_str(&literal).map_err(|e| VerifyError::AbiEncoding {
            reason: format!("param '{}': {e}", param.name),
        })?;
        values.push(value);
    }

    Ok(hex::encode(DynSolValue::Tuple(values).abi_encode_params()))
}

/// Render a JSON value as a Solidity literal accepted by `coerce_str`.
fn json_to_literal(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts = items.iter().map(json_to_literal).collect::<Option<Vec<_>>>()?;
            Some(format!("[{}]", parts.join(",")))
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// Pretty JSON object pairing each input name with its argument.
///
/// Extra arguments are ignored; missing ones render as `null`.
pub fn format_function_arguments(inputs: &[Param], args: &[Value]) -> Result<String, VerifyError> {
    let params: serde_json::Map<String, Value> = inputs
        .iter()
        .enumerate()
        .map(|(i, input)| (input.name.clone(), args.get(i).cloned().unwrap_or(Value::Null)))
        .collect();
    Ok(serde_json::to_string_pretty(&params)?)
}
