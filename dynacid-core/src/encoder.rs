//! Re-encoding uint256 contract results as version-0 content identifiers.
use cid::multihash::Multihash;
use cid::Cid;
use ethers::types::U256;
use serde_json::Value;

use crate::ResolveError;

/// Multihash code of SHA2-256.
pub const SHA2_256: u64 = 0x12;

/// Codec every CIDv0 implicitly carries.
pub const DAG_PB: u64 = 0x70;

/// Returns `raw` unchanged, or its CIDv0 string when `as_cidv0` is set.
pub fn encode(
    raw: Value,
    as_cidv0: bool,
) -> Result<Value, ResolveError> {
    if !as_cidv0 {
        return Ok(raw);
    }

    let value = parse_uint(&raw)?;
    Ok(Value::String(uint256_to_cidv0(value)?.to_string()))
}

/// Treats the 32 big-endian bytes of `value` as a SHA2-256 digest and wraps it as a CIDv0.
pub fn uint256_to_cidv0(value: U256) -> Result<Cid, ResolveError> {
    let mut digest = [0u8; 32];
    value.to_big_endian(&mut digest);

    let hash = Multihash::<64>::wrap(SHA2_256, &digest)
        .map_err(|err| ResolveError::Encoding(format!("building multihash: {err}")))?;
    Cid::new_v0(hash).map_err(|err| ResolveError::Encoding(format!("building CIDv0: {err}")))
}

/// Accepts decimal strings, `0x` hex strings and non-negative JSON integers.
fn parse_uint(raw: &Value) -> Result<U256, ResolveError> {
    let parsed = match raw {
        Value::String(s) => {
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some("") => None,
                Some(hex) => U256::from_str_radix(hex, 16).ok(),
                None if s.is_empty() => None,
                None => U256::from_dec_str(s).ok(),
            }
        },
        Value::Number(n) => n.as_u64().map(U256::from),
        _ => None,
    };

    parsed.ok_or_else(|| ResolveError::Encoding(format!("`{raw}` is not an unsigned integer")))
}
