//! Pointer documents: content-addressed descriptions of a read-only contract call.
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;

use crate::ChainId;

/// A contract read-call published on the content-addressed store.
///
/// Pointer documents are untrusted input: address, ABI and method come verbatim from whoever
/// published the document, and are only checked when the call is actually made.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerDocument {
    /// Chain to run the call against.
    #[serde(rename = "blockchainID")]
    pub blockchain_id: ChainId,

    /// JSON ABI of the contract, or at least of the called function.
    pub contract_abi: Value,

    /// Documents published for the first deployment spell this `contractAccress`.
    #[serde(alias = "contractAccress")]
    pub contract_address: String,

    pub get_function: GetFunction,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFunction {
    pub function_name: String,

    /// Positional arguments, tokenized against the ABI input types at call time.
    #[serde(default)]
    pub input_args: Vec<Value>,

    /// If set, the call result is a uint256 holding a SHA2-256 digest, returned as a CIDv0.
    #[serde(default)]
    pub return_uint256_as_cidv0: bool,
}
