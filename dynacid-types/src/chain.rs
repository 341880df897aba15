//! Chain records from the ethereum-lists chain registry, as pinned on IPFS.
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::ChainId;

/// Root of the pinned copy of <https://github.com/ethereum-lists/chains/tree/master/_data/chains>.
pub const DEFAULT_CHAINS_CID: &str = "bafybeigopbjf4ilivoqyzrijehjbgwjriwpn3wl3vgelk7skgr3bl7xcim";

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRecord {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub chain_id: Option<ChainId>,

    /// RPC endpoints, in the registry's order of preference.
    pub rpc: Vec<String>,
}

impl ChainRecord {
    /// The endpoint to use. Only the first listed one is ever considered.
    pub fn first_rpc(&self) -> Option<&str> {
        self.rpc.first().map(String::as_str)
    }
}

/// Path of the record for `chain_id` below the registry root `chains_cid`.
pub fn chain_record_path(
    chains_cid: &str,
    chain_id: ChainId,
) -> String {
    format!("{chains_cid}/eip155-{chain_id}.json")
}
