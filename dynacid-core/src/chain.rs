use dynacid_types::chain::chain_record_path;
use dynacid_types::chain::ChainRecord;
use dynacid_types::ChainId;
use tracing::debug;

use crate::gateway::fetch_json;
use crate::gateway::ContentFetcher;
use crate::ResolveError;

/// Looks up RPC endpoints in the chain registry pinned under `chains_cid`.
///
/// Records are fetched on every call; nothing is cached.
#[derive(Clone, Debug)]
pub struct ChainEndpointResolver {
    chains_cid: String,
}

impl ChainEndpointResolver {
    pub fn new(chains_cid: impl Into<String>) -> Self {
        Self {
            chains_cid: chains_cid.into(),
        }
    }

    /// Returns the first RPC endpoint listed for `chain_id`. No health checks, no fallback.
    pub async fn resolve_endpoint(
        &self,
        fetcher: &dyn ContentFetcher,
        chain_id: ChainId,
    ) -> Result<String, ResolveError> {
        let path = chain_record_path(&self.chains_cid, chain_id);
        let record: ChainRecord = fetch_json(fetcher, &path)
            .await
            .map_err(ResolveError::upstream)?;

        let endpoint = record.first_rpc().ok_or_else(|| {
            ResolveError::Upstream(format!("chain {chain_id} lists no RPC endpoint"))
        })?;

        debug!("chain {chain_id} served by {endpoint}");
        Ok(endpoint.to_string())
    }
}
