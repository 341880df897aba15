use dynacid_types::pointer::PointerDocument;

use crate::gateway::fetch_json;
use crate::gateway::ContentFetcher;
use crate::ResolveError;

/// Fetches and parses the pointer document stored under `cid`.
///
/// Only the JSON shape is checked here. Whether the address, ABI and method make sense is found
/// out when the call is made.
pub async fn resolve_pointer(
    fetcher: &dyn ContentFetcher,
    cid: &str,
) -> Result<PointerDocument, ResolveError> {
    fetch_json(fetcher, cid)
        .await
        .map_err(ResolveError::upstream)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::tests::StaticFetcher;

    #[tokio::test]
    async fn test_resolve_pointer() {
        let fetcher = StaticFetcher::default()
            .with_json(
                "QmPointer",
                json!({
                    "blockchainID": 137,
                    "contractAbi": [],
                    "contractAddress": "0x0000000000000000000000000000000000000001",
                    "getFunction": { "functionName": "f", "inputArgs": [] }
                }),
            )
            .with_json("QmNotAPointer", json!({ "hello": "world" }));

        let doc = resolve_pointer(&fetcher, "QmPointer").await.unwrap();
        assert_eq!(doc.blockchain_id, 137);

        let err = resolve_pointer(&fetcher, "QmNotAPointer").await.unwrap_err();
        assert!(matches!(err, ResolveError::Upstream(_)), "{err:?}");

        let err = resolve_pointer(&fetcher, "QmMissing").await.unwrap_err();
        assert!(matches!(err, ResolveError::Upstream(_)), "{err:?}");
    }
}
