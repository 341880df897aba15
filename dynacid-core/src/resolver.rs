use std::sync::Arc;

use dynacid_types::alias::AliasUpdate;
use dynacid_types::reply::Resolution;
use serde_json::Value;
use tracing::debug;
use tracing::info;

use crate::alias::AliasRegistry;
use crate::chain::ChainEndpointResolver;
use crate::classify::classify;
use crate::classify::Identifier;
use crate::contract::ContractCaller;
use crate::encoder::encode;
use crate::gateway::ContentFetcher;
use crate::pointer::resolve_pointer;
use crate::ResolveError;

/// Runs the whole pipeline for one identifier at a time.
///
/// Holds no per-request state, so a single instance is shared by every request.
#[derive(Clone)]
pub struct Resolver {
    fetcher: Arc<dyn ContentFetcher>,
    caller: Arc<dyn ContractCaller>,
    chains: ChainEndpointResolver,
    aliases: AliasRegistry,
}

impl Resolver {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        caller: Arc<dyn ContractCaller>,
        chains: ChainEndpointResolver,
        aliases: AliasRegistry,
    ) -> Self {
        Self {
            fetcher,
            caller,
            chains,
            aliases,
        }
    }

    /// Resolves an alias to its stored value, or a content pointer to the value of the contract
    /// call it describes. Never touches the alias registry's contents.
    #[tracing::instrument(skip(self), err(Display))]
    pub async fn resolve(
        &self,
        identifier: &str,
    ) -> Result<Resolution, ResolveError> {
        match classify(identifier) {
            Identifier::Alias(alias) => self.resolve_alias(alias).await,
            Identifier::ContentPointer(cid) => self.resolve_content(cid).await,
        }
    }

    #[tracing::instrument(skip(self), err(Display))]
    pub async fn register_alias(&self) -> Result<String, ResolveError> {
        self.aliases.register().await
    }

    #[tracing::instrument(skip(self), err(Display))]
    pub async fn update_alias(
        &self,
        alias: &str,
        update: AliasUpdate,
    ) -> Result<String, ResolveError> {
        self.aliases.update(alias, update).await
    }

    async fn resolve_alias(
        &self,
        alias: &str,
    ) -> Result<Resolution, ResolveError> {
        let record = self
            .aliases
            .lookup(alias)
            .await
            .ok_or_else(|| ResolveError::NotFound(format!("alias `{alias}` is not registered")))?;

        if !record.is_set() {
            return Err(ResolveError::NotFound(format!("alias `{alias}` has no value yet")));
        }

        debug!("alias {alias} resolved");
        Ok(Resolution {
            value: Value::String(record.value),
            redirect: record.redirect,
        })
    }

    async fn resolve_content(
        &self,
        cid: &str,
    ) -> Result<Resolution, ResolveError> {
        let document = resolve_pointer(self.fetcher.as_ref(), cid).await?;

        // The chain record depends on the document, so these two fetches stay sequential.
        let endpoint = self
            .chains
            .resolve_endpoint(self.fetcher.as_ref(), document.blockchain_id)
            .await?;

        let raw = self
            .caller
            .call(&document, &endpoint)
            .await
            .map_err(ResolveError::contract_call)?;

        let value = encode(raw, document.get_function.return_uint256_as_cidv0)?;

        info!(
            "pointer {cid} resolved through chain {}",
            document.blockchain_id
        );
        Ok(Resolution::value(value))
    }
}
