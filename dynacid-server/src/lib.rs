pub mod config;
pub mod logging;
pub mod metrics;
pub mod routes;

use std::sync::Arc;

use anyhow::Context;
use dynacid_core::alias::AliasRegistry;
use dynacid_core::alias::FileAliasStore;
use dynacid_core::chain::ChainEndpointResolver;
use dynacid_core::contract::EthersCaller;
use dynacid_core::gateway::HttpGateway;
use dynacid_core::Resolver;

use crate::config::Config;

/// Wires the gateway, RPC caller and alias store described by `config` into a resolver.
pub fn build_resolver(config: &Config) -> anyhow::Result<Resolver> {
    let gateway = HttpGateway::new(&config.gateway.url, config.gateway.timeout())
        .context("creating gateway client")?
        .with_max_body_bytes(config.gateway.max_body_bytes);

    Ok(Resolver::new(
        Arc::new(gateway),
        Arc::new(EthersCaller::new(config.rpc.timeout())),
        ChainEndpointResolver::new(config.gateway.chains_cid.clone()),
        AliasRegistry::new(Arc::new(FileAliasStore::new(&config.aliases.dir))),
    ))
}
