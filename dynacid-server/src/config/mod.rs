use std::net::SocketAddr;
use std::time::Duration;

use anyhow::ensure;
use anyhow::Context;
use config::FileFormat;
use lazy_static_include::*;
use serde_derive::Deserialize;
use tracing::debug;

lazy_static_include_str! {
    DEFAULT_CONFIG => "src/config/default.toml",
}

/// Gateway override honoured for compatibility with earlier deployments.
const IPFS_GATEWAY_ENV_VAR: &str = "IPFS_GATEWAY";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub rpc: RpcConfig,
    pub aliases: AliasesConfig,
    pub prometheus: PrometheusConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address `{}:{}`", self.host, self.port))
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Base URL of the IPFS HTTP gateway, without the `/ipfs` suffix.
    pub url: String,
    /// Root of the pinned chain registry.
    pub chains_cid: String,
    pub timeout_secs: u64,
    /// Largest pointer document or chain record accepted from the gateway.
    pub max_body_bytes: usize,
}

impl GatewayConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.url.is_empty(), "Gateway URL is required");
        ensure!(!self.chains_cid.is_empty(), "Chains CID is required");
        ensure!(self.timeout_secs > 0, "Gateway timeout must be positive");
        ensure!(self.max_body_bytes > 0, "Gateway body limit must be positive");
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RpcConfig {
    pub timeout_secs: u64,
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AliasesConfig {
    /// Directory holding one JSON file per alias.
    pub dir: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PrometheusConfig {
    pub port: u16,
}

impl Config {
    /// Layers the embedded defaults, `local_file` and the environment (`SECTION__KEY`).
    pub fn load(local_file: Option<String>) -> anyhow::Result<Config> {
        let mut config_builder = config::Config::builder()
            .add_source(config::File::from_str(&DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(local_file) = local_file {
            debug!("Loading local configuration from {}", local_file);
            config_builder = config_builder.add_source(config::File::with_name(&local_file));
        }

        config_builder = config_builder.add_source(
            config::Environment::default()
                .separator("__")
                .ignore_empty(true),
        );

        if let Ok(gateway) = std::env::var(IPFS_GATEWAY_ENV_VAR) {
            if !gateway.is_empty() {
                config_builder = config_builder
                    .set_override("gateway.url", gateway)
                    .context("overriding gateway URL")?;
            }
        }

        config_builder
            .build()
            .context("Could not load configuration")?
            .try_deserialize()
            .context("Could not deserialize configuration")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.gateway.validate()?;
        ensure!(self.rpc.timeout_secs > 0, "RPC timeout must be positive");
        ensure!(!self.aliases.dir.is_empty(), "Alias directory is required");
        self.server.socket_addr()?;
        Ok(())
    }
}
