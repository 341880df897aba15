use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dynacid_server::build_resolver;
use dynacid_server::config::Config;
use dynacid_server::logging::install_panic_hook;
use dynacid_server::logging::setup_logging;
use dynacid_server::metrics::Metrics;
use dynacid_server::routes::routes;
use mimalloc::MiMalloc;
use tracing::debug;
use tracing::info;
use tracing::span;
use tracing::Level;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Clone, Debug)]
struct Cli {
    /// Path to the configuration file.
    #[clap(short, long)]
    config: Option<String>,

    /// If set, output logs in JSON format.
    #[clap(short, long, action)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.json);
    install_panic_hook();

    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    info!("Starting resolver. version: {}", version);

    let config = Config::load(cli.config).context("loading configuration")?;
    config.validate().context("validating configuration")?;
    debug!("Loaded configuration: {:?}", config);

    let span = span!(
        Level::INFO,
        "Starting server",
        "gateway" = config.gateway.url.as_str(),
        "aliases" = config.aliases.dir.as_str(),
        "version" = version,
    );
    let _guard = span.enter();

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.prometheus.port))
        .install()
        .context("setting up Prometheus")?;

    let resolver = Arc::new(build_resolver(&config)?);
    let addr = config.server.socket_addr()?;

    let (addr, server) = warp::serve(routes(resolver, Metrics::new()))
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("listening for shutdown signal failed: {err}");
            }
        })
        .with_context(|| format!("binding {addr}"))?;

    info!("IPFS Gateway: {}", config.gateway.url);
    info!("Listening on {addr}");
    drop(_guard);

    server.await;
    info!("Shut down");

    Ok(())
}
