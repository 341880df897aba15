use anyhow::Context;
use clap::Parser;
use dynacid_server::build_resolver;
use dynacid_server::config::Config;
use dynacid_server::logging::install_panic_hook;
use dynacid_types::reply::ErrorReply;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone, Debug)]
/// Resolve a single identifier and print the reply the server would send.
struct Cli {
    #[clap(short, long)]
    /// The config file; defaults and environment variables apply as for the server.
    config: Option<String>,

    #[clap()]
    /// Alias or CID of a pointer document.
    identifier: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_panic_hook();

    let subscriber = tracing_subscriber::fmt()
        .pretty()
        .compact()
        .with_level(true)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Setting up logging failed")?;

    let cli = Cli::parse();

    let config = Config::load(cli.config)?;
    config.validate()?;
    let resolver = build_resolver(&config)?;

    let reply = match resolver.resolve(&cli.identifier).await {
        Ok(resolution) => serde_json::to_string_pretty(&resolution)?,
        Err(err) => {
            serde_json::to_string_pretty(&ErrorReply {
                error: err.to_string(),
            })?
        },
    };
    println!("{reply}");

    Ok(())
}
