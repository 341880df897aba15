use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use dynacid_core::alias::AliasRegistry;
use dynacid_core::alias::FileAliasStore;
use dynacid_types::alias::AliasUpdate;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Same variable the server reads its alias directory from.
const ALIASES_DIR_ENV_VAR: &str = "ALIASES__DIR";
const DEFAULT_ALIASES_DIR: &str = "aliases";

#[derive(Parser, Debug)]
enum Cli {
    /// Register a new, empty alias
    Register(Register),
    /// Set the value (and optionally the redirect) of an alias
    Update(Update),
    /// Print the record of an alias
    Show(Show),
}

#[derive(Args, Debug)]
struct Store {
    /// Directory holding the alias files.
    #[clap(short, long, env = ALIASES_DIR_ENV_VAR, default_value_t = { DEFAULT_ALIASES_DIR.to_string() })]
    dir: String,
}

impl Store {
    fn registry(&self) -> AliasRegistry {
        AliasRegistry::new(Arc::new(FileAliasStore::new(&self.dir)))
    }
}

#[derive(Args, Debug)]
struct Register {
    #[clap(flatten)]
    store: Store,
}

impl Register {
    async fn run(&self) -> Result<()> {
        let alias = self.store.registry().register().await?;
        info!("registered alias {alias} in {}", self.store.dir);
        println!("{alias}");
        Ok(())
    }
}

#[derive(Args, Debug)]
struct Update {
    #[clap(flatten)]
    store: Store,

    alias: String,

    /// Value to store, at most 100 bytes.
    cid: String,

    /// Where requests for the alias get redirected to.
    #[clap(short, long)]
    redirect: Option<String>,
}

impl Update {
    async fn run(&self) -> Result<()> {
        let update = AliasUpdate {
            cid: self.cid.clone(),
            redirect: self.redirect.clone(),
        };
        let value = self.store.registry().update(&self.alias, update).await?;
        info!("alias {} now holds {value}", self.alias);
        Ok(())
    }
}

#[derive(Args, Debug)]
struct Show {
    #[clap(flatten)]
    store: Store,

    alias: String,
}

impl Show {
    async fn run(&self) -> Result<()> {
        match self.store.registry().lookup(&self.alias).await {
            Some(record) => {
                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(())
            },
            None => bail!("alias `{}` is not registered", self.alias),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::io::stdout().is_terminal() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    }

    let cli = Cli::parse();
    info!("Running {cli:?}");

    match cli {
        Cli::Register(register) => register.run().await,
        Cli::Update(update) => update.run().await,
        Cli::Show(show) => show.run().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_update_show() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = Store {
            dir: dir.path().to_string_lossy().into_owned(),
        };

        let alias = store.registry().register().await?;
        Update {
            store: Store {
                dir: store.dir.clone(),
            },
            alias: alias.clone(),
            cid: "QmValue".to_string(),
            redirect: None,
        }
        .run()
        .await?;

        let record = store.registry().lookup(&alias).await.unwrap();
        assert_eq!(record.value, "QmValue");

        let missing = Show {
            store,
            alias: "abc123".to_string(),
        };
        assert!(missing.run().await.is_err());

        Ok(())
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "dynacid-alias",
            "update",
            "abc123",
            "QmValue",
            "-r",
            "https://example.org",
        ])
        .unwrap();
        match cli {
            Cli::Update(update) => {
                assert_eq!(update.alias, "abc123");
                assert_eq!(update.redirect.as_deref(), Some("https://example.org"));
            },
            other => panic!("unexpected {other:?}"),
        }
    }
}
