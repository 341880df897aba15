use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use tracing::warn;

use super::AliasStore;

/// One JSON file per alias inside a single directory.
///
/// There is no locking. A new alias is written to a staging file and published with a hard link,
/// which fails if the alias file exists: concurrent writers can never both create the same alias,
/// and readers never see a partially written record. Updates are last-writer-wins.
#[derive(Clone, Debug)]
pub struct FileAliasStore {
    dir: PathBuf,
}

impl FileAliasStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(
        &self,
        key: &str,
    ) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Hidden, per-attempt file the contents of a new alias are written to first.
    fn staging_path(
        &self,
        key: &str,
    ) -> PathBuf {
        self.dir
            .join(format!(".{key}.{:016x}.tmp", rand::random::<u64>()))
    }
}

/// Writes `contents` to a file that must not exist yet, and syncs it to disk.
async fn stage(
    path: &Path,
    contents: &[u8],
) -> anyhow::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .with_context(|| format!("failed to create `{path:?}`"))?;

    file.write_all(contents)
        .await
        .with_context(|| format!("failed to write `{path:?}`"))?;
    file.sync_all()
        .await
        .with_context(|| format!("failed to sync `{path:?}`"))
}

async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {},
        Err(err) if err.kind() == ErrorKind::NotFound => {},
        Err(err) => warn!("failed to remove `{path:?}`: {err}"),
    }
}

#[async_trait]
impl AliasStore for FileAliasStore {
    async fn ensure_dir(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create directories `{:?}`", self.dir))
    }

    async fn exists(
        &self,
        key: &str,
    ) -> anyhow::Result<bool> {
        let path = self.path(key);
        tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("failed to stat `{path:?}`"))
    }

    async fn read(
        &self,
        key: &str,
    ) -> anyhow::Result<Vec<u8>> {
        let path = self.path(key);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read `{path:?}`"))
    }

    async fn create_new(
        &self,
        key: &str,
        contents: &[u8],
    ) -> anyhow::Result<bool> {
        let path = self.path(key);
        let staging = self.staging_path(key);

        let published = match stage(&staging, contents).await {
            Ok(()) => tokio::fs::hard_link(&staging, &path).await,
            Err(err) => {
                discard(&staging).await;
                return Err(err);
            },
        };
        discard(&staging).await;

        match published {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                debug!("`{path:?}` already exists");
                Ok(false)
            },
            Err(err) => Err(err).with_context(|| format!("failed to create `{path:?}`")),
        }
    }

    async fn write(
        &self,
        key: &str,
        contents: &[u8],
    ) -> anyhow::Result<()> {
        let path = self.path(key);
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("failed to write `{path:?}`"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dynacid_types::alias::AliasUpdate;

    use super::*;
    use crate::alias::AliasRegistry;

    #[tokio::test]
    async fn test_create_new_is_exclusive() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileAliasStore::new(dir.path());

        assert!(store.create_new("abc123", b"first").await?);
        assert!(!store.create_new("abc123", b"second").await?);
        assert_eq!(store.read("abc123").await?, b"first");

        Ok(())
    }

    #[tokio::test]
    async fn test_registry_on_disk() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        // Registration creates the directory when missing.
        let store = FileAliasStore::new(dir.path().join("aliases"));
        let registry = AliasRegistry::new(Arc::new(store.clone()));

        let alias = registry.register().await?;
        assert!(store.exists(&alias).await?);
        assert_eq!(
            std::fs::read_to_string(store.dir().join(format!("{alias}.json")))?,
            r#"{"value":""}"#
        );

        registry
            .update(
                &alias,
                AliasUpdate {
                    cid: "QmNLei78zWmzUdbeRB3CiUfAizWUrbeeZh5K1rhAQKCh51".to_string(),
                    redirect: Some("https://example.org/".to_string()),
                },
            )
            .await?;

        // A second registry over the same directory sees the update.
        let reopened = AliasRegistry::new(Arc::new(FileAliasStore::new(store.dir())));
        let record = reopened.lookup(&alias).await.unwrap();
        assert_eq!(record.value, "QmNLei78zWmzUdbeRB3CiUfAizWUrbeeZh5K1rhAQKCh51");
        assert_eq!(record.redirect.as_deref(), Some("https://example.org/"));

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_dir_reads_as_absent() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileAliasStore::new(dir.path().join("never-created"));

        assert!(!store.exists("abc123").await?);
        assert!(store.read("abc123").await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_new_leaves_only_the_alias_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileAliasStore::new(dir.path());

        assert!(store.create_new("abc123", b"first").await?);
        assert!(!store.create_new("abc123", b"second").await?);

        let mut names = std::fs::read_dir(dir.path())?
            .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();
        assert_eq!(names, vec!["abc123.json".to_string()]);

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_create_leaves_alias_unregistered() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileAliasStore::new(dir.path().join("never-created"));

        assert!(store.create_new("abc123", b"first").await.is_err());
        assert!(!store.exists("abc123").await?);

        // Once the directory exists the same alias can still be created.
        store.ensure_dir().await?;
        assert!(store.create_new("abc123", b"first").await?);
        assert_eq!(store.read("abc123").await?, b"first");

        Ok(())
    }
}
