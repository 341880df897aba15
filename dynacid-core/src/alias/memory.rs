use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;

use super::AliasStore;

/// In-process store with the same exclusive-create guarantee as the file store.
#[derive(Default)]
pub(crate) struct MemoryAliasStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl AliasStore for MemoryAliasStore {
    async fn ensure_dir(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn exists(
        &self,
        key: &str,
    ) -> anyhow::Result<bool> {
        Ok(self.entries.lock().unwrap().contains_key(key))
    }

    async fn read(
        &self,
        key: &str,
    ) -> anyhow::Result<Vec<u8>> {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("no entry `{key}`"))
    }

    async fn create_new(
        &self,
        key: &str,
        contents: &[u8],
    ) -> anyhow::Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), contents.to_vec());
        Ok(true)
    }

    async fn write(
        &self,
        key: &str,
        contents: &[u8],
    ) -> anyhow::Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), contents.to_vec());
        Ok(())
    }
}
