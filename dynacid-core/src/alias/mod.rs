//! Alias registry: short base-58 keys mapped to a stored value and an optional redirect.
use std::sync::Arc;

use async_trait::async_trait;
use dynacid_types::alias::AliasRecord;
use dynacid_types::alias::AliasUpdate;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::classify::is_alias;
use crate::classify::ALIAS_ALPHABET;
use crate::classify::ALIAS_LENGTH;
use crate::ResolveError;

pub mod fs;
#[cfg(test)]
pub(crate) mod memory;

pub use fs::FileAliasStore;

/// How many candidates `register` draws before giving up.
pub const MAX_REGISTER_ATTEMPTS: usize = 100;

/// Maximum size in bytes of an alias value.
pub const MAX_VALUE_LEN: usize = 100;

/// Persistent key-file storage backing the registry. Keys are always well-formed aliases.
#[async_trait]
pub trait AliasStore: Send + Sync {
    /// Creates the backing location if it is missing.
    async fn ensure_dir(&self) -> anyhow::Result<()>;

    async fn exists(
        &self,
        key: &str,
    ) -> anyhow::Result<bool>;

    async fn read(
        &self,
        key: &str,
    ) -> anyhow::Result<Vec<u8>>;

    /// Atomically creates `key` holding `contents`.
    ///
    /// Returns `false`, and leaves the existing entry untouched, if `key` already exists.
    async fn create_new(
        &self,
        key: &str,
        contents: &[u8],
    ) -> anyhow::Result<bool>;

    /// Creates or overwrites `key`.
    async fn write(
        &self,
        key: &str,
        contents: &[u8],
    ) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct AliasRegistry {
    store: Arc<dyn AliasStore>,
}

impl AliasRegistry {
    pub fn new(store: Arc<dyn AliasStore>) -> Self {
        Self { store }
    }

    /// Registers a fresh alias holding an empty record.
    pub async fn register(&self) -> Result<String, ResolveError> {
        let mut rng = StdRng::from_entropy();
        self.register_with(&mut rng).await
    }

    /// Same as [`Self::register`], drawing candidates from `rng`.
    ///
    /// The existence check only skips known collisions early; the exclusive create is what
    /// guarantees two registrations never end up with the same alias.
    pub async fn register_with<R: Rng + Send>(
        &self,
        rng: &mut R,
    ) -> Result<String, ResolveError> {
        self.store.ensure_dir().await.map_err(storage_error)?;

        let empty = serde_json::to_vec(&AliasRecord::default())
            .map_err(|err| ResolveError::Encoding(err.to_string()))?;

        for attempt in 0..MAX_REGISTER_ATTEMPTS {
            let candidate = generate_alias(rng);

            if self.store.exists(&candidate).await.map_err(storage_error)? {
                debug!("alias collision. candidate: {candidate} attempt: {attempt}");
                continue;
            }

            if self
                .store
                .create_new(&candidate, &empty)
                .await
                .map_err(storage_error)?
            {
                info!("registered alias {candidate}");
                return Ok(candidate);
            }

            debug!("alias taken concurrently. candidate: {candidate} attempt: {attempt}");
        }

        Err(ResolveError::Upstream(format!(
            "no free alias found after {MAX_REGISTER_ATTEMPTS} attempts"
        )))
    }

    /// Fetches the record of `alias`.
    ///
    /// Malformed aliases, missing entries and unreadable records are all reported as `None`.
    pub async fn lookup(
        &self,
        alias: &str,
    ) -> Option<AliasRecord> {
        if !is_alias(alias) {
            return None;
        }

        match self.store.exists(alias).await {
            Ok(true) => {},
            Ok(false) => return None,
            Err(err) => {
                warn!("checking alias `{alias}` failed: {err:#}");
                return None;
            },
        }

        let bytes = match self.store.read(alias).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("reading alias `{alias}` failed: {err:#}");
                return None;
            },
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("alias `{alias}` holds an invalid record: {err}");
                None
            },
        }
    }

    /// Replaces the record of a registered alias with exactly the fields of `update`.
    ///
    /// A redirect from a previous update is dropped if `update` carries none.
    pub async fn update(
        &self,
        alias: &str,
        update: AliasUpdate,
    ) -> Result<String, ResolveError> {
        if !is_alias(alias) {
            return Err(ResolveError::Validation(format!("`{alias}` is not a valid alias")));
        }
        if update.cid.is_empty() {
            return Err(ResolveError::Validation("`cid` is required".to_string()));
        }
        if update.cid.len() > MAX_VALUE_LEN {
            return Err(ResolveError::Validation(format!(
                "`cid` is {} bytes long, at most {MAX_VALUE_LEN} are allowed",
                update.cid.len()
            )));
        }

        if self.lookup(alias).await.is_none() {
            return Err(ResolveError::NotFound(format!("alias `{alias}` is not registered")));
        }

        let record = AliasRecord {
            value: update.cid,
            redirect: update.redirect,
        };
        let bytes =
            serde_json::to_vec(&record).map_err(|err| ResolveError::Encoding(err.to_string()))?;
        self.store
            .write(alias, &bytes)
            .await
            .map_err(storage_error)?;

        info!("updated alias {alias}");
        Ok(record.value)
    }
}

/// Draws [`ALIAS_LENGTH`] independent symbols from the base-58 alphabet.
pub fn generate_alias<R: Rng>(rng: &mut R) -> String {
    (0..ALIAS_LENGTH)
        .map(|_| ALIAS_ALPHABET[rng.gen_range(0..ALIAS_ALPHABET.len())] as char)
        .collect()
}

fn storage_error(err: anyhow::Error) -> ResolveError {
    ResolveError::Upstream(format!("alias storage: {err:#}"))
}
