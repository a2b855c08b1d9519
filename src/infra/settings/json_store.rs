use crate::core::settings::{GuildConfig, SettingsStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Guild settings kept in one JSON object: `{ "<guild_id>": GuildConfig }`.
///
/// The whole map lives in memory and is rewritten to disk after each mutation.
pub struct JsonSettingsStore {
    path: PathBuf,
    cache: RwLock<HashMap<u64, GuildConfig>>,
}

impl JsonSettingsStore {
    /// Open the settings file, starting empty if it doesn't exist yet.
    ///
    /// A file that exists but doesn't parse is an error; we'd rather refuse to
    /// start than overwrite someone's hand-edited settings with `{}`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let map = if path.exists() {
            let file = std::fs::File::open(&path)?;
            serde_json::from_reader(std::io::BufReader::new(file))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(map),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot to a sibling temp file and rename it over the real
    /// one, so a crash mid-write never leaves a truncated settings file.
    async fn persist(&self, snapshot: &HashMap<u64, GuildConfig>) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn get_config(&self, guild_id: u64) -> Result<Option<GuildConfig>, StoreError> {
        let cache = self.cache.read().await;
        Ok(cache.get(&guild_id).cloned())
    }

    async fn insert_if_absent(
        &self,
        guild_id: u64,
        config: GuildConfig,
    ) -> Result<bool, StoreError> {
        // Hold the write lock through the flush so two saves can't race each other
        // and the last rename always carries every insert.
        let mut cache = self.cache.write().await;
        if cache.contains_key(&guild_id) {
            return Ok(false);
        }
        cache.insert(guild_id, config);

        if let Err(err) = self.persist(&cache).await {
            cache.remove(&guild_id);
            return Err(err);
        }
        Ok(true)
    }

    async fn all_configs(&self) -> Result<Vec<(u64, GuildConfig)>, StoreError> {
        let cache = self.cache.read().await;
        Ok(cache.iter().map(|(id, c)| (*id, c.clone())).collect())
    }
}
