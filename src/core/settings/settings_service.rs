use super::settings_models::GuildConfig;
use super::settings_store::{SettingsStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Read access to guild configs plus the one mutation the bot performs on its
/// own: default-initializing a guild it has just been added to.
pub struct SettingsService<S: SettingsStore> {
    store: S,
}

impl<S: SettingsStore> SettingsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn get_config(&self, guild_id: u64) -> Result<Option<GuildConfig>, SettingsError> {
        Ok(self.store.get_config(guild_id).await?)
    }

    /// Make sure `guild_id` has a config, creating an all-disabled one if needed.
    ///
    /// Returns `true` if a new config was created and written.
    pub async fn ensure_guild(&self, guild_id: u64) -> Result<bool, SettingsError> {
        if self.store.get_config(guild_id).await?.is_some() {
            return Ok(false);
        }

        Ok(self
            .store
            .insert_if_absent(guild_id, GuildConfig::disabled())
            .await?)
    }

    pub async fn guild_count(&self) -> Result<usize, SettingsError> {
        Ok(self.store.all_configs().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Map-backed store that counts how many times it would have hit disk.
    #[derive(Default)]
    struct CountingStore {
        configs: Mutex<HashMap<u64, GuildConfig>>,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl SettingsStore for CountingStore {
        async fn get_config(&self, guild_id: u64) -> Result<Option<GuildConfig>, StoreError> {
            Ok(self.configs.lock().unwrap().get(&guild_id).cloned())
        }

        async fn insert_if_absent(
            &self,
            guild_id: u64,
            config: GuildConfig,
        ) -> Result<bool, StoreError> {
            let mut configs = self.configs.lock().unwrap();
            if configs.contains_key(&guild_id) {
                return Ok(false);
            }
            configs.insert(guild_id, config);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }

        async fn all_configs(&self) -> Result<Vec<(u64, GuildConfig)>, StoreError> {
            Ok(self
                .configs
                .lock()
                .unwrap()
                .iter()
                .map(|(id, c)| (*id, c.clone()))
                .collect())
        }
    }

    #[tokio::test]
    async fn new_guild_is_initialized_once() {
        let service = SettingsService::new(CountingStore::default());

        assert!(service.ensure_guild(42).await.unwrap());
        assert!(!service.ensure_guild(42).await.unwrap());
        assert!(!service.ensure_guild(42).await.unwrap());

        assert_eq!(service.store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(
            service.get_config(42).await.unwrap(),
            Some(GuildConfig::disabled())
        );
    }

    #[tokio::test]
    async fn existing_config_is_left_alone() {
        let store = CountingStore::default();
        let mut custom = GuildConfig::disabled();
        custom.welcome.enabled = true;
        store.configs.lock().unwrap().insert(7, custom.clone());

        let service = SettingsService::new(store);
        assert!(!service.ensure_guild(7).await.unwrap());

        assert_eq!(service.store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(service.get_config(7).await.unwrap(), Some(custom));
    }

    #[tokio::test]
    async fn unknown_guild_has_no_config() {
        let service = SettingsService::new(CountingStore::default());
        assert_eq!(service.get_config(1).await.unwrap(), None);
        assert_eq!(service.guild_count().await.unwrap(), 0);
    }
}
