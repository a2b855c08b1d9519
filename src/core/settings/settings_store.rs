use super::settings_models::GuildConfig;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_config(&self, guild_id: u64) -> Result<Option<GuildConfig>, StoreError>;

    /// Insert `config` only if the guild has no entry yet.
    /// Returns `true` (and persists) when something was inserted.
    async fn insert_if_absent(&self, guild_id: u64, config: GuildConfig)
        -> Result<bool, StoreError>;

    async fn all_configs(&self) -> Result<Vec<(u64, GuildConfig)>, StoreError>;
}
