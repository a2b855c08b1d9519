pub mod settings_models;
pub mod settings_service;
pub mod settings_store;

pub use settings_models::{non_empty, GuildConfig, LevelingSettings, WelcomeSettings};
pub use settings_service::SettingsService;
pub use settings_store::{SettingsStore, StoreError};
