// Discord layer - event handlers that translate gateway events into core calls.

use crate::core::leveling::LevelingService;
use crate::core::settings::SettingsService;
use crate::infra::leveling::InMemoryXpStore;
use crate::infra::settings::JsonSettingsStore;
use std::sync::Arc;

#[path = "guilds/guild_setup.rs"]
pub mod guild_setup;

#[path = "leveling/leveling_announcements.rs"]
pub mod leveling_announcements;

#[path = "membership/welcome_events.rs"]
pub mod welcome_events;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Shared state handed to every event.
pub struct Data {
    pub settings: Arc<SettingsService<JsonSettingsStore>>,
    pub leveling: Arc<LevelingService<InMemoryXpStore>>,
}
