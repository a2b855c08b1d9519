// Decides what should happen when someone joins a guild. The Discord layer
// does the actual channel/role lookups and API calls.

use crate::core::settings::{non_empty, GuildConfig, WelcomeSettings};

pub const DEFAULT_WELCOME_TITLE: &str = "Welcome!";

/// A welcome embed ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeMessage {
    pub channel_id: Option<u64>,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
}

/// Everything a join should trigger. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinPlan {
    pub welcome: Option<WelcomeMessage>,
    /// `Some(None)` means auto-role is on but no role id is configured.
    pub auto_role: Option<Option<u64>>,
}

impl JoinPlan {
    pub fn is_empty(&self) -> bool {
        self.welcome.is_none() && self.auto_role.is_none()
    }
}

/// Work out the join actions for `user_id`. A guild without config gets nothing.
pub fn plan_member_join(config: Option<&GuildConfig>, user_id: u64) -> JoinPlan {
    let Some(config) = config else {
        return JoinPlan::default();
    };

    JoinPlan {
        welcome: config
            .welcome
            .enabled
            .then(|| render_welcome(&config.welcome, user_id)),
        auto_role: config.auto_role.enabled.then_some(config.auto_role.role_id),
    }
}

pub fn render_welcome(settings: &WelcomeSettings, user_id: u64) -> WelcomeMessage {
    let mention = format!("<@{}>", user_id);
    let description = match non_empty(settings.message.as_deref()) {
        Some(template) => template.replacen("{user}", &mention, 1),
        None => format!("{} joined!", mention),
    };

    WelcomeMessage {
        channel_id: settings.channel,
        title: non_empty(settings.title.as_deref())
            .unwrap_or(DEFAULT_WELCOME_TITLE)
            .to_string(),
        description,
        image_url: non_empty(settings.image.as_deref()).map(str::to_string),
    }
}
