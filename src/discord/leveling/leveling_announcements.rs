use crate::core::leveling::{level_up_description, LevelUpEvent};
use crate::core::settings::{non_empty, LevelingSettings};
use crate::discord::welcome_events::guild_has_channel;
use poise::serenity_prelude::{self as serenity, builder::CreateMessage};

/// Post a level-up embed in the guild's configured announcement channel.
///
/// Does nothing (beyond a warning) if the channel isn't set or isn't cached.
pub async fn send_level_up_embed(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    settings: &LevelingSettings,
    level_up: &LevelUpEvent,
) -> Result<(), serenity::Error> {
    let Some(channel_id) = settings
        .level_up_channel
        .map(serenity::ChannelId::new)
        .filter(|id| guild_has_channel(ctx, guild_id, *id))
    else {
        tracing::warn!(
            guild_id = level_up.guild_id,
            channel_id = ?settings.level_up_channel,
            "Level-up channel not found, skipping announcement"
        );
        return Ok(());
    };

    let mut embed = serenity::CreateEmbed::new()
        .title("Level Up!")
        .description(level_up_description(settings, level_up))
        .color(serenity::Colour::ORANGE);
    if let Some(image) = non_empty(settings.embed_image.as_deref()) {
        embed = embed.image(image);
    }

    channel_id
        .send_message(ctx, CreateMessage::new().embed(embed))
        .await
        .map(|_| ())
}
