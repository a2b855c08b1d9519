use crate::discord::Data;
use anyhow::Result;
use poise::serenity_prelude as serenity;

/// Give a guild its default (all features off) settings the first time we see it.
///
/// Serenity sends a guild create for every guild on startup as well as for new
/// joins, so guilds that went missing from the settings file get filled in too.
pub async fn handle_guild_create(data: &Data, guild: &serenity::Guild) -> Result<()> {
    if data.settings.ensure_guild(guild.id.get()).await? {
        tracing::info!(
            guild_id = guild.id.get(),
            guild_name = %guild.name,
            "Initialized settings for guild"
        );
    }

    Ok(())
}
