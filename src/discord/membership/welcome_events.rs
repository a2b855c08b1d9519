use crate::core::membership::{plan_member_join, WelcomeMessage};
use crate::discord::Data;
use anyhow::Result;
use poise::serenity_prelude::{self as serenity, builder::CreateMessage, Context};

/// discord.js "Green", kept so existing servers see the same embed colour.
const WELCOME_COLOR: u32 = 0x57F287;

/// Welcome message and auto-role for a new member.
///
/// Both are best effort: a channel or role that isn't in the guild cache is
/// reported as a warning and skipped, and neither action blocks the other.
pub async fn handle_member_join(ctx: &Context, data: &Data, member: &serenity::Member) -> Result<()> {
    let guild_id = member.guild_id;
    let user_id = member.user.id;

    let config = data.settings.get_config(guild_id.get()).await?;
    let plan = plan_member_join(config.as_ref(), user_id.get());
    if plan.is_empty() {
        return Ok(());
    }

    if let Some(welcome) = plan.welcome {
        if let Err(e) = send_welcome(ctx, guild_id, &welcome).await {
            tracing::error!(guild_id = guild_id.get(), "Failed to send welcome message: {}", e);
        }
    }

    match plan.auto_role {
        Some(Some(role_id)) => grant_auto_role(ctx, member, serenity::RoleId::new(role_id)).await,
        Some(None) => {
            tracing::warn!(guild_id = guild_id.get(), "Auto-role is enabled but no role is set");
        }
        None => {}
    }

    Ok(())
}

async fn send_welcome(
    ctx: &Context,
    guild_id: serenity::GuildId,
    welcome: &WelcomeMessage,
) -> Result<(), serenity::Error> {
    let Some(channel_id) = welcome
        .channel_id
        .map(serenity::ChannelId::new)
        .filter(|id| guild_has_channel(ctx, guild_id, *id))
    else {
        tracing::warn!(
            guild_id = guild_id.get(),
            channel_id = ?welcome.channel_id,
            "Welcome channel not found, skipping welcome message"
        );
        return Ok(());
    };

    let mut embed = serenity::CreateEmbed::new()
        .title(&welcome.title)
        .description(&welcome.description)
        .color(WELCOME_COLOR);
    if let Some(image) = &welcome.image_url {
        embed = embed.image(image);
    }

    channel_id
        .send_message(ctx, CreateMessage::new().embed(embed))
        .await
        .map(|_| ())
}

async fn grant_auto_role(ctx: &Context, member: &serenity::Member, role_id: serenity::RoleId) {
    let guild_id = member.guild_id;
    let role_known = ctx
        .cache
        .guild(guild_id)
        .map(|g| g.roles.contains_key(&role_id))
        .unwrap_or(false);

    if !role_known {
        tracing::warn!(
            guild_id = guild_id.get(),
            role_id = role_id.get(),
            "Auto-role not found, skipping"
        );
        return;
    }

    // Usually a missing Manage Roles permission or a role above ours. Nothing to
    // retry, so just leave a trace for whoever runs the bot.
    if let Err(e) = member.add_role(ctx, role_id).await {
        tracing::error!(
            guild_id = guild_id.get(),
            user_id = member.user.id.get(),
            role_id = role_id.get(),
            "Failed to grant auto-role: {}",
            e
        );
    }
}

/// Only trust channels the cache knows about for this guild.
pub(crate) fn guild_has_channel(
    ctx: &Context,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) -> bool {
    ctx.cache
        .guild(guild_id)
        .map(|g| g.channels.contains_key(&channel_id))
        .unwrap_or(false)
}
