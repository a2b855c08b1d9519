// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (settings file, in-memory XP)
// - `discord/` = Discord-specific adapters (event handlers)
// - `web/` = Keep-alive HTTP endpoint
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start the keep-alive server
// 4. Set up the Discord framework and route gateway events

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "config/bot_config.rs"]
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "web/keep_alive.rs"]
mod web;

use crate::config::BotConfig;
use crate::core::leveling::{LevelingError, LevelingService};
use crate::core::settings::SettingsService;
use crate::discord::guild_setup::handle_guild_create;
use crate::discord::leveling_announcements::send_level_up_embed;
use crate::discord::welcome_events::handle_member_join;
use crate::discord::{Data, Error};
use crate::infra::leveling::InMemoryXpStore;
use crate::infra::settings::JsonSettingsStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for gateway events. There are no commands; everything the
/// bot does starts here.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            // Ignore bot messages (including our own)
            if new_message.author.bot {
                return Ok(());
            }

            // Only process guild messages (not DMs)
            let Some(guild_id) = new_message.guild_id else {
                return Ok(());
            };
            let user_id = new_message.author.id.get();

            let config = match data.settings.get_config(guild_id.get()).await {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!(guild_id = guild_id.get(), "Failed to read settings: {}", e);
                    return Ok(());
                }
            };
            let Some(leveling) = config.as_ref().map(|c| &c.leveling) else {
                return Ok(());
            };

            match data
                .leveling
                .process_message(user_id, guild_id.get(), Some(leveling))
                .await
            {
                Ok(Some(level_up)) => {
                    tracing::info!(
                        user_id = level_up.user_id,
                        guild_id = level_up.guild_id,
                        old_level = level_up.old_level,
                        new_level = level_up.new_level,
                        "User leveled up"
                    );

                    if let Err(err) = send_level_up_embed(ctx, guild_id, leveling, &level_up).await
                    {
                        tracing::warn!("Failed to send level-up embed: {err}");
                    }
                }
                Ok(None) => {
                    // XP was awarded (or leveling is off) - nothing to announce
                }
                Err(LevelingError::OnCooldown(_)) => {
                    // User is on cooldown - silently ignore
                }
                Err(e) => {
                    // Some other error - log it but don't crash
                    tracing::error!("Error processing XP for message: {}", e);
                }
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = handle_member_join(ctx, data, new_member).await {
                tracing::error!("Error handling member join: {}", e);
            }
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            if let Err(e) = handle_guild_create(data, guild).await {
                tracing::error!(guild_id = guild.id.get(), "Error initializing guild settings: {}", e);
            }
        }

        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env()?;
    if config.dashboard.is_configured() {
        tracing::debug!("Dashboard credentials present but the dashboard isn't wired up yet");
    }

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let settings_store = JsonSettingsStore::load(&config.settings_path).with_context(|| {
        format!(
            "Failed to load settings from {}",
            config.settings_path.display()
        )
    })?;
    tracing::info!(path = %settings_store.path().display(), "Opened settings file");
    let settings_service = Arc::new(SettingsService::new(settings_store));
    let known_guilds = settings_service.guild_count().await?;
    tracing::info!(guilds = known_guilds, "Loaded guild settings");

    let leveling_service = Arc::new(LevelingService::new(InMemoryXpStore::new()));

    let data = Data {
        settings: Arc::clone(&settings_service),
        leveling: Arc::clone(&leveling_service),
    };

    // ========================================================================
    // KEEP-ALIVE SERVER
    // ========================================================================

    let listener = web::bind(config.port)
        .await
        .with_context(|| format!("Failed to bind keep-alive server on port {}", config.port))?;
    tokio::spawn(async move {
        if let Err(e) = web::serve(listener).await {
            tracing::error!("Keep-alive server stopped: {}", e);
        }
    });

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|_ctx, ready, _framework| {
            Box::pin(async move {
                tracing::info!("{} is online", ready.user.tag());
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
