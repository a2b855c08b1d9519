// Leveling business logic. No serenity or poise in here: ids are plain u64 and
// the Discord layer decides how to announce whatever this returns.

use crate::core::settings::{non_empty, LevelingSettings};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A user's progress within one guild.
///
/// `xp` is progress towards the *next* level, not a lifetime total: it goes
/// back to zero every time the user levels up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceRecord {
    pub xp: u64,
    pub level: u32,
}

impl Default for ExperienceRecord {
    fn default() -> Self {
        Self { xp: 0, level: 1 }
    }
}

/// Returned by the service when a message pushed someone over a threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUpEvent {
    pub user_id: u64,
    pub guild_id: u64,
    pub old_level: u32,
    pub new_level: u32,
}

/// Outcome of asking the store whether a message may earn XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownCheck {
    /// The message was accepted and `now` is recorded as the last accepted time.
    Accepted,
    /// Still cooling down; nothing was recorded.
    Wait(Duration),
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum LevelingError {
    #[error("User is on cooldown. Time remaining: {0:?}")]
    OnCooldown(Duration),

    #[error("Invalid user or guild ID")]
    InvalidId,
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Per-(guild, user) experience and cooldown state.
///
/// Both operations that change state are single atomic steps, so callers on
/// different tasks never need their own lock around a read-modify-write.
#[async_trait]
pub trait XpStore: Send + Sync {
    /// Current record, or `None` if the user never earned XP in this guild.
    async fn get_record(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Option<ExperienceRecord>, LevelingError>;

    /// Replace the record with `new` only if it still equals `expected`.
    /// `expected == None` means "only if no record exists yet".
    async fn compare_and_swap_record(
        &self,
        user_id: u64,
        guild_id: u64,
        expected: Option<ExperienceRecord>,
        new: ExperienceRecord,
    ) -> Result<bool, LevelingError>;

    /// Accept the message at `now` if at least `cooldown` has passed since the
    /// last accepted one, recording `now`. Rejections leave the timestamp alone.
    async fn claim_cooldown(
        &self,
        user_id: u64,
        guild_id: u64,
        now: Instant,
        cooldown: Duration,
    ) -> Result<CooldownCheck, LevelingError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// XP per level step. Reaching level `n + 1` takes `n * XP_PER_LEVEL` XP.
pub const XP_PER_LEVEL: u64 = 100;

pub struct LevelingService<S: XpStore> {
    store: S,
}

impl<S: XpStore> LevelingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn validate_ids(user_id: u64, guild_id: u64) -> Result<(), LevelingError> {
        if user_id == 0 || guild_id == 0 {
            Err(LevelingError::InvalidId)
        } else {
            Ok(())
        }
    }

    /// Process a guild message against the guild's leveling settings.
    ///
    /// **Returns:**
    /// - `Ok(None)` if leveling is off for the guild (nothing is touched) or
    ///   XP was awarded without a level up
    /// - `Ok(Some(LevelUpEvent))` if the user leveled up
    /// - `Err(LevelingError::OnCooldown)` if the message came too soon
    pub async fn process_message(
        &self,
        user_id: u64,
        guild_id: u64,
        settings: Option<&LevelingSettings>,
    ) -> Result<Option<LevelUpEvent>, LevelingError> {
        self.process_message_at(user_id, guild_id, settings, Instant::now())
            .await
    }

    pub async fn process_message_at(
        &self,
        user_id: u64,
        guild_id: u64,
        settings: Option<&LevelingSettings>,
        now: Instant,
    ) -> Result<Option<LevelUpEvent>, LevelingError> {
        let settings = match settings {
            Some(s) if s.enabled => s,
            _ => return Ok(None),
        };
        Self::validate_ids(user_id, guild_id)?;

        // 1. Cooldown gate
        if let CooldownCheck::Wait(remaining) = self
            .store
            .claim_cooldown(user_id, guild_id, now, settings.cooldown())
            .await?
        {
            return Err(LevelingError::OnCooldown(remaining));
        }

        // 2. Accrual + 3. threshold, retried until our swap lands
        let gained = settings.xp_per_message();
        loop {
            let current = self.store.get_record(user_id, guild_id).await?;
            let before = current.unwrap_or_default();
            let after = Self::apply_xp(before, gained);

            if self
                .store
                .compare_and_swap_record(user_id, guild_id, current, after)
                .await?
            {
                return Ok((after.level > before.level).then(|| LevelUpEvent {
                    user_id,
                    guild_id,
                    old_level: before.level,
                    new_level: after.level,
                }));
            }
        }
    }

    /// Add XP and check the threshold once. Crossing it bumps the level by
    /// exactly one and zeroes XP; any overshoot is dropped.
    pub fn apply_xp(record: ExperienceRecord, gained: u64) -> ExperienceRecord {
        let xp = record.xp.saturating_add(gained);
        if xp >= Self::xp_required(record.level) {
            ExperienceRecord {
                xp: 0,
                level: record.level + 1,
            }
        } else {
            ExperienceRecord { xp, ..record }
        }
    }

    /// XP needed while at `level` to reach the next one.
    pub fn xp_required(level: u32) -> u64 {
        level as u64 * XP_PER_LEVEL
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub async fn get_record(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<ExperienceRecord, LevelingError> {
        Self::validate_ids(user_id, guild_id)?;
        Ok(self
            .store
            .get_record(user_id, guild_id)
            .await?
            .unwrap_or_default())
    }
}

/// Text for a level-up announcement: the configured template with the first
/// `{user}` and `{level}` filled in, or a stock line if none is set.
pub fn level_up_description(settings: &LevelingSettings, event: &LevelUpEvent) -> String {
    let mention = format!("<@{}>", event.user_id);
    match non_empty(settings.level_up_message.as_deref()) {
        Some(template) => template
            .replacen("{user}", &mention, 1)
            .replacen("{level}", &event.new_level.to_string(), 1),
        None => format!("{} reached level {}!", mention, event.new_level),
    }
}

// ============================================================================
// TESTS
// ============================================================================
