// In-memory implementation of XpStore.
//
// Nothing here survives a restart: XP and cooldowns start fresh every boot.
// Entries are never evicted either, so memory grows with every distinct
// (guild, user) pair that has ever posted while leveling was on.

use crate::core::leveling::{CooldownCheck, ExperienceRecord, LevelingError, XpStore};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// A composite key for looking up user XP.
/// We need both user_id AND guild_id since users can be in multiple guilds.
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
struct UserGuildKey {
    user_id: u64,
    guild_id: u64,
}

/// DashMap-backed store. Each map shard is locked independently, and the
/// entry API keeps a read-modify-write on one key atomic.
pub struct InMemoryXpStore {
    records: DashMap<UserGuildKey, ExperienceRecord>,
    cooldowns: DashMap<UserGuildKey, Instant>,
}

impl InMemoryXpStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            cooldowns: DashMap::new(),
        }
    }

    #[cfg(test)]
    fn last_accepted(&self, user_id: u64, guild_id: u64) -> Option<Instant> {
        let key = UserGuildKey { user_id, guild_id };
        self.cooldowns.get(&key).map(|entry| *entry)
    }
}

#[async_trait]
impl XpStore for InMemoryXpStore {
    async fn get_record(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Option<ExperienceRecord>, LevelingError> {
        let key = UserGuildKey { user_id, guild_id };
        Ok(self.records.get(&key).map(|entry| *entry))
    }

    async fn compare_and_swap_record(
        &self,
        user_id: u64,
        guild_id: u64,
        expected: Option<ExperienceRecord>,
        new: ExperienceRecord,
    ) -> Result<bool, LevelingError> {
        let key = UserGuildKey { user_id, guild_id };

        match (self.records.entry(key), expected) {
            (Entry::Occupied(mut occupied), Some(expected)) if *occupied.get() == expected => {
                occupied.insert(new);
                Ok(true)
            }
            (Entry::Vacant(vacant), None) => {
                vacant.insert(new);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn claim_cooldown(
        &self,
        user_id: u64,
        guild_id: u64,
        now: Instant,
        cooldown: Duration,
    ) -> Result<CooldownCheck, LevelingError> {
        let key = UserGuildKey { user_id, guild_id };

        match self.cooldowns.entry(key) {
            Entry::Occupied(mut occupied) => {
                let elapsed = now.saturating_duration_since(*occupied.get());
                if elapsed < cooldown {
                    return Ok(CooldownCheck::Wait(cooldown - elapsed));
                }
                occupied.insert(now);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now);
            }
        }

        Ok(CooldownCheck::Accepted)
    }
}

impl Default for InMemoryXpStore {
    fn default() -> Self {
        Self::new()
    }
}
