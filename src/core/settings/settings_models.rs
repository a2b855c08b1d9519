use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::time::Duration;

/// Per-guild feature configuration, stored as one entry of the settings file.
///
/// Only `enabled` is required for each feature. Everything else is optional so
/// that a hand-edited file with partial sections still loads. Keys we don't
/// know about are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildConfig {
    #[serde(default)]
    pub welcome: WelcomeSettings,
    #[serde(default)]
    pub auto_role: AutoRoleSettings,
    #[serde(default)]
    pub leveling: LevelingSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GuildConfig {
    /// The config written for a guild we have never seen: every feature off.
    pub fn disabled() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeSettings {
    #[serde(default, deserialize_with = "truthy")]
    pub enabled: bool,
    #[serde(
        default,
        with = "snowflake",
        skip_serializing_if = "Option::is_none"
    )]
    pub channel: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Message body. The first `{user}` is replaced with a mention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoRoleSettings {
    #[serde(default, deserialize_with = "truthy")]
    pub enabled: bool,
    #[serde(
        default,
        with = "snowflake",
        skip_serializing_if = "Option::is_none"
    )]
    pub role_id: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelingSettings {
    #[serde(default, deserialize_with = "truthy")]
    pub enabled: bool,
    /// Kept as the raw JSON number so `10` stays `10` and `7.5` stays `7.5`
    /// when the file is rewritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_per_message: Option<Number>,
    /// Seconds between messages that earn XP. Fractions are allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<Number>,
    #[serde(
        default,
        with = "snowflake",
        skip_serializing_if = "Option::is_none"
    )]
    pub level_up_channel: Option<u64>,
    /// Announcement text. The first `{user}` and `{level}` are substituted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_up_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LevelingSettings {
    pub const DEFAULT_XP_PER_MESSAGE: u64 = 10;
    pub const DEFAULT_COOLDOWN_SECS: u64 = 30;

    /// Whole XP per message. Fractions round down, negatives count as zero.
    pub fn xp_per_message(&self) -> u64 {
        match &self.xp_per_message {
            None => Self::DEFAULT_XP_PER_MESSAGE,
            Some(n) => n
                .as_u64()
                .unwrap_or_else(|| n.as_f64().map(|f| f.max(0.0) as u64).unwrap_or(0)),
        }
    }

    /// Negative cooldowns count as zero; absurdly large ones saturate.
    pub fn cooldown(&self) -> Duration {
        let secs = match &self.cooldown {
            None => return Duration::from_secs(Self::DEFAULT_COOLDOWN_SECS),
            Some(n) => n.as_f64().unwrap_or(0.0).max(0.0),
        };
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// `enabled` flags, read the way the file has always been read: `true`/`false`,
/// but also `1`, `"yes"` and friends from hand edits. Only falsy values
/// (`false`, `null`, `0`, `""`) switch a feature off.
fn truthy<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Treat `Some("")` the same as `None`, the way a blank field in the file is meant.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Discord ids are written as strings (JS clients can't hold a u64), but
/// hand-edited files sometimes carry bare numbers. Accept both, write strings.
/// Blank strings and `0` mean "not configured"; no real snowflake is zero.
/// Anything else that isn't an id is logged and treated as unset, the same
/// outcome as pointing at a channel that no longer exists.
mod snowflake {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(id) => serializer.serialize_str(&id.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        let id = match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => match n.as_u64() {
                Some(id) => Some(id),
                None => {
                    tracing::warn!(value = %n, "Ignoring non-integer id in settings");
                    None
                }
            },
            Some(Value::String(text)) if text.trim().is_empty() => None,
            Some(Value::String(text)) => match text.trim().parse::<u64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!(value = %text, "Ignoring malformed id in settings");
                    None
                }
            },
            Some(other) => {
                tracing::warn!(value = %other, "Ignoring malformed id in settings");
                None
            }
        };
        Ok(id.filter(|id| *id != 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_serializes_to_bare_flags() {
        let json = serde_json::to_value(GuildConfig::disabled()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "welcome": { "enabled": false },
                "autoRole": { "enabled": false },
                "leveling": { "enabled": false }
            })
        );
    }

    #[test]
    fn parses_hand_written_config() {
        let raw = r#"{
            "welcome": {
                "enabled": true,
                "channel": "111",
                "title": "Hey",
                "message": "Hi {user}",
                "image": "https://example.com/a.png"
            },
            "autoRole": { "enabled": true, "roleId": 222 },
            "leveling": {
                "enabled": true,
                "xpPerMessage": 25,
                "cooldown": 5,
                "levelUpChannel": "333",
                "levelUpMessage": "{user} is now {level}"
            }
        }"#;

        let config: GuildConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.welcome.channel, Some(111));
        assert_eq!(config.welcome.message.as_deref(), Some("Hi {user}"));
        assert_eq!(config.auto_role.role_id, Some(222));
        assert_eq!(config.leveling.xp_per_message(), 25);
        assert_eq!(config.leveling.cooldown().as_secs(), 5);
        assert_eq!(config.leveling.level_up_channel, Some(333));
        assert_eq!(config.leveling.embed_image, None);
    }

    #[test]
    fn missing_sections_fall_back_to_disabled() {
        let config: GuildConfig = serde_json::from_str(r#"{ "welcome": { "enabled": true } }"#).unwrap();
        assert!(config.welcome.enabled);
        assert!(!config.auto_role.enabled);
        assert!(!config.leveling.enabled);
        assert_eq!(config.leveling.xp_per_message(), 10);
        assert_eq!(config.leveling.cooldown().as_secs(), 30);
    }

    #[test]
    fn ids_are_written_back_as_strings() {
        let mut config = GuildConfig::disabled();
        config.auto_role.role_id = Some(987654321987654321);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["autoRole"]["roleId"], "987654321987654321");
    }

    #[test]
    fn zero_and_blank_ids_are_unset() {
        let config: GuildConfig = serde_json::from_str(
            r#"{ "welcome": { "enabled": true, "channel": "" }, "autoRole": { "enabled": true, "roleId": 0 } }"#,
        )
        .unwrap();
        assert_eq!(config.welcome.channel, None);
        assert_eq!(config.auto_role.role_id, None);
    }

    #[test]
    fn garbage_snowflake_is_unset() {
        let config: GuildConfig = serde_json::from_str(
            r#"{ "welcome": { "enabled": true, "channel": "general" },
                 "autoRole": { "enabled": true, "roleId": -7 },
                 "leveling": { "enabled": true, "levelUpChannel": 12.5 } }"#,
        )
        .unwrap();

        assert!(config.welcome.enabled);
        assert_eq!(config.welcome.channel, None);
        assert_eq!(config.auto_role.role_id, None);
        assert_eq!(config.leveling.level_up_channel, None);
    }

    #[test]
    fn blank_strings_count_as_unset() {
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(Some("x")), Some("x"));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let raw = serde_json::json!({
            "welcome": { "enabled": true, "footer": "keep me" },
            "autoRole": { "enabled": false, "reason": "onboarding" },
            "leveling": { "enabled": false, "xpPerMessage": 10, "cooldown": 2.5 },
            "prefix": "!"
        });

        let config: GuildConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(config.extra["prefix"], "!");
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }

    #[test]
    fn cooldown_accepts_any_number() {
        let parse = |json: &str| serde_json::from_str::<LevelingSettings>(json).unwrap();

        assert_eq!(
            parse(r#"{ "enabled": true, "cooldown": 2.5 }"#).cooldown(),
            Duration::from_millis(2_500)
        );
        assert_eq!(parse(r#"{ "enabled": true, "cooldown": -4 }"#).cooldown(), Duration::ZERO);
        assert_eq!(parse(r#"{ "enabled": true, "cooldown": 1e300 }"#).cooldown(), Duration::MAX);
    }

    #[test]
    fn xp_per_message_accepts_any_number() {
        let parse = |json: &str| serde_json::from_str::<LevelingSettings>(json).unwrap();

        assert_eq!(parse(r#"{ "xpPerMessage": 7.8 }"#).xp_per_message(), 7);
        assert_eq!(parse(r#"{ "xpPerMessage": -3 }"#).xp_per_message(), 0);
        assert_eq!(parse(r#"{ "xpPerMessage": 25 }"#).xp_per_message(), 25);
    }

    #[test]
    fn enabled_flags_follow_truthiness() {
        let parse = |json: &str| serde_json::from_str::<AutoRoleSettings>(json).unwrap().enabled;

        assert!(parse(r#"{ "enabled": true }"#));
        assert!(parse(r#"{ "enabled": 1 }"#));
        assert!(parse(r#"{ "enabled": "yes" }"#));
        assert!(!parse(r#"{ "enabled": 0 }"#));
        assert!(!parse(r#"{ "enabled": "" }"#));
        assert!(!parse(r#"{ "enabled": null }"#));
        assert!(!parse(r#"{}"#));
    }
}
