use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::TypeMapKey;
use tokio::sync::RwLock;
use tracing::warn;

use crate::Error;

pub const CONFIG_FILE: &str = "like_channels.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    servers: HashMap<String, ServerEntry>
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct ServerEntry {
    #[serde(default)]
    like_channels: Vec<String>
}

/// Per-guild allow-list of channels where the like command may be used.
/// A guild with no entry (or an empty list) allows every channel.
pub struct ChannelConfig {
    path: PathBuf,
    servers: HashMap<String, ServerEntry>
}

#[derive(Debug, PartialEq, Eq)]
pub enum ChannelToggle {
    Added,
    Removed
}

impl TypeMapKey for ChannelConfig {
    type Value = Arc<RwLock<ChannelConfig>>;
}

impl ChannelConfig {
    /// Loads the allow-list from disk. A missing, unreadable or corrupt file
    /// is logged and replaced with an empty configuration on disk, so the
    /// bot never refuses to start over a bad config file.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let servers = match tokio::fs::read_to_string(&path).await {
            Ok(text) => match serde_json::from_str::<ConfigFile>(&text) {
                Ok(file) => Some(file.servers),
                Err(ex) => {
                    warn!("The configuration file {} is corrupt or empty, resetting to defaults: {}", path.display(), ex);
                    None
                }
            },
            Err(ex) if ex.kind() == std::io::ErrorKind::NotFound => None,
            Err(ex) => {
                warn!("Failed to read {}, resetting to defaults: {}", path.display(), ex);
                None
            }
        };

        let needs_rewrite = servers.is_none();
        let config = ChannelConfig { path, servers: servers.unwrap_or_default() };

        if needs_rewrite {
            if let Err(ex) = config.save().await {
                warn!("Failed to write default channel configuration: {}", ex);
            }
        }

        config
    }

    /// True if the guild has no configured list, or the channel is in it.
    pub fn is_channel_allowed(&self, guild_id: GuildId, channel_id: ChannelId) -> bool {
        match self.servers.get(&guild_id.to_string()) {
            Some(server) => server.like_channels.is_empty() || server.like_channels.contains(&channel_id.to_string()),
            None => true
        }
    }

    /// Adds the channel to the guild's allow-list, or removes it if already
    /// present. The new state is persisted before this reports success.
    pub async fn toggle_channel(&mut self, guild_id: GuildId, channel_id: ChannelId) -> Result<ChannelToggle, Error> {
        let guild_key = guild_id.to_string();
        let channel_key = channel_id.to_string();

        let entry = self.servers.entry(guild_key.clone()).or_default();
        let toggle = if let Some(index) = entry.like_channels.iter().position(|id| *id == channel_key) {
            entry.like_channels.remove(index);
            ChannelToggle::Removed
        } else {
            entry.like_channels.push(channel_key);
            ChannelToggle::Added
        };

        // An empty list means "all channels allowed", same as no entry at
        // all; dropping it keeps a toggle round-trip byte-identical on disk.
        if entry.like_channels.is_empty() {
            self.servers.remove(&guild_key);
        }

        self.save().await?;
        Ok(toggle)
    }

    // Write-to-temp-then-rename, so a crash mid-write never leaves a
    // half-written file behind.
    async fn save(&self) -> Result<(), Error> {
        let file = ConfigFile { servers: self.servers.clone() };

        let json = serde_json::to_string_pretty(&file)?;
        let temp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild(id: u64) -> GuildId {
        GuildId::new(id)
    }

    fn channel(id: u64) -> ChannelId {
        ChannelId::new(id)
    }

    #[tokio::test]
    async fn unconfigured_guild_allows_every_channel() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChannelConfig::load(dir.path().join(CONFIG_FILE)).await;

        assert!(config.is_channel_allowed(guild(1), channel(2)));
    }

    #[tokio::test]
    async fn only_listed_channels_are_allowed_once_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ChannelConfig::load(dir.path().join(CONFIG_FILE)).await;

        config.toggle_channel(guild(1), channel(2)).await.unwrap();

        assert!(config.is_channel_allowed(guild(1), channel(2)));
        assert!(!config.is_channel_allowed(guild(1), channel(3)));
        // Other guilds are unaffected.
        assert!(config.is_channel_allowed(guild(9), channel(3)));
    }

    #[tokio::test]
    async fn toggle_reports_added_then_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ChannelConfig::load(dir.path().join(CONFIG_FILE)).await;

        assert_eq!(config.toggle_channel(guild(1), channel(2)).await.unwrap(), ChannelToggle::Added);
        assert_eq!(config.toggle_channel(guild(1), channel(2)).await.unwrap(), ChannelToggle::Removed);
    }

    #[tokio::test]
    async fn double_toggle_round_trips_the_persisted_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = ChannelConfig::load(&path).await;

        let before = tokio::fs::read_to_string(&path).await.unwrap();

        config.toggle_channel(guild(1), channel(2)).await.unwrap();
        config.toggle_channel(guild(1), channel(2)).await.unwrap();

        let after = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(before, after);
        assert!(config.is_channel_allowed(guild(1), channel(2)));
    }

    #[tokio::test]
    async fn state_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        {
            let mut config = ChannelConfig::load(&path).await;
            config.toggle_channel(guild(1), channel(2)).await.unwrap();
        }

        let config = ChannelConfig::load(&path).await;
        assert!(config.is_channel_allowed(guild(1), channel(2)));
        assert!(!config.is_channel_allowed(guild(1), channel(3)));
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_empty_and_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        tokio::fs::write(&path, "{not valid json").await.unwrap();

        let config = ChannelConfig::load(&path).await;
        assert!(config.is_channel_allowed(guild(1), channel(2)));

        let rewritten = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rewritten).unwrap();
        assert_eq!(parsed["servers"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        ChannelConfig::load(&path).await;

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&written).is_ok());
    }
}
