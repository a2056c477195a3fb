// config.rs - Bot Configuration
// Reads botconfig.txt (KEY=VALUE lines) from the usual locations and falls back to
// the process environment for anything the file does not set.
//
// Keys:
//   DISCORD_TOKEN  - required
//   PREFIX         - command prefix, defaults to "haya"
//   BOT_OWNER_ID   - comma separated owner user ids
//   MODULES        - comma separated module ids to load, all when unset

use log::{debug, info};
use serenity::model::id::UserId;
use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;

pub const CONFIG_PATHS: [&str; 4] = [
    "botconfig.txt",
    "../botconfig.txt",
    "../../botconfig.txt",
    "src/botconfig.txt",
];

pub const DEFAULT_PREFIX: &str = "haya";

const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DISCORD_TOKEN not found in botconfig.txt or the environment")]
    MissingToken,
    #[error("DISCORD_TOKEN is set to a placeholder value")]
    PlaceholderToken,
    #[error("invalid BOT_OWNER_ID entry '{0}'")]
    InvalidOwner(String),
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub prefix: String,
    pub owners: HashSet<UserId>,
    /// `None` loads every module.
    pub modules: Option<Vec<String>>,
}

/// Parses KEY=VALUE lines, skipping blanks and `#` comments.
pub fn parse_config(content: &str) -> HashMap<String, String> {
    // Remove BOM if present
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut config = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(equals_pos) = line.find('=') {
            let key = line[..equals_pos].trim().to_string();
            let value = line[equals_pos + 1..].trim().to_string();
            config.insert(key, value);
        }
    }

    config
}

/// First botconfig.txt found, with the path it came from.
fn load_config_file() -> Option<(&'static str, HashMap<String, String>)> {
    for config_path in CONFIG_PATHS {
        match fs::read_to_string(config_path) {
            Ok(content) => return Some((config_path, parse_config(&content))),
            Err(_) => continue,
        }
    }
    None
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl BotConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let file = match load_config_file() {
            Some((path, values)) => {
                info!("✅ Configuration loaded from {}", path);
                values
            }
            None => {
                debug!("No botconfig.txt found, using environment variables only");
                HashMap::new()
            }
        };

        Self::from_lookup(|key: &str| file.get(key).cloned().or_else(|| env::var(key).ok()))
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;
        if token == TOKEN_PLACEHOLDER {
            return Err(ConfigError::PlaceholderToken);
        }

        let prefix = lookup("PREFIX")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let mut owners = HashSet::new();
        if let Some(value) = lookup("BOT_OWNER_ID") {
            for id in split_list(&value) {
                let id = id
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidOwner(id.to_string()))?;
                owners.insert(UserId(id));
            }
        }

        let modules = lookup("MODULES")
            .map(|value| split_list(&value).map(str::to_lowercase).collect());

        Ok(Self {
            token,
            prefix,
            owners,
            modules,
        })
    }
}
