use std::env;

use thiserror::Error;
use twilight_model::id::{Id, marker::UserMarker};

use tagbot_utils::parse::parse_target_user_id;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    Missing(&'static str),
    #[error("environment variable `{name}` has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings read from the process environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub discord_token: String,
    /// Tags are kept in memory when unset.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub bot_owner_ids: Vec<Id<UserMarker>>,
}

impl Config {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let discord_token = read("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
        let database_url = read("DATABASE_URL");

        let database_max_connections = match read("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::Invalid {
                    name: "DATABASE_MAX_CONNECTIONS",
                    value: raw,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let bot_owner_ids = match read("BOT_OWNER_IDS") {
            Some(raw) => parse_owner_ids(&raw).ok_or(ConfigError::Invalid {
                name: "BOT_OWNER_IDS",
                value: raw,
            })?,
            None => Vec::new(),
        };

        Ok(Self {
            discord_token,
            database_url,
            database_max_connections,
            bot_owner_ids,
        })
    }
}

fn parse_owner_ids(raw: &str) -> Option<Vec<Id<UserMarker>>> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(parse_target_user_id)
        .collect()
}
