// src/config.rs
//! Environment configuration, validated once at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::source::Credentials;
use crate::watermark::DEFAULT_STATE_PATH;

pub const ENV_TARGET_ACCOUNT: &str = "INSTAGRAM_TARGET_ACCOUNT";
pub const ENV_TARGET_ACCOUNT_LEGACY: &str = "INSTAGRAM_ACCOUNT";
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_TARGET_CHAT_ID";
pub const ENV_CHAT_ID_LEGACY: &str = "TELEGRAM_CHAT_ID";
pub const ENV_USERNAME: &str = "INSTAGRAM_USERNAME";
pub const ENV_PASSWORD: &str = "INSTAGRAM_PASSWORD";
pub const ENV_TOTP_SECRET: &str = "INSTAGRAM_TOTP_SECRET";
pub const ENV_CHECK_INTERVAL: &str = "CHECK_INTERVAL";
pub const ENV_STATE_PATH: &str = "STATE_PATH";
pub const ENV_FETCH_LIMIT: &str = "FETCH_LIMIT";
pub const ENV_COMMENT_LIMIT: &str = "COMMENT_LIMIT";
pub const ENV_METRICS_ADDR: &str = "METRICS_ADDR";

const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;
const DEFAULT_FETCH_LIMIT: usize = 20;
const DEFAULT_COMMENT_LIMIT: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required but not set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub target_account: String,
    pub telegram_token: String,
    pub chat_id: String,
    pub credentials: Option<Credentials>,
    pub check_interval: Duration,
    pub state_path: PathBuf,
    pub fetch_limit: usize,
    pub comment_limit: usize,
    pub metrics_addr: Option<SocketAddr>,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key/value lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let target_account = get(ENV_TARGET_ACCOUNT)
            .or_else(|| get(ENV_TARGET_ACCOUNT_LEGACY))
            .map(|a| a.trim_start_matches('@').to_string())
            .ok_or(ConfigError::Missing(ENV_TARGET_ACCOUNT))?;
        let telegram_token = get(ENV_TELEGRAM_TOKEN).ok_or(ConfigError::Missing(ENV_TELEGRAM_TOKEN))?;
        let chat_id = get(ENV_CHAT_ID)
            .or_else(|| get(ENV_CHAT_ID_LEGACY))
            .ok_or(ConfigError::Missing(ENV_CHAT_ID))?;

        let credentials = match (get(ENV_USERNAME), get(ENV_PASSWORD)) {
            (Some(username), Some(password)) => Some(Credentials {
                username,
                password,
                totp_secret: get(ENV_TOTP_SECRET),
            }),
            (Some(_), None) => {
                tracing::warn!("{ENV_USERNAME} set without {ENV_PASSWORD}; fetching without login");
                None
            }
            _ => None,
        };

        let interval_secs: u64 = parse_or(get(ENV_CHECK_INTERVAL), ENV_CHECK_INTERVAL, DEFAULT_CHECK_INTERVAL_SECS)?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_CHECK_INTERVAL,
                reason: "must be at least 1 second".into(),
            });
        }

        let fetch_limit: usize = parse_or(get(ENV_FETCH_LIMIT), ENV_FETCH_LIMIT, DEFAULT_FETCH_LIMIT)?;
        if fetch_limit == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_FETCH_LIMIT,
                reason: "must be at least 1".into(),
            });
        }

        let comment_limit = parse_or(get(ENV_COMMENT_LIMIT), ENV_COMMENT_LIMIT, DEFAULT_COMMENT_LIMIT)?;

        let metrics_addr = get(ENV_METRICS_ADDR)
            .map(|v| {
                v.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                    key: ENV_METRICS_ADDR,
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            target_account,
            telegram_token,
            chat_id,
            credentials,
            check_interval: Duration::from_secs(interval_secs),
            state_path: get(ENV_STATE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            fetch_limit,
            comment_limit,
            metrics_addr,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("{v:?}: {e}"),
        }),
    }
}
