use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::common::utils::DEFAULT_EMBEDDING_MODEL;

/// Default chat model for conversational summaries.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Searches per minute allowed per (host, caller IP) when a host sets no limit.
pub const DEFAULT_SEARCH_RATE_LIMIT: u32 = 60;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub openai_api_key: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub geocoder_base_url: String,
    pub geocoder_user_agent: String,
    pub default_search_rate_limit: u32,
    pub embedding_timeout: Duration,
    pub chat_timeout: Duration,
    pub geocoder_timeout: Duration,
    /// Empty means any origin is allowed.
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            port: parse_or("PORT", 8080)?,
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            geocoder_base_url: env::var("GEOCODER_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| "Linksy/1.0 (community resource search)".to_string()),
            default_search_rate_limit: parse_or(
                "DEFAULT_SEARCH_RATE_LIMIT",
                DEFAULT_SEARCH_RATE_LIMIT,
            )?,
            embedding_timeout: Duration::from_secs(parse_or("EMBEDDING_TIMEOUT_SECS", 10)?),
            chat_timeout: Duration::from_secs(parse_or("CHAT_TIMEOUT_SECS", 15)?),
            geocoder_timeout: Duration::from_secs(parse_or("GEOCODER_TIMEOUT_SECS", 5)?),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
        })
    }

    /// The subset of configuration the search pipeline reads per request.
    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            default_rate_limit_per_minute: self.default_search_rate_limit,
            embedding_timeout: self.embedding_timeout,
            chat_timeout: self.chat_timeout,
            geocoder_timeout: self.geocoder_timeout,
        }
    }
}

/// Tunables for the search pipeline.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub default_rate_limit_per_minute: u32,
    pub embedding_timeout: Duration,
    pub chat_timeout: Duration,
    pub geocoder_timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_rate_limit_per_minute: DEFAULT_SEARCH_RATE_LIMIT,
            embedding_timeout: Duration::from_secs(10),
            chat_timeout: Duration::from_secs(15),
            geocoder_timeout: Duration::from_secs(5),
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
