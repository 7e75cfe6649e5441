use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Default model for relevance search.
pub const DEFAULT_SEARCH_MODEL: &str = "gpt-4o-mini";

/// Default model for summary generation.
pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub stats_api_url: String,
    pub stats_api_key: String,
    pub openai_api_key: String,
    pub search_model: String,
    pub summary_model: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            stats_api_url: env::var("STATS_API_URL").context("STATS_API_URL must be set")?,
            stats_api_key: env::var("STATS_API_KEY").context("STATS_API_KEY must be set")?,
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            search_model: env::var("STATSIGHT_SEARCH_MODEL")
                .unwrap_or_else(|_| DEFAULT_SEARCH_MODEL.to_string()),
            summary_model: env::var("STATSIGHT_SUMMARY_MODEL")
                .unwrap_or_else(|_| DEFAULT_SUMMARY_MODEL.to_string()),
        })
    }
}
