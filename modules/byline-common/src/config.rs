use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "BylineBot/1.0";
pub const DEFAULT_MIN_AUTHENTICITY_SCORE: u8 = 75;

/// Scraper configuration loaded from environment variables.
///
/// Author trust profiles live in a separate authors file; see
/// [`crate::file_config::load_trust_profiles`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    // Fetching
    pub user_agent: String,
    pub request_timeout: Duration,
    pub max_retries: u32,

    // Rate limiting
    pub rate_limit_calls: usize,
    pub rate_limit_period: Duration,
    pub adaptive_rate_limit: bool,

    // Content filtering
    pub min_authenticity_score: u8,
    pub min_content_length: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            rate_limit_calls: 10,
            rate_limit_period: Duration::from_secs(60),
            adaptive_rate_limit: false,
            min_authenticity_score: DEFAULT_MIN_AUTHENTICITY_SCORE,
            min_content_length: 100,
        }
    }
}

impl ScraperConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_summary();
        Ok(config)
    }

    /// Build from an arbitrary key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            user_agent: lookup("USER_AGENT")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "REQUEST_TIMEOUT",
                defaults.request_timeout.as_secs(),
            )?),
            max_retries: parse_or(&lookup, "MAX_RETRIES", defaults.max_retries)?,
            rate_limit_calls: parse_or(&lookup, "RATE_LIMIT_CALLS", defaults.rate_limit_calls)?,
            rate_limit_period: Duration::from_secs(parse_or(
                &lookup,
                "RATE_LIMIT_PERIOD",
                defaults.rate_limit_period.as_secs(),
            )?),
            adaptive_rate_limit: parse_or(
                &lookup,
                "ADAPTIVE_RATE_LIMIT",
                defaults.adaptive_rate_limit,
            )?,
            min_authenticity_score: parse_or(
                &lookup,
                "MIN_AUTHENTICITY_SCORE",
                defaults.min_authenticity_score,
            )?,
            min_content_length: parse_or(
                &lookup,
                "MIN_CONTENT_LENGTH",
                defaults.min_content_length,
            )?,
        };

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        anyhow::ensure!(self.max_retries >= 1, "MAX_RETRIES must be at least 1");
        anyhow::ensure!(
            self.rate_limit_calls >= 1,
            "RATE_LIMIT_CALLS must be at least 1"
        );
        anyhow::ensure!(
            !self.rate_limit_period.is_zero(),
            "RATE_LIMIT_PERIOD must be greater than 0"
        );
        anyhow::ensure!(
            !self.request_timeout.is_zero(),
            "REQUEST_TIMEOUT must be greater than 0"
        );
        anyhow::ensure!(
            self.min_authenticity_score <= 100,
            "MIN_AUTHENTICITY_SCORE must be between 0 and 100"
        );
        Ok(())
    }

    fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  USER_AGENT: {}", self.user_agent);
        tracing::info!("  REQUEST_TIMEOUT: {}s", self.request_timeout.as_secs());
        tracing::info!("  MAX_RETRIES: {}", self.max_retries);
        tracing::info!(
            "  RATE_LIMIT: {} calls / {}s (adaptive: {})",
            self.rate_limit_calls,
            self.rate_limit_period.as_secs(),
            self.adaptive_rate_limit
        );
        tracing::info!("  MIN_AUTHENTICITY_SCORE: {}", self.min_authenticity_score);
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        _ => Ok(default),
    }
}
