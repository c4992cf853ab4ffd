use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Signing key used when `SECRET_KEY` is absent. Never acceptable outside local development.
pub const INSECURE_DEFAULT_SECRET: &str = "insecure-dev-secret-change-me";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Which requirement engine drives extraction and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Completion-driven extraction and matching.
    Ai,
    /// Deterministic pattern scan over job and resume text.
    Rules,
}

impl FromStr for MatchStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai" => Ok(MatchStrategy::Ai),
            "rules" => Ok(MatchStrategy::Rules),
            other => bail!("MATCH_STRATEGY must be 'ai' or 'rules', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Built once at startup and handed to every component that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub completion_timeout: Duration,
    pub match_strategy: MatchStrategy,
    pub bcrypt_cost: u32,
    pub cors_allowed_origin: String,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: optional_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            jwt_secret: optional_env("SECRET_KEY")
                .unwrap_or_else(|| INSECURE_DEFAULT_SECRET.to_string()),
            access_token_ttl: Duration::from_secs(
                60 * parse_env("ACCESS_TOKEN_EXPIRE_MINUTES", 60 * 24)?,
            ),
            reset_token_ttl: Duration::from_secs(parse_env("RESET_TOKEN_EXPIRE_SECONDS", 3600)?),
            completion_timeout: Duration::from_secs(parse_env("COMPLETION_TIMEOUT_SECS", 60)?),
            match_strategy: optional_env("MATCH_STRATEGY")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(MatchStrategy::Ai),
            bcrypt_cost: parse_env("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            cors_allowed_origin: optional_env("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// True when tokens are being signed with the built-in development key.
    pub fn uses_insecure_secret(&self) -> bool {
        self.jwt_secret == INSECURE_DEFAULT_SECRET
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_strategy_parses_case_insensitively() {
        assert_eq!("AI".parse::<MatchStrategy>().unwrap(), MatchStrategy::Ai);
        assert_eq!(" rules ".parse::<MatchStrategy>().unwrap(), MatchStrategy::Rules);
    }

    #[test]
    fn test_match_strategy_rejects_unknown() {
        assert!("embedding".parse::<MatchStrategy>().is_err());
    }
}
