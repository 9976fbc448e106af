use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

const DEFAULT_SECRET: &str = "dev-secret-change-me";

const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", DEFAULT_SECRET];

/// Server settings, read from `FRITTER_*` environment variables after `.env`
/// has been loaded.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = var_or("FRITTER_JWT_SECRET", DEFAULT_SECRET);
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            warn!("FRITTER_JWT_SECRET is unset or still a placeholder; session tokens can be forged");
        }

        let port = var_or("FRITTER_PORT", "3000");
        let ttl = var_or("FRITTER_TOKEN_TTL_DAYS", "30");

        Ok(Self {
            db_path: PathBuf::from(var_or("FRITTER_DB_PATH", "fritter.db")),
            host: var_or("FRITTER_HOST", "0.0.0.0"),
            port: port
                .parse()
                .with_context(|| format!("FRITTER_PORT is not a valid port: {port}"))?,
            jwt_secret,
            token_ttl_days: ttl
                .parse()
                .with_context(|| format!("FRITTER_TOKEN_TTL_DAYS is not a number: {ttl}"))?,
        })
    }
}
