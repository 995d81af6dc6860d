//! Centralized configuration (environment variables + defaults).
//!
//! Values are resolved once at startup and passed down explicitly; nothing below the
//! binaries reads the process environment.

use anyhow::{anyhow, Context};
use std::net::SocketAddr;
use std::time::Duration;

/// Connection string used in development when `DATABASE_URL` is not set.
pub const DEVELOPMENT_DATABASE_URL: &str = "postgres://postgres@localhost:5432/webwidget";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    Development,
    Production,
}

impl DeployMode {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(DeployMode::Development),
            "production" | "prod" => Ok(DeployMode::Production),
            other => Err(anyhow!(
                "WIDGET_ENV must be 'development' or 'production' (got '{}')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: DeployMode,
    pub database_url: String,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("WIDGET_ENV") {
            Some(raw) => DeployMode::parse(&raw)?,
            None => DeployMode::Development,
        };

        let database_url = match (lookup("DATABASE_URL"), mode) {
            (Some(url), _) if !url.trim().is_empty() => url,
            (_, DeployMode::Development) => DEVELOPMENT_DATABASE_URL.to_string(),
            (_, DeployMode::Production) => {
                return Err(anyhow!("DATABASE_URL must be set in production"))
            }
        };

        let connect_timeout = timeout_secs(&lookup, "DB_CONNECT_TIMEOUT_SECS")?;
        let command_timeout = timeout_secs(&lookup, "DB_COMMAND_TIMEOUT_SECS")?;

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("BIND_ADDR must be a socket address (got '{}')", bind_raw))?;

        Ok(Self {
            mode,
            database_url,
            connect_timeout,
            command_timeout,
            bind_addr,
        })
    }
}

fn timeout_secs<F>(lookup: &F, key: &str) -> anyhow::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{} must be a whole number of seconds", key))?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    if secs == 0 {
        return Err(anyhow!("{} must be greater than zero", key));
    }
    Ok(Duration::from_secs(secs))
}
