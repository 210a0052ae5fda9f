use anyhow::Context;
use std::net::SocketAddr;

use crate::services::SentinelUser;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub cors_origin: Option<String>,
    pub sentinel: SentinelUser,
}

impl Config {
    /// Read settings from the process environment (after `.env` has been loaded).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite:project_hub.db?mode=rwc".to_string());

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 127.0.0.1:3000")?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            None => 5,
        };

        let defaults = SentinelUser::default();
        let sentinel = SentinelUser {
            email: lookup("SENTINEL_USER_EMAIL").unwrap_or(defaults.email),
            name: lookup("SENTINEL_USER_NAME").unwrap_or(defaults.name),
        };

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            cors_origin: lookup("CORS_ORIGIN").filter(|o| !o.is_empty()),
            sentinel,
        })
    }
}
