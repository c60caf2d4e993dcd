use std::env;
use std::str::FromStr;

use anyhow::Context;

/// Hard ceiling for `limit` on list queries.
pub const LIST_LIMIT_CEILING: i64 = 1000;
/// Limit applied when the caller does not ask for one.
pub const DEFAULT_LIST_LIMIT: i64 = 365;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,

    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub max_list_limit: i64,

    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let max_list_limit: i64 = parse_var("MOODS_MAX_LIST_LIMIT", LIST_LIMIT_CEILING)?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", 8000)?,

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout_secs: parse_var("DB_ACQUIRE_TIMEOUT_SECS", 5)?,

            max_list_limit: max_list_limit.clamp(1, LIST_LIMIT_CEILING),

            cors_allowed_origins: parse_origins(env::var("CORS_ALLOWED_ORIGINS").ok()),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".into(),
            port: 8000,
            db_max_connections: 10,
            db_acquire_timeout_secs: 5,
            max_list_limit: LIST_LIMIT_CEILING,
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        _ => Ok(default),
    }
}

fn parse_origins(raw: Option<String>) -> Vec<String> {
    match raw {
        Some(raw) if raw.trim() != "*" => raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}
