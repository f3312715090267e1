use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Which stores the binary wires into the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// MySQL + Redis.
    External,
    /// In-process stores; nothing survives a restart.
    Memory,
}

/// Connection parameters for the durable store (MySQL).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DurableConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

/// Connection parameters for the presence cache (Redis).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
}

impl CacheConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_token: String,
    pub backend: StoreBackend,
    pub durable: DurableConfig,
    pub cache: CacheConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_token = get("TELEGRAM_TOKEN").unwrap_or_default();
        if telegram_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_TOKEN environment variable is required".to_string(),
            ));
        }

        let backend = match get("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("external") => StoreBackend::External,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(Error::Config(format!(
                    "STORE_BACKEND must be 'external' or 'memory', got '{other}'"
                )))
            }
        };

        let connect_timeout = Duration::from_millis(
            parse_num(get("STORE_CONNECT_TIMEOUT_MS"), "STORE_CONNECT_TIMEOUT_MS")?
                .unwrap_or(5_000),
        );

        let durable = DurableConfig {
            host: get("MYSQL_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_num(get("MYSQL_PORT"), "MYSQL_PORT")?.unwrap_or(3306),
            user: get("MYSQL_USER").unwrap_or_else(|| "root".to_string()),
            password: get("MYSQL_PASSWORD").unwrap_or_else(|| "mypassword".to_string()),
            database: get("MYSQL_DB").unwrap_or_else(|| "bot_db".to_string()),
            max_connections: parse_num(get("MYSQL_MAX_CONNECTIONS"), "MYSQL_MAX_CONNECTIONS")?
                .unwrap_or(5)
                .max(1),
            connect_timeout,
        };

        let cache = CacheConfig {
            host: get("REDIS_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: parse_num(get("REDIS_PORT"), "REDIS_PORT")?.unwrap_or(6379),
            connect_timeout,
        };

        Ok(Self {
            telegram_token,
            backend,
            durable,
            cache,
        })
    }
}

fn parse_num<T: std::str::FromStr>(raw: Option<String>, key: &str) -> Result<Option<T>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a number, got '{raw}'")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
