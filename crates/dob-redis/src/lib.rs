//! Redis adapter for the presence cache.
//!
//! One hash per user: `user:{id}` with `username` and `last_seen` fields.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use redis::{aio::ConnectionManager, AsyncCommands};

use dob_core::{config::CacheConfig, domain::UserId, errors::Error, ports::PresenceCache, Result};

/// Stored when the Telegram user has no `@username`.
pub const UNKNOWN_USERNAME: &str = "Unknown";

/// Presence cache over a multiplexed, auto-reconnecting Redis connection.
///
/// `ConnectionManager` is cheap to clone and safe to use from many tasks.
#[derive(Clone)]
pub struct RedisPresence {
    conn: ConnectionManager,
}

impl RedisPresence {
    pub async fn connect(cfg: &CacheConfig) -> Result<Self> {
        let url = cfg.url();
        let client = redis::Client::open(url.as_str())
            .map_err(|e| Error::StoreUnavailable(format!("redis {url}: {e}")))?;

        let conn = tokio::time::timeout(cfg.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| Error::StoreUnavailable(format!("redis {url}: connect timed out")))?
            .map_err(|e| Error::StoreUnavailable(format!("redis {url}: {e}")))?;

        tracing::info!(%url, "connected to Redis");
        Ok(Self { conn })
    }
}

pub fn presence_key(user_id: UserId) -> String {
    format!("user:{}", user_id.0)
}

/// Field/value pairs written on every touch.
pub fn presence_fields(username: Option<&str>, at: DateTime<Utc>) -> [(&'static str, String); 2] {
    [
        (
            "username",
            username.unwrap_or(UNKNOWN_USERNAME).to_string(),
        ),
        ("last_seen", at.to_rfc3339_opts(SecondsFormat::Micros, true)),
    ]
}

#[async_trait]
impl PresenceCache for RedisPresence {
    async fn touch(
        &self,
        user_id: UserId,
        username: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.hset_multiple::<_, _, _, ()>(presence_key(user_id), &presence_fields(username, at))
            .await
            .map_err(|e| Error::WriteFailure(format!("presence hset: {e}")))
    }
}
