use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::{domain::UserId, Result};

/// A row about to be appended to the interaction log.
///
/// The id and timestamp are assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewInteraction {
    pub user_id: UserId,
    pub username: Option<String>,
    pub message: String,
}

/// A `(command, count)` pair as reported by the stats queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandCount {
    pub name: String,
    pub count: u64,
}

/// Durable, append-only record of every inbound interaction.
#[async_trait]
pub trait InteractionLog: Send + Sync {
    async fn append(&self, rec: &NewInteraction) -> Result<()>;
}

/// Durable per-command usage counters.
#[async_trait]
pub trait CommandCounters: Send + Sync {
    /// Insert the counter with `count = 1`, or bump it and refresh `last_used`.
    ///
    /// Implementations must do this as one atomic operation on the store side.
    async fn increment(&self, command_name: &str) -> Result<()>;
}

/// Read-only aggregate queries over the durable store.
#[async_trait]
pub trait UsageQueries: Send + Sync {
    async fn total_messages(&self) -> Result<u64>;
    async fn unique_users(&self) -> Result<u64>;
    /// Highest counts first; equal counts ordered by name ascending.
    async fn top_commands(&self, limit: usize) -> Result<Vec<CommandCount>>;
}

/// Best-effort "last seen" cache.
#[async_trait]
pub trait PresenceCache: Send + Sync {
    async fn touch(&self, user_id: UserId, username: Option<&str>, at: DateTime<Utc>)
        -> Result<()>;
}

/// Whether each backing store has a live handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connectivity {
    pub cache: bool,
    pub durable: bool,
}

/// Store handles established once at startup.
///
/// `None` means the store could not be reached at startup; it stays that way
/// for the lifetime of the process.
#[derive(Clone, Default)]
pub struct StoreHandles {
    pub interactions: Option<Arc<dyn InteractionLog>>,
    pub counters: Option<Arc<dyn CommandCounters>>,
    pub usage: Option<Arc<dyn UsageQueries>>,
    pub presence: Option<Arc<dyn PresenceCache>>,
}

impl StoreHandles {
    /// No stores at all (fully degraded).
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Wire all three durable ports to one backing store.
    pub fn with_durable<S>(mut self, store: Arc<S>) -> Self
    where
        S: InteractionLog + CommandCounters + UsageQueries + 'static,
    {
        self.interactions = Some(store.clone());
        self.counters = Some(store.clone());
        self.usage = Some(store);
        self
    }

    pub fn with_presence(mut self, presence: Arc<dyn PresenceCache>) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn connectivity(&self) -> Connectivity {
        Connectivity {
            cache: self.presence.is_some(),
            durable: self.interactions.is_some()
                || self.counters.is_some()
                || self.usage.is_some(),
        }
    }
}
