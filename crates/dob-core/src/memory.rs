//! In-process stores.
//!
//! Used for local runs without MySQL/Redis (`STORE_BACKEND=memory`) and as the
//! backing store in tests. Everything lives behind one mutex per store, so the
//! counter increment-or-insert is a single critical section.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    domain::UserId,
    ports::{CommandCount, CommandCounters, InteractionLog, NewInteraction, PresenceCache, UsageQueries},
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionRecord {
    pub id: u64,
    pub user_id: UserId,
    pub username: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterRecord {
    pub count: u64,
    pub last_used: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresenceRecord {
    pub username: Option<String>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    interactions: Vec<InteractionRecord>,
    counters: HashMap<String, CounterRecord>,
}

/// Durable-store stand-in: interaction log, command counters and stats queries.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn interactions(&self) -> Vec<InteractionRecord> {
        self.tables.lock().await.interactions.clone()
    }

    pub async fn counter(&self, command_name: &str) -> Option<CounterRecord> {
        self.tables.lock().await.counters.get(command_name).cloned()
    }

    pub async fn counter_count(&self) -> usize {
        self.tables.lock().await.counters.len()
    }
}

#[async_trait]
impl InteractionLog for MemoryStore {
    async fn append(&self, rec: &NewInteraction) -> Result<()> {
        let mut t = self.tables.lock().await;
        let id = t.interactions.len() as u64 + 1;
        t.interactions.push(InteractionRecord {
            id,
            user_id: rec.user_id,
            username: rec.username.clone(),
            message: rec.message.clone(),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl CommandCounters for MemoryStore {
    async fn increment(&self, command_name: &str) -> Result<()> {
        let now = Utc::now();
        let mut t = self.tables.lock().await;
        t.counters
            .entry(command_name.to_string())
            .and_modify(|c| {
                c.count += 1;
                c.last_used = now;
            })
            .or_insert(CounterRecord {
                count: 1,
                last_used: now,
            });
        Ok(())
    }
}

#[async_trait]
impl UsageQueries for MemoryStore {
    async fn total_messages(&self) -> Result<u64> {
        Ok(self.tables.lock().await.interactions.len() as u64)
    }

    async fn unique_users(&self) -> Result<u64> {
        let t = self.tables.lock().await;
        let users: BTreeSet<UserId> = t.interactions.iter().map(|r| r.user_id).collect();
        Ok(users.len() as u64)
    }

    async fn top_commands(&self, limit: usize) -> Result<Vec<CommandCount>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<CommandCount> = t
            .counters
            .iter()
            .map(|(name, c)| CommandCount {
                name: name.clone(),
                count: c.count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        rows.truncate(limit);
        Ok(rows)
    }
}

/// Presence-cache stand-in.
#[derive(Default)]
pub struct MemoryPresence {
    entries: Mutex<HashMap<UserId, PresenceRecord>>,
}

impl MemoryPresence {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: UserId) -> Option<PresenceRecord> {
        self.entries.lock().await.get(&user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl PresenceCache for MemoryPresence {
    async fn touch(
        &self,
        user_id: UserId,
        username: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.entries.lock().await.insert(
            user_id,
            PresenceRecord {
                username: username.map(|s| s.to_string()),
                last_seen: at,
            },
        );
        Ok(())
    }
}
