//! Routes classified interactions to the stores and picks the reply.
//!
//! Per interaction, in order:
//! 1. append to the interaction log (commands and free text);
//! 2. bump the command counter (commands only);
//! 3. refresh presence (`/start` only);
//! 4. build the reply.
//!
//! Every store step is independent: a failure is logged and the next step
//! still runs. `handle` itself never fails.

use chrono::Utc;

use crate::{
    domain::{CommandKind, Interaction, Sender},
    ports::{NewInteraction, StoreHandles},
    replies,
    stats::StatsAggregator,
};

#[derive(Clone)]
pub struct Dispatcher {
    stores: StoreHandles,
    stats: StatsAggregator,
}

impl Dispatcher {
    pub fn new(stores: StoreHandles) -> Self {
        let stats = StatsAggregator::new(stores.usage.clone());
        Self { stores, stats }
    }

    pub fn stores(&self) -> &StoreHandles {
        &self.stores
    }

    pub async fn handle(&self, interaction: &Interaction) -> String {
        let sender = interaction.sender();

        self.log_interaction(sender, interaction.log_message()).await;

        match interaction {
            Interaction::Command { kind, sender } => {
                self.count_command(*kind, sender).await;
                if *kind == CommandKind::Start {
                    self.touch_presence(sender).await;
                }
                self.command_reply(*kind, sender).await
            }
            Interaction::FreeText { text, .. } => replies::free_text(text),
        }
    }

    async fn log_interaction(&self, sender: &Sender, message: String) {
        let Some(log) = &self.stores.interactions else {
            return;
        };
        let rec = NewInteraction {
            user_id: sender.user_id,
            username: sender.username.clone(),
            message,
        };
        if let Err(e) = log.append(&rec).await {
            tracing::warn!(user_id = sender.user_id.0, error = %e, "interaction log write failed");
        }
    }

    async fn count_command(&self, kind: CommandKind, sender: &Sender) {
        let Some(counters) = &self.stores.counters else {
            return;
        };
        if let Err(e) = counters.increment(kind.name()).await {
            tracing::warn!(
                user_id = sender.user_id.0,
                command = kind.name(),
                error = %e,
                "command counter upsert failed"
            );
        }
    }

    async fn touch_presence(&self, sender: &Sender) {
        let Some(presence) = &self.stores.presence else {
            return;
        };
        if let Err(e) = presence
            .touch(sender.user_id, sender.username.as_deref(), Utc::now())
            .await
        {
            tracing::warn!(user_id = sender.user_id.0, error = %e, "presence write failed");
        }
    }

    async fn command_reply(&self, kind: CommandKind, sender: &Sender) -> String {
        match kind {
            CommandKind::Start => replies::welcome(sender),
            CommandKind::Help => replies::help(),
            CommandKind::Status => replies::status(self.stores.connectivity()),
            CommandKind::Stats => replies::stats(&self.stats.compute().await),
            CommandKind::Docker => replies::docker(),
            CommandKind::K8s => replies::k8s(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::UserId,
        errors::Error,
        memory::{MemoryPresence, MemoryStore},
        ports::{CommandCounters, InteractionLog, PresenceCache},
        stats::StatsReport,
        Result,
    };
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::Arc;

    fn memory_dispatcher() -> (Dispatcher, Arc<MemoryStore>, Arc<MemoryPresence>) {
        let store = Arc::new(MemoryStore::new());
        let presence = Arc::new(MemoryPresence::new());
        let handles = StoreHandles::disconnected()
            .with_durable(store.clone())
            .with_presence(presence.clone());
        (Dispatcher::new(handles), store, presence)
    }

    fn user(id: i64) -> Sender {
        Sender::new(id).with_username(format!("user{id}"))
    }

    struct FailingStore;

    #[async_trait]
    impl InteractionLog for FailingStore {
        async fn append(&self, _rec: &NewInteraction) -> Result<()> {
            Err(Error::WriteFailure("disk full".to_string()))
        }
    }

    #[async_trait]
    impl CommandCounters for FailingStore {
        async fn increment(&self, _command_name: &str) -> Result<()> {
            Err(Error::WriteFailure("lock wait timeout".to_string()))
        }
    }

    #[async_trait]
    impl PresenceCache for FailingStore {
        async fn touch(
            &self,
            _user_id: UserId,
            _username: Option<&str>,
            _at: DateTime<Utc>,
        ) -> Result<()> {
            Err(Error::WriteFailure("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn repeated_command_from_two_users() {
        let (d, store, _) = memory_dispatcher();
        for _ in 0..3 {
            d.handle(&Interaction::command(CommandKind::Docker, user(42)))
                .await;
        }
        d.handle(&Interaction::command(CommandKind::Docker, user(7)))
            .await;

        assert_eq!(store.counter("docker").await.unwrap().count, 4);
        let rows = store.interactions().await;
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.message == "/docker"));
        assert_eq!(rows[3].username.as_deref(), Some("user7"));

        let StatsReport::Ready(s) = d.stats.compute().await else {
            panic!("expected stats");
        };
        assert_eq!(s.unique_users, 2);
    }

    #[tokio::test]
    async fn free_text_is_logged_but_never_counted() {
        let (d, store, _) = memory_dispatcher();

        let reply = d.handle(&Interaction::free_text(user(1), "xyz123")).await;
        assert!(reply.contains("xyz123"));

        let rows = store.interactions().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message, "xyz123");
        assert_eq!(store.counter_count().await, 0);
    }

    #[tokio::test]
    async fn free_text_trigger_beats_echo() {
        let (d, _, _) = memory_dispatcher();
        let reply = d.handle(&Interaction::free_text(user(1), "Docker")).await;
        assert_eq!(reply, "Docker is a great technology! Use /docker for details");
    }

    #[tokio::test]
    async fn blank_text_is_still_logged() {
        let (d, store, _) = memory_dispatcher();
        d.handle(&Interaction::free_text(user(1), "   ")).await;
        assert_eq!(store.interactions().await[0].message, "   ");
    }

    #[tokio::test]
    async fn only_start_touches_presence() {
        let (d, _, presence) = memory_dispatcher();

        for kind in CommandKind::ALL {
            if kind != CommandKind::Start {
                d.handle(&Interaction::command(kind, user(9))).await;
            }
        }
        d.handle(&Interaction::free_text(user(9), "hello")).await;
        assert!(presence.is_empty().await);

        d.handle(&Interaction::command(CommandKind::Start, user(9)))
            .await;
        let p = presence.get(UserId(9)).await.unwrap();
        assert_eq!(p.username.as_deref(), Some("user9"));
        assert_eq!(presence.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let (d, store, _) = memory_dispatcher();
        let d = Arc::new(d);

        d.handle(&Interaction::command(CommandKind::K8s, user(1)))
            .await;
        let before = store.counter("k8s").await.unwrap().count;

        let n = 64;
        let mut tasks = Vec::new();
        for i in 0..n {
            let d = d.clone();
            tasks.push(tokio::spawn(async move {
                d.handle(&Interaction::command(CommandKind::K8s, user(i)))
                    .await
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        assert_eq!(store.counter("k8s").await.unwrap().count, before + n as u64);
        assert_eq!(store.interactions().await.len(), n as usize + 1);
    }

    #[tokio::test]
    async fn without_stores_every_command_still_replies() {
        let d = Dispatcher::new(StoreHandles::disconnected());

        let status = d
            .handle(&Interaction::command(CommandKind::Status, user(1)))
            .await;
        assert!(status.contains("Redis: ❌ Disconnected"));
        assert!(status.contains("MySQL: ❌ Disconnected"));

        let stats = d
            .handle(&Interaction::command(CommandKind::Stats, user(1)))
            .await;
        assert_eq!(stats, "❌ Database unavailable");

        let docker = d
            .handle(&Interaction::command(CommandKind::Docker, user(1)))
            .await;
        assert_eq!(docker, replies::docker());

        let start = d
            .handle(&Interaction::command(CommandKind::Start, user(1)))
            .await;
        assert!(start.contains("DevOps Learning Bot"));
    }

    #[tokio::test]
    async fn failed_log_write_does_not_block_counter() {
        let store = Arc::new(MemoryStore::new());
        let handles = StoreHandles {
            interactions: Some(Arc::new(FailingStore)),
            counters: Some(store.clone()),
            usage: Some(store.clone()),
            presence: Some(Arc::new(FailingStore)),
        };
        let d = Dispatcher::new(handles);

        let reply = d
            .handle(&Interaction::command(CommandKind::Start, user(3)))
            .await;
        assert!(reply.contains("Hi, user3!"));
        assert_eq!(store.counter("start").await.unwrap().count, 1);
        assert!(store.interactions().await.is_empty());
    }

    #[tokio::test]
    async fn failed_counter_does_not_block_log_or_reply() {
        let store = Arc::new(MemoryStore::new());
        let handles = StoreHandles {
            interactions: Some(store.clone()),
            counters: Some(Arc::new(FailingStore)),
            usage: Some(store.clone()),
            presence: None,
        };
        let d = Dispatcher::new(handles);

        let reply = d
            .handle(&Interaction::command(CommandKind::K8s, user(3)))
            .await;
        assert_eq!(reply, replies::k8s());
        assert_eq!(store.interactions().await.len(), 1);
        assert_eq!(store.counter_count().await, 0);
    }

    #[tokio::test]
    async fn stats_command_counts_itself_before_reporting() {
        let (d, _, _) = memory_dispatcher();
        d.handle(&Interaction::free_text(user(1), "hello")).await;
        let reply = d
            .handle(&Interaction::command(CommandKind::Stats, user(2)))
            .await;
        assert!(reply.contains("Unique users: 2"));
        assert!(reply.contains("Total messages: 2"));
        assert!(reply.contains("/stats: 1 time"));
    }
}
