use std::sync::Arc;

use crate::{
    ports::{CommandCount, UsageQueries},
    Result,
};

/// How many commands the stats report lists.
pub const TOP_COMMANDS_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsageStats {
    pub total_messages: u64,
    pub unique_users: u64,
    pub top_commands: Vec<CommandCount>,
}

/// Outcome of a stats computation.
///
/// There is no partial variant: either every figure was read, or none is shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatsReport {
    Ready(UsageStats),
    Unavailable,
}

/// Read-only point-in-time summary over the durable store.
#[derive(Clone)]
pub struct StatsAggregator {
    usage: Option<Arc<dyn UsageQueries>>,
}

impl StatsAggregator {
    pub fn new(usage: Option<Arc<dyn UsageQueries>>) -> Self {
        Self { usage }
    }

    pub async fn compute(&self) -> StatsReport {
        let Some(usage) = &self.usage else {
            return StatsReport::Unavailable;
        };

        match collect(usage.as_ref()).await {
            Ok(stats) => StatsReport::Ready(stats),
            Err(e) => {
                tracing::warn!(error = %e, "stats aggregation failed");
                StatsReport::Unavailable
            }
        }
    }
}

async fn collect(usage: &dyn UsageQueries) -> Result<UsageStats> {
    let total_messages = usage.total_messages().await?;
    let unique_users = usage.unique_users().await?;
    let mut top_commands = usage.top_commands(TOP_COMMANDS_LIMIT).await?;

    // Do not trust the store to honour the limit or the ordering.
    top_commands.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    top_commands.truncate(TOP_COMMANDS_LIMIT);

    Ok(UsageStats {
        total_messages,
        unique_users,
        top_commands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::UserId,
        errors::Error,
        memory::MemoryStore,
        ports::{CommandCounters, InteractionLog, NewInteraction},
    };
    use async_trait::async_trait;

    #[derive(Default)]
    struct BrokenQueries {
        fail_top: bool,
        ties: bool,
    }

    #[async_trait]
    impl UsageQueries for BrokenQueries {
        async fn total_messages(&self) -> Result<u64> {
            Ok(7)
        }

        async fn unique_users(&self) -> Result<u64> {
            Ok(2)
        }

        async fn top_commands(&self, _limit: usize) -> Result<Vec<CommandCount>> {
            if self.fail_top {
                return Err(Error::AggregationFailure("connection reset".to_string()));
            }
            if self.ties {
                // Equal counts, out of name order, plus one extra row.
                return Ok(["k8s", "docker", "status", "help", "stats", "start"]
                    .into_iter()
                    .map(|name| CommandCount {
                        name: name.to_string(),
                        count: 3,
                    })
                    .collect());
            }
            // Ignores the limit on purpose.
            Ok((0..8u64)
                .map(|i| CommandCount {
                    name: format!("cmd{i}"),
                    count: i,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn missing_store_is_unavailable() {
        let agg = StatsAggregator::new(None);
        assert_eq!(agg.compute().await, StatsReport::Unavailable);
    }

    #[tokio::test]
    async fn any_failed_query_makes_the_whole_report_unavailable() {
        let agg = StatsAggregator::new(Some(Arc::new(BrokenQueries {
            fail_top: true,
            ..Default::default()
        })));
        assert_eq!(agg.compute().await, StatsReport::Unavailable);
    }

    #[tokio::test]
    async fn top_commands_capped_and_sorted_descending() {
        let agg = StatsAggregator::new(Some(Arc::new(BrokenQueries::default())));
        let StatsReport::Ready(s) = agg.compute().await else {
            panic!("expected stats");
        };
        assert_eq!(s.top_commands.len(), TOP_COMMANDS_LIMIT);
        let counts: Vec<u64> = s.top_commands.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![7, 6, 5, 4, 3]);
    }

    #[tokio::test]
    async fn equal_counts_are_ordered_by_name() {
        let agg = StatsAggregator::new(Some(Arc::new(BrokenQueries {
            ties: true,
            ..Default::default()
        })));
        let StatsReport::Ready(s) = agg.compute().await else {
            panic!("expected stats");
        };
        let names: Vec<&str> = s.top_commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["docker", "help", "k8s", "start", "stats"]);
    }

    #[tokio::test]
    async fn unique_users_ignores_repeat_interactions() {
        let store = Arc::new(MemoryStore::new());
        for (user, n) in [(1, 5), (2, 1), (3, 2)] {
            for _ in 0..n {
                store
                    .append(&NewInteraction {
                        user_id: UserId(user),
                        username: None,
                        message: "hi".to_string(),
                    })
                    .await
                    .unwrap();
            }
        }
        for name in ["a", "b", "c", "d", "e", "f"] {
            store.increment(name).await.unwrap();
        }

        let StatsReport::Ready(s) = StatsAggregator::new(Some(store)).compute().await else {
            panic!("expected stats");
        };
        assert_eq!(s.unique_users, 3);
        assert_eq!(s.total_messages, 8);
        assert_eq!(s.top_commands.len(), 5);
        assert_eq!(s.top_commands[0].name, "a");
    }
}
