//! MySQL adapter (sqlx).
//!
//! Implements the durable ports of `dob-core` over one connection pool:
//! the interaction log, the command counters and the stats queries.

use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    MySqlPool, Row,
};

use dob_core::{
    config::DurableConfig,
    errors::Error,
    ports::{CommandCount, CommandCounters, InteractionLog, NewInteraction, UsageQueries},
    Result,
};

/// Idempotent schema bootstrap, one statement per table.
pub const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS interaction (
        id BIGINT AUTO_INCREMENT PRIMARY KEY,
        user_id BIGINT NOT NULL,
        username VARCHAR(255) NULL,
        message TEXT NOT NULL,
        timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS command_counter (
        command_name VARCHAR(100) NOT NULL PRIMARY KEY,
        count BIGINT NOT NULL DEFAULT 1,
        last_used DATETIME DEFAULT CURRENT_TIMESTAMP
    )
    "#,
];

const UPSERT_COUNTER: &str = r#"
    INSERT INTO command_counter (command_name)
    VALUES (?)
    ON DUPLICATE KEY UPDATE
        count = count + 1,
        last_used = CURRENT_TIMESTAMP
"#;

const TOP_COMMANDS: &str = r#"
    SELECT command_name, count
    FROM command_counter
    ORDER BY count DESC, command_name ASC
    LIMIT ?
"#;

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Open the pool and make sure the server answers.
    pub async fn connect(cfg: &DurableConfig) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(cfg.connect_timeout)
            .connect_with(connect_options(cfg))
            .await
            .map_err(|e| {
                Error::StoreUnavailable(format!(
                    "mysql {}:{}/{}: {e}",
                    cfg.host, cfg.port, cfg.database
                ))
            })?;

        tracing::info!(host = %cfg.host, port = cfg.port, db = %cfg.database, "connected to MySQL");
        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::WriteFailure(format!("schema bootstrap: {e}")))?;
        }
        Ok(())
    }
}

pub fn connect_options(cfg: &DurableConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.password)
        .database(&cfg.database)
}

fn read_err(what: &str, e: sqlx::Error) -> Error {
    Error::AggregationFailure(format!("{what}: {e}"))
}

fn as_count(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

#[async_trait]
impl InteractionLog for MySqlStore {
    async fn append(&self, rec: &NewInteraction) -> Result<()> {
        sqlx::query("INSERT INTO interaction (user_id, username, message) VALUES (?, ?, ?)")
            .bind(rec.user_id.0)
            .bind(rec.username.as_deref())
            .bind(&rec.message)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::WriteFailure(format!("interaction insert: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl CommandCounters for MySqlStore {
    async fn increment(&self, command_name: &str) -> Result<()> {
        sqlx::query(UPSERT_COUNTER)
            .bind(command_name)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::WriteFailure(format!("counter upsert: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl UsageQueries for MySqlStore {
    async fn total_messages(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM interaction")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| read_err("total messages", e))?;
        Ok(as_count(n))
    }

    async fn unique_users(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM interaction")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| read_err("unique users", e))?;
        Ok(as_count(n))
    }

    async fn top_commands(&self, limit: usize) -> Result<Vec<CommandCount>> {
        let rows = sqlx::query(TOP_COMMANDS)
            .bind(limit as u64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_err("top commands", e))?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row
                .try_get("command_name")
                .map_err(|e| read_err("top commands", e))?;
            let count: i64 = row
                .try_get("count")
                .map_err(|e| read_err("top commands", e))?;
            results.push(CommandCount {
                name,
                count: as_count(count),
            });
        }
        Ok(results)
    }
}
