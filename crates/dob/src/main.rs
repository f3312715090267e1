use std::sync::Arc;

use dob_core::{
    config::{Config, StoreBackend},
    dispatcher::Dispatcher,
    memory::{MemoryPresence, MemoryStore},
    ports::StoreHandles,
};
use dob_mysql::MySqlStore;
use dob_redis::RedisPresence;

#[tokio::main]
async fn main() -> Result<(), dob_core::Error> {
    dob_core::logging::init("dob")?;

    let cfg = Arc::new(Config::load()?);

    let stores = match cfg.backend {
        StoreBackend::External => connect_stores(&cfg).await,
        StoreBackend::Memory => {
            tracing::warn!("using in-process stores; nothing will survive a restart");
            StoreHandles::disconnected()
                .with_durable(Arc::new(MemoryStore::new()))
                .with_presence(Arc::new(MemoryPresence::new()))
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(stores));

    tracing::info!("bot starting");
    dob_telegram::router::run_polling(cfg, dispatcher)
        .await
        .map_err(|e| dob_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}

/// Connect to MySQL and Redis once. A store that is down now stays
/// unavailable until the process restarts.
async fn connect_stores(cfg: &Config) -> StoreHandles {
    let mut handles = StoreHandles::disconnected();

    match RedisPresence::connect(&cfg.cache).await {
        Ok(presence) => handles = handles.with_presence(Arc::new(presence)),
        Err(e) => tracing::error!(error = %e, "Redis connection failed"),
    }

    match MySqlStore::connect(&cfg.durable).await {
        Ok(store) => {
            if let Err(e) = store.ensure_schema().await {
                tracing::error!(error = %e, "MySQL schema bootstrap failed");
            }
            handles = handles.with_durable(Arc::new(store));
        }
        Err(e) => tracing::error!(error = %e, "MySQL connection failed"),
    }

    handles
}
