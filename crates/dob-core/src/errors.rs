/// Core error type for the bot.
///
/// Adapter crates map their driver errors into this type so the dispatcher can
/// treat every store the same way: log the failure, skip the step, keep going.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// A store could not be reached when the process started.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A write (log append, counter upsert, presence touch) failed mid-call.
    #[error("store write failed: {0}")]
    WriteFailure(String),

    /// A read query backing the stats report failed.
    #[error("stats query failed: {0}")]
    AggregationFailure(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
