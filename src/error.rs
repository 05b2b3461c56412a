use std::{error::Error as StdError, time::Duration};

use thiserror::Error;

/// Failures while setting up the test fixture.
///
/// These are fatal: the constructors surface them by panicking, failing the
/// enclosing test immediately. A test cannot meaningfully proceed without
/// its transaction.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no connection url: set `Config.url` or build the config with `Config::from_env`")]
    MissingUrl,
    #[error("failed to connect to postgres within {timeout:?}: {source}")]
    Connect {
        timeout: Duration,
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error("failed to begin test transaction with `{begin_sql}`: {source}")]
    Begin {
        begin_sql: String,
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// Failure while rolling the test transaction back at teardown.
///
/// Fatal as well, surfaced after the test body has run.
#[derive(Debug, Error)]
#[error("failed to roll back test transaction: {source}")]
pub struct RollbackError {
    pub source: Box<dyn StdError + Send + Sync>,
}
