use std::{env, time::Duration};

/// The well-known environment variable holding the connection url.
///
/// The library never reads it on its own; call [`Config::from_env`] to
/// perform the lookup explicitly.
pub const POSTGRES_URL_ENV: &str = "POSTGRES_URL";

const BEGIN_SQL: &str = "BEGIN";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Settings for establishing the test connection and its transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Connection url, e.g. `postgres://postgres@127.0.0.1:5432/postgres`.
    /// Ignored when the client is supplied through [`TestDb::on_client`].
    ///
    /// [`TestDb::on_client`]: crate::TestDb::on_client
    pub url: Option<String>,
    /// Time budget for establishing the connection; protocol round trips
    /// after that are bounded against dead peers by the same budget.
    ///
    /// Default is 2 seconds.
    pub timeout: Duration,
    /// Modes for the transaction the handle opens.
    pub tx: TxOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            timeout: DEFAULT_TIMEOUT,
            tx: TxOptions::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Builds a config whose url comes from [`POSTGRES_URL_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: env::var(POSTGRES_URL_ENV).ok(),
            ..Self::default()
        }
    }
}

/// Transaction modes rendered into the opening `BEGIN` statement.
///
/// The default opens a transaction with the server's session defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions {
    pub isolation: Option<IsolationLevel>,
    pub access: Option<AccessMode>,
    pub deferrable: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

impl TxOptions {
    /// Renders the `BEGIN` statement with comma-joined transaction modes.
    #[must_use]
    pub fn begin_sql(&self) -> String {
        let mut modes = Vec::new();
        if let Some(isolation) = self.isolation {
            modes.push(format!("ISOLATION LEVEL {}", isolation.as_sql()));
        }
        if let Some(access) = self.access {
            modes.push(access.as_sql().to_string());
        }
        if let Some(deferrable) = self.deferrable {
            let mode = if deferrable {
                "DEFERRABLE"
            } else {
                "NOT DEFERRABLE"
            };
            modes.push(mode.to_string());
        }

        if modes.is_empty() {
            BEGIN_SQL.to_string()
        } else {
            format!("{BEGIN_SQL} {}", modes.join(", "))
        }
    }
}

impl IsolationLevel {
    fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl AccessMode {
    fn as_sql(self) -> &'static str {
        match self {
            AccessMode::ReadWrite => "READ WRITE",
            AccessMode::ReadOnly => "READ ONLY",
        }
    }
}
