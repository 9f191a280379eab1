use crate::error::{PgError, PgResult};
use serde::Deserialize;
use std::time::Duration;

/// Per-connection settings.
///
/// Deserializable from any serde source (missing fields use their defaults), or read from
/// the environment with [`ConnectionConfig::from_env`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Prefix applied to every table name the grammars wrap.
    pub table_prefix: String,
    /// Record statements without executing them.
    pub pretend: bool,
    /// Start with the query log enabled.
    pub log_queries: bool,
    /// Per-statement timeout in milliseconds. `None` means no timeout (default).
    pub query_timeout_ms: Option<u64>,
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Log statements instead of executing them.
    pub fn pretend(mut self) -> Self {
        self.pretend = true;
        self
    }

    pub fn log_queries(mut self) -> Self {
        self.log_queries = true;
        self
    }

    /// Set the statement timeout.
    ///
    /// Statements exceeding this duration fail with [`PgError::Timeout`].
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }

    /// Read `PG_ENHANCED_TABLE_PREFIX`, `PG_ENHANCED_PRETEND`, `PG_ENHANCED_LOG_QUERIES` and
    /// `PG_ENHANCED_QUERY_TIMEOUT_MS`. Unset variables keep their defaults.
    pub fn from_env() -> PgResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PgResult<Self> {
        let mut config = Self::default();
        if let Some(prefix) = lookup("PG_ENHANCED_TABLE_PREFIX") {
            config.table_prefix = prefix;
        }
        if let Some(value) = lookup("PG_ENHANCED_PRETEND") {
            config.pretend = parse_flag("PG_ENHANCED_PRETEND", &value)?;
        }
        if let Some(value) = lookup("PG_ENHANCED_LOG_QUERIES") {
            config.log_queries = parse_flag("PG_ENHANCED_LOG_QUERIES", &value)?;
        }
        if let Some(value) = lookup("PG_ENHANCED_QUERY_TIMEOUT_MS") {
            let ms = value.trim().parse::<u64>().map_err(|e| {
                PgError::validation(format!("PG_ENHANCED_QUERY_TIMEOUT_MS={value:?}: {e}"))
            })?;
            config.query_timeout_ms = Some(ms);
        }
        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> PgResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(PgError::validation(format!("{key}={value:?} is not a boolean"))),
    }
}
