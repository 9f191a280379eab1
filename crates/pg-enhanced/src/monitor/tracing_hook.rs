use super::truncate_sql_bytes;
use super::types::{HookAction, QueryContext, QueryHook, QueryResult};
use std::borrow::Cow;
use std::time::Duration;
use tracing::Level;

const TARGET: &str = "pg_enhanced.sql";

macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN => tracing::warn!($($field)*),
            Level::INFO => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

/// Emits each statement as a `tracing` event on the `pg_enhanced.sql` target.
///
/// The event carries the `?`-placeholder SQL, the parameter count and whether the
/// connection is pretending. With [`log_results`](Self::log_results) a second event
/// reports the elapsed time and outcome.
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    pub level: Level,
    /// Byte limit for the logged SQL; `None` logs it whole.
    pub max_sql_length: Option<usize>,
    pub log_results: bool,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
            log_results: false,
        }
    }
}

impl TracingSqlHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(self, level: Level) -> Self {
        Self { level, ..self }
    }

    pub fn max_sql_length(self, bytes: usize) -> Self {
        Self {
            max_sql_length: Some(bytes),
            ..self
        }
    }

    pub fn no_truncate(self) -> Self {
        Self {
            max_sql_length: None,
            ..self
        }
    }

    pub fn log_results(self) -> Self {
        Self {
            log_results: true,
            ..self
        }
    }

    fn display_sql<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        match self.max_sql_length {
            Some(limit) if sql.len() > limit => Cow::Owned(format!("{}...", truncate_sql_bytes(sql, limit))),
            _ => Cow::Borrowed(sql),
        }
    }
}

impl QueryHook for TracingSqlHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let sql = self.display_sql(&ctx.canonical_sql);
        emit_at_level!(
            self.level,
            target: TARGET,
            kind = ?ctx.query_type,
            params = ctx.param_count,
            pretend = ctx.pretend,
            sql = %sql,
        );
        HookAction::Continue
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if self.log_results {
            emit_at_level!(
                self.level,
                target: TARGET,
                kind = ?ctx.query_type,
                elapsed_ms = duration.as_secs_f64() * 1000.0,
                outcome = %result,
            );
        }
    }
}
