//! Statement hooks and the query log.
//!
//! Every statement a [`Connection`](crate::Connection) sends passes through an optional
//! [`QueryHook`] (inspect, rewrite or abort) and, when enabled, is recorded in the
//! connection's [`QueryLog`] with the `?`-placeholder SQL the grammar produced.
//!
//! # Example
//!
//! ```rust,ignore
//! use pg_enhanced::monitor::{CompositeHook, TracingSqlHook};
//!
//! let conn = Connection::new(client).with_hook(
//!     CompositeHook::new().add(TracingSqlHook::new().log_results()),
//! );
//! conn.enable_query_log();
//! ```

mod hooks;
mod log;
mod types;

#[cfg(feature = "tracing")]
mod tracing_hook;

#[cfg(test)]
mod tests;

pub use hooks::CompositeHook;
pub use log::{LoggedQuery, QueryLog};
pub use types::{HookAction, QueryContext, QueryHook, QueryResult, QueryType};

#[cfg(feature = "tracing")]
pub use tracing_hook::TracingSqlHook;

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
