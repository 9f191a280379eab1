//! Statement execution.
//!
//! A [`Connection`] wraps any [`GenericClient`] together with the grammars, an optional
//! [`QueryHook`] and a [`QueryLog`]. Grammars compile SQL with `?` placeholders; the
//! connection logs that text, rewrites the placeholders to `$1..$n` and sends the statement.

use crate::client::GenericClient;
use crate::config::ConnectionConfig;
use crate::error::{PgError, PgResult};
use crate::monitor::{HookAction, LoggedQuery, QueryContext, QueryHook, QueryLog, QueryResult, QueryType};
use crate::param::Bindings;
use crate::query::QueryGrammar;
use crate::schema::SchemaGrammar;
use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio_postgres::Row;

/// Rewrite `?` placeholders to `$1..$n`, returning the new SQL and the placeholder count.
///
/// Question marks are left alone inside string literals (including `E'...'` escape strings
/// and `$tag$...$tag$` bodies), double-quoted identifiers and comments. `??` is an escaped
/// literal `?` (for the jsonb `?`, `?|` and `?&` operators).
pub fn rewrite_placeholders(sql: &str) -> (String, usize) {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut count = 0;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        let skip_to = match bytes[i] {
            b'\'' => Some(quoted_end(bytes, i, b'\'', is_escape_string(bytes, i))),
            b'"' => Some(quoted_end(bytes, i, b'"', false)),
            b'-' if bytes.get(i + 1) == Some(&b'-') => Some(line_comment_end(bytes, i)),
            b'/' if bytes.get(i + 1) == Some(&b'*') => Some(block_comment_end(bytes, i)),
            b'$' => dollar_quote_end(sql, i),
            _ => None,
        };
        if let Some(end) = skip_to {
            i = end;
            continue;
        }
        if bytes[i] != b'?' {
            i += 1;
            continue;
        }

        out.push_str(&sql[copied..i]);
        if bytes.get(i + 1) == Some(&b'?') {
            out.push('?');
            i += 2;
        } else {
            count += 1;
            let _ = write!(out, "${count}");
            i += 1;
        }
        copied = i;
    }
    out.push_str(&sql[copied..]);
    (out, count)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// `E'...'` or `e'...'`, where the `E` is not the tail of a longer word.
fn is_escape_string(bytes: &[u8], quote: usize) -> bool {
    match quote.checked_sub(1) {
        Some(prefix) if matches!(bytes[prefix], b'E' | b'e') => prefix == 0 || !is_ident_byte(bytes[prefix - 1]),
        _ => false,
    }
}

/// Index just past the closing quote. A doubled quote closes and reopens, which
/// scans the same as an escaped one.
fn quoted_end(bytes: &[u8], open: usize, quote: u8, backslash_escapes: bool) -> usize {
    let mut j = open + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' if backslash_escapes => j += 2,
            b if b == quote => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

fn line_comment_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |pos| start + pos + 1)
}

/// Block comments nest in PostgreSQL.
fn block_comment_end(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut j = start;
    while j + 1 < bytes.len() {
        match (bytes[j], bytes[j + 1]) {
            (b'/', b'*') => {
                depth += 1;
                j += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                j += 2;
                if depth == 0 {
                    return j;
                }
            }
            _ => j += 1,
        }
    }
    bytes.len()
}

/// End of a `$tag$...$tag$` body starting at `start`, or `None` when the `$` opens no
/// dollar quote (`$1` parameters, `$` inside identifiers).
fn dollar_quote_end(sql: &str, start: usize) -> Option<usize> {
    let bytes = sql.as_bytes();
    if start > 0 && is_ident_byte(bytes[start - 1]) {
        return None;
    }
    let tag_len = bytes[start + 1..].iter().take_while(|&&b| is_ident_byte(b)).count();
    let close = start + 1 + tag_len;
    if bytes.get(close) != Some(&b'$') || bytes.get(start + 1).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let tag = &sql[start..=close];
    let body = close + 1;
    Some(sql[body..].find(tag).map_or(sql.len(), |pos| body + pos + tag.len()))
}

/// A database connection bound to the PostgreSQL grammars.
pub struct Connection<C> {
    client: C,
    config: ConnectionConfig,
    query_grammar: QueryGrammar,
    schema_grammar: SchemaGrammar,
    hook: Option<Arc<dyn QueryHook>>,
    pretend: AtomicBool,
    query_log: QueryLog,
}

impl<C: GenericClient> Connection<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, ConnectionConfig::default())
    }

    pub fn with_config(client: C, config: ConnectionConfig) -> Self {
        let query_log = QueryLog::new();
        if config.log_queries {
            query_log.enable();
        }
        Self {
            client,
            query_grammar: QueryGrammar::with_table_prefix(&config.table_prefix),
            schema_grammar: SchemaGrammar::with_table_prefix(&config.table_prefix),
            hook: None,
            pretend: AtomicBool::new(config.pretend),
            query_log,
            config,
        }
    }

    /// Run every statement through `hook`.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn query_grammar(&self) -> &QueryGrammar {
        &self.query_grammar
    }

    pub fn schema_grammar(&self) -> &SchemaGrammar {
        &self.schema_grammar
    }

    // ==================== Pretend mode ====================

    /// Whether statements are logged without being executed.
    pub fn pretending(&self) -> bool {
        self.pretend.load(Ordering::Relaxed)
    }

    pub fn set_pretending(&self, pretend: bool) {
        self.pretend.store(pretend, Ordering::Relaxed);
    }

    // ==================== Query log ====================

    pub fn enable_query_log(&self) {
        self.query_log.enable();
    }

    pub fn disable_query_log(&self) {
        self.query_log.disable();
    }

    pub fn logging(&self) -> bool {
        self.query_log.is_enabled()
    }

    /// Statements recorded since the log was enabled or last flushed.
    pub fn query_log(&self) -> Vec<LoggedQuery> {
        self.query_log.entries()
    }

    pub fn flush_query_log(&self) {
        self.query_log.flush();
    }

    // ==================== Execution ====================

    fn prepare(&self, sql: &str, bindings: &Bindings) -> PgResult<QueryContext> {
        let (exec_sql, placeholders) = rewrite_placeholders(sql);
        // SQL written with native `$n` placeholders passes through unchecked.
        if placeholders > 0 && placeholders != bindings.len() {
            return Err(PgError::validation(format!(
                "statement has {placeholders} placeholders but {} bindings: {sql}",
                bindings.len()
            )));
        }

        let mut ctx = QueryContext::new(sql, &exec_sql, bindings.len()).pretending(self.pretending());
        let Some(hook) = &self.hook else {
            return Ok(ctx);
        };
        match hook.before_query(&ctx) {
            HookAction::Continue => {}
            HookAction::ModifySql {
                exec_sql,
                canonical_sql,
            } => {
                ctx.exec_sql = exec_sql;
                if let Some(canonical_sql) = canonical_sql {
                    ctx.canonical_sql = canonical_sql;
                }
                ctx.query_type = QueryType::from_sql(&ctx.canonical_sql);
            }
            HookAction::Abort(reason) => {
                return Err(PgError::validation(format!("Query aborted by hook: {reason}")));
            }
        }
        Ok(ctx)
    }

    fn complete(&self, ctx: &QueryContext, bindings: &Bindings, duration: Duration, result: &QueryResult) {
        if let Some(hook) = &self.hook {
            hook.after_query(ctx, duration, result);
        }
        if !matches!(result, QueryResult::Error(_)) {
            self.query_log.record(&ctx.canonical_sql, bindings.describe(), duration);
        }
    }

    async fn with_timeout<T>(&self, future: impl Future<Output = PgResult<T>>) -> PgResult<T> {
        match self.config.query_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| PgError::Timeout(timeout))?,
            None => future.await,
        }
    }

    /// Run a statement and return the rows it produced (usually through `returning`).
    ///
    /// In pretend mode the statement is only logged and no rows are returned.
    pub async fn returning_statement(&self, sql: &str, bindings: &Bindings) -> PgResult<Vec<Row>> {
        let ctx = self.prepare(sql, bindings)?;
        if ctx.pretend {
            self.complete(&ctx, bindings, Duration::ZERO, &QueryResult::Pretended);
            return Ok(Vec::new());
        }

        let params = bindings.as_refs();
        let start = Instant::now();
        let result = self.with_timeout(self.client.query(&ctx.exec_sql, &params)).await;
        let duration = start.elapsed();

        let outcome = match &result {
            Ok(rows) => QueryResult::Rows(rows.len()),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.complete(&ctx, bindings, duration, &outcome);
        result
    }

    /// Run a statement and return the number of affected rows. Pretend mode reports `0`.
    pub async fn statement(&self, sql: &str, bindings: &Bindings) -> PgResult<u64> {
        let ctx = self.prepare(sql, bindings)?;
        if ctx.pretend {
            self.complete(&ctx, bindings, Duration::ZERO, &QueryResult::Pretended);
            return Ok(0);
        }

        let params = bindings.as_refs();
        let start = Instant::now();
        let result = self.with_timeout(self.client.execute(&ctx.exec_sql, &params)).await;
        let duration = start.elapsed();

        let outcome = match &result {
            Ok(n) => QueryResult::Affected(*n),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.complete(&ctx, bindings, duration, &outcome);
        result
    }

    /// Run a `select exists(...) as "exists"` statement.
    ///
    /// No rows (pretend mode) reads as `false`.
    pub async fn select_exists(&self, sql: &str, bindings: &Bindings) -> PgResult<bool> {
        let rows = self.returning_statement(sql, bindings).await?;
        match rows.first() {
            Some(row) => row
                .try_get::<_, bool>("exists")
                .map_err(|e| PgError::decode("exists", e.to_string())),
            None => Ok(false),
        }
    }
}
