use std::fmt;
use std::time::Duration;

/// The kind of statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// `create`, `alter` and `drop` statements.
    Ddl,
    Other,
}

impl QueryType {
    /// Classify a statement by its leading keyword, ignoring case.
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql
            .trim_start()
            .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match keyword.as_str() {
            "select" => Self::Select,
            "insert" => Self::Insert,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "create" | "alter" | "drop" => Self::Ddl,
            _ => Self::Other,
        }
    }
}

/// What a hook gets to see about a statement.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// SQL with `?` placeholders, as compiled by the grammar and recorded in the query log.
    pub canonical_sql: String,
    /// The SQL sent to Postgres, with `$n` placeholders.
    pub exec_sql: String,
    pub param_count: usize,
    /// Detected statement kind.
    pub query_type: QueryType,
    /// Whether the connection is pretending (nothing is sent).
    pub pretend: bool,
}

impl QueryContext {
    pub fn new(canonical_sql: &str, exec_sql: &str, param_count: usize) -> Self {
        Self {
            canonical_sql: canonical_sql.to_string(),
            exec_sql: exec_sql.to_string(),
            param_count,
            query_type: QueryType::from_sql(canonical_sql),
            pretend: false,
        }
    }

    pub fn pretending(mut self, pretend: bool) -> Self {
        self.pretend = pretend;
        self
    }
}

const MAX_ERROR_LEN: usize = 512;

/// Outcome of a statement, reported to [`QueryHook::after_query`].
#[derive(Debug, Clone)]
pub enum QueryResult {
    /// Statement returned rows.
    Rows(usize),
    /// Statement affected rows.
    Affected(u64),
    /// Nothing was executed (pretend mode).
    Pretended,
    /// Statement failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryResult {
    /// Create an error result, truncating long messages.
    pub fn error(msg: String) -> Self {
        if msg.len() <= MAX_ERROR_LEN {
            return Self::Error(msg);
        }
        Self::Error(format!("{}...", super::truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows(n) => write!(f, "returned {n} row(s)"),
            Self::Affected(n) => write!(f, "affected {n} row(s)"),
            Self::Pretended => f.write_str("not sent (pretending)"),
            Self::Error(message) => write!(f, "failed: {message}"),
        }
    }
}

/// A hook's verdict on a statement.
#[derive(Debug, Clone)]
pub enum HookAction {
    Continue,
    /// Send `exec_sql` instead. `canonical_sql`, when set, replaces the logged text too.
    ModifySql {
        exec_sql: String,
        canonical_sql: Option<String>,
    },
    /// Fail the statement with [`PgError::Validation`](crate::PgError::Validation).
    Abort(String),
}

/// Trait for hooking into the statement execution lifecycle.
///
/// Hooks run for every statement a [`Connection`](crate::Connection) sends, including
/// statements suppressed by pretend mode.
pub trait QueryHook: Send + Sync {
    fn before_query(&self, _ctx: &QueryContext) -> HookAction {
        HookAction::Continue
    }

    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}
