use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A statement recorded by the query log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedQuery {
    /// SQL with `?` placeholders.
    pub sql: String,
    /// Debug rendering of each binding, in placeholder order.
    pub bindings: Vec<String>,
    /// Execution time; zero for pretended statements.
    pub duration: Duration,
}

/// Opt-in in-memory log of executed statements.
///
/// Statements are only recorded while the log is enabled, and only once they completed
/// successfully or were pretended.
#[derive(Debug, Default)]
pub struct QueryLog {
    enabled: AtomicBool,
    entries: Mutex<Vec<LoggedQuery>>,
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LoggedQuery>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a statement if the log is enabled.
    pub fn record(&self, sql: &str, bindings: Vec<String>, duration: Duration) {
        if !self.is_enabled() {
            return;
        }
        self.lock().push(LoggedQuery {
            sql: sql.to_string(),
            bindings,
            duration,
        });
    }

    /// Snapshot of the recorded statements.
    pub fn entries(&self) -> Vec<LoggedQuery> {
        self.lock().clone()
    }

    /// Only the SQL text of the recorded statements.
    pub fn statements(&self) -> Vec<String> {
        self.lock().iter().map(|q| q.sql.clone()).collect()
    }

    /// Remove and return every recorded statement.
    pub fn take(&self) -> Vec<LoggedQuery> {
        std::mem::take(&mut *self.lock())
    }

    pub fn flush(&self) {
        self.lock().clear();
    }
}
