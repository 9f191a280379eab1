use super::types::{HookAction, QueryContext, QueryHook, QueryResult, QueryType};
use std::sync::Arc;
use std::time::Duration;

/// A list of hooks consulted one after another for every statement.
///
/// Each hook sees the statement as rewritten by the hooks before it. An `Abort` ends the
/// chain immediately and later hooks never see the statement.
#[derive(Clone, Default)]
pub struct CompositeHook {
    chain: Vec<Arc<dyn QueryHook>>,
}

impl CompositeHook {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.add_arc(Arc::new(hook))
    }

    /// Add a hook that is shared with other owners, e.g. a counter inspected by tests.
    pub fn add_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.chain.push(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

/// Statement state threaded through the chain.
struct Rewritten {
    ctx: QueryContext,
    exec_changed: bool,
    canonical_changed: bool,
}

impl Rewritten {
    fn apply(&mut self, exec_sql: String, canonical_sql: Option<String>) {
        self.exec_changed |= exec_sql != self.ctx.exec_sql;
        self.ctx.exec_sql = exec_sql;
        if let Some(canonical) = canonical_sql {
            self.canonical_changed |= canonical != self.ctx.canonical_sql;
            self.ctx.query_type = QueryType::from_sql(&canonical);
            self.ctx.canonical_sql = canonical;
        }
    }

    fn into_action(self) -> HookAction {
        if !self.exec_changed && !self.canonical_changed {
            return HookAction::Continue;
        }
        HookAction::ModifySql {
            exec_sql: self.ctx.exec_sql,
            canonical_sql: self.canonical_changed.then_some(self.ctx.canonical_sql),
        }
    }
}

impl QueryHook for CompositeHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let mut state = Rewritten {
            ctx: ctx.clone(),
            exec_changed: false,
            canonical_changed: false,
        };
        for hook in &self.chain {
            match hook.before_query(&state.ctx) {
                HookAction::Continue => continue,
                HookAction::ModifySql { exec_sql, canonical_sql } => state.apply(exec_sql, canonical_sql),
                abort @ HookAction::Abort(_) => return abort,
            }
        }
        state.into_action()
    }

    fn after_query(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        self.chain
            .iter()
            .for_each(|hook| hook.after_query(ctx, duration, result));
    }
}
