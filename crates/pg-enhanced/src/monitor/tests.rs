use super::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[test]
fn query_type_detection() {
    assert_eq!(QueryType::from_sql("select 1"), QueryType::Select);
    assert_eq!(QueryType::from_sql("  SELECT exists(select 1)"), QueryType::Select);
    assert_eq!(QueryType::from_sql("insert into \"t\" default values"), QueryType::Insert);
    assert_eq!(QueryType::from_sql("update \"t\" set \"a\" = ?"), QueryType::Update);
    assert_eq!(QueryType::from_sql("delete from \"t\""), QueryType::Delete);
    assert_eq!(QueryType::from_sql("alter table \"t\" set logged"), QueryType::Ddl);
    assert_eq!(QueryType::from_sql("create trigger \"x\" after insert on \"t\""), QueryType::Ddl);
    assert_eq!(QueryType::from_sql("drop trigger \"x\" on \"t\""), QueryType::Ddl);
    assert_eq!(QueryType::from_sql("selected_rows"), QueryType::Other);
    assert_eq!(QueryType::from_sql("with x as (select 1) select * from x"), QueryType::Other);
}

#[test]
fn context_tracks_query_type_and_pretend() {
    let ctx = QueryContext::new("update \"t\" set \"a\" = ?", "update \"t\" set \"a\" = $1", 1).pretending(true);
    assert_eq!(ctx.query_type, QueryType::Update);
    assert!(ctx.pretend);
    assert_eq!(ctx.param_count, 1);
}

#[test]
fn error_results_are_truncated() {
    let short = QueryResult::error("boom".into());
    assert_eq!(short.to_string(), "failed: boom");
    assert_eq!(QueryResult::Rows(2).to_string(), "returned 2 row(s)");

    let long = QueryResult::error("é".repeat(400));
    let QueryResult::Error(msg) = long else {
        panic!("expected error result");
    };
    assert!(msg.ends_with("..."));
    assert!(msg.len() <= 512 + 3);
}

#[test]
fn truncation_respects_char_boundaries() {
    assert_eq!(truncate_sql_bytes("héllo", 2), "h");
    assert_eq!(truncate_sql_bytes("abc", 10), "abc");
}

struct Rewrite(&'static str);

impl QueryHook for Rewrite {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        HookAction::ModifySql {
            exec_sql: format!("{} {}", ctx.exec_sql, self.0),
            canonical_sql: None,
        }
    }
}

struct Block;

impl QueryHook for Block {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        if ctx.query_type == QueryType::Ddl {
            HookAction::Abort("ddl is not allowed".into())
        } else {
            HookAction::Continue
        }
    }
}

#[derive(Default)]
struct Counter {
    after: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl QueryHook for Counter {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        self.seen.lock().unwrap().push(ctx.exec_sql.clone());
        HookAction::Continue
    }

    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {
        self.after.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn composite_hook_chains_rewrites() {
    let counter = std::sync::Arc::new(Counter::default());
    let hook = CompositeHook::new()
        .add(Rewrite("/* a */"))
        .add_arc(counter.clone())
        .add(Rewrite("/* b */"));
    assert_eq!(hook.len(), 3);

    let ctx = QueryContext::new("select 1", "select 1", 0);
    match hook.before_query(&ctx) {
        HookAction::ModifySql { exec_sql, canonical_sql } => {
            assert_eq!(exec_sql, "select 1 /* a */ /* b */");
            assert!(canonical_sql.is_none());
        }
        other => panic!("unexpected action: {other:?}"),
    }
    assert_eq!(*counter.seen.lock().unwrap(), ["select 1 /* a */"]);

    hook.after_query(&ctx, Duration::ZERO, &QueryResult::Rows(0));
    assert_eq!(counter.after.load(Ordering::SeqCst), 1);
}

#[test]
fn composite_hook_stops_at_abort() {
    let counter = std::sync::Arc::new(Counter::default());
    let hook = CompositeHook::new().add(Block).add_arc(counter.clone());

    let ctx = QueryContext::new("alter table \"t\" set unlogged", "alter table \"t\" set unlogged", 0);
    assert!(matches!(hook.before_query(&ctx), HookAction::Abort(reason) if reason == "ddl is not allowed"));
    assert!(counter.seen.lock().unwrap().is_empty());

    let ctx = QueryContext::new("select 1", "select 1", 0);
    assert!(matches!(hook.before_query(&ctx), HookAction::Continue));
}

#[test]
fn empty_composite_continues() {
    let hook = CompositeHook::new();
    assert!(hook.is_empty());
    let ctx = QueryContext::new("select 1", "select 1", 0);
    assert!(matches!(hook.before_query(&ctx), HookAction::Continue));
}

#[test]
fn query_log_records_only_when_enabled() {
    let log = QueryLog::new();
    log.record("select 1", vec![], Duration::ZERO);
    assert!(log.entries().is_empty());

    log.enable();
    log.record("select ?", vec!["1".into()], Duration::from_millis(2));
    log.record("select 2", vec![], Duration::ZERO);
    assert_eq!(log.statements(), ["select ?", "select 2"]);
    assert_eq!(log.entries()[0].bindings, ["1"]);

    let taken = log.take();
    assert_eq!(taken.len(), 2);
    assert!(log.entries().is_empty());

    log.record("select 3", vec![], Duration::ZERO);
    log.flush();
    assert!(log.entries().is_empty());

    log.disable();
    log.record("select 4", vec![], Duration::ZERO);
    assert!(!log.is_enabled());
    assert!(log.entries().is_empty());
}

#[cfg(feature = "tracing")]
#[test]
fn tracing_hook_never_rewrites() {
    let hook = TracingSqlHook::new()
        .level(tracing::Level::INFO)
        .max_sql_length(8)
        .log_results();
    assert_eq!(hook.max_sql_length, Some(8));
    assert!(hook.log_results);

    let ctx = QueryContext::new("select * from \"example\"", "select * from \"example\"", 0);
    assert!(matches!(hook.before_query(&ctx), HookAction::Continue));
    hook.after_query(&ctx, Duration::from_micros(10), &QueryResult::Rows(3));

    assert_eq!(TracingSqlHook::new().no_truncate().max_sql_length, None);
}
