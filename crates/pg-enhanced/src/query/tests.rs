use super::*;
use crate::client::GenericClient;
use crate::connection::Connection;
use crate::config::ConnectionConfig;
use crate::error::PgResult;
use crate::record::Batch;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_postgres::Row;

struct DummyClient;

impl GenericClient for DummyClient {
    async fn query(&self, _: &str, _: &[&(dyn ToSql + Sync)]) -> PgResult<Vec<Row>> {
        Ok(vec![])
    }
    async fn execute(&self, _: &str, _: &[&(dyn ToSql + Sync)]) -> PgResult<u64> {
        Ok(0)
    }
}

fn grammar() -> QueryGrammar {
    QueryGrammar::new()
}

fn logged_conn() -> Connection<DummyClient> {
    let conn = Connection::new(DummyClient);
    conn.enable_query_log();
    conn
}

fn statements(conn: &Connection<DummyClient>) -> Vec<String> {
    conn.query_log().into_iter().map(|q| q.sql).collect()
}

// ==================== WHERE ====================

#[test]
fn select_with_basic_wheres() {
    let q = table("users").where_eq("id", 1i64).or_where_op("age", ">", 30i32);
    assert_eq!(
        grammar().compile_select(&q),
        "select * from \"users\" where \"id\" = ? or \"age\" > ?"
    );
    assert_eq!(q.select_bindings().len(), 2);
}

#[test]
fn basic_like_operator_casts_to_text() {
    let q = table("users").where_op("name", "ilike", "%a%");
    assert_eq!(
        grammar().compile_select(&q),
        "select * from \"users\" where \"name\"::text ilike ?"
    );
}

#[test]
fn where_like_and_ilike() {
    let q = table("users")
        .where_like("name", "Jo%", false)
        .or_where_like("email", "%@EXAMPLE.com", true);
    assert_eq!(
        grammar().compile_select(&q),
        "select * from \"users\" where \"name\" like ? or \"email\" ilike ?"
    );
    assert_eq!(q.select_bindings().describe(), ["\"Jo%\"", "\"%@EXAMPLE.com\""]);
}

#[test]
fn between_symmetric_variants() {
    let q = table("items")
        .where_between_symmetric("price", (10i32, 1i32))
        .where_not_between_symmetric("stock", (5i32, 0i32))
        .or_where_between_symmetric(
            "weight",
            BetweenValues::new(Value::raw("min_weight()"), Value::bind(3i32)),
        )
        .or_where_not_between_symmetric("size", (1i32, 2i32));
    assert_eq!(
        grammar().compile_select(&q),
        "select * from \"items\" where \"price\" between symmetric ? and ? \
         and \"stock\" not between symmetric ? and ? \
         or \"weight\" between symmetric min_weight() and ? \
         or \"size\" not between symmetric ? and ?"
    );
    assert_eq!(q.select_bindings().describe(), ["10", "1", "5", "0", "3", "1", "2"]);
}

#[test]
fn empty_in_lists() {
    let q = table("users")
        .where_in::<i64>("id", vec![])
        .where_not_in::<i64>("id", vec![]);
    assert_eq!(grammar().compile_select(&q), "select * from \"users\" where 0 = 1 and 1 = 1");
}

#[test]
fn in_null_and_raw() {
    let q = table("users")
        .where_in("id", vec![1i64, 2, 3])
        .where_null("deleted_at")
        .where_not_null("email")
        .where_raw("score > ?", vec![Param::new(5i32)]);
    assert_eq!(
        grammar().compile_select(&q),
        "select * from \"users\" where \"id\" in (?, ?, ?) and \"deleted_at\" is null \
         and \"email\" is not null and score > ?"
    );
    assert_eq!(q.select_bindings().len(), 4);
}

#[test]
fn nested_groups_and_empty_groups() {
    let q = table("users")
        .where_nested(|q| q.where_eq("a", 1i32).or_where_op("b", "=", 2i32))
        .where_nested(|q| q)
        .where_record(&Record::new());
    assert_eq!(
        grammar().compile_select(&q),
        "select * from \"users\" where (\"a\" = ? or \"b\" = ?)"
    );
}

#[test]
fn exists_query() {
    let q = table("example").where_record(&Record::new().set("str", "a"));
    assert_eq!(
        q.compile_exists(&grammar()).sql,
        "select exists(select * from \"example\" where (\"str\" = ?)) as \"exists\""
    );
}

// ==================== JOIN ====================

#[test]
fn joins() {
    let q = table("users")
        .join("posts", "users.id", "=", "posts.user_id")
        .left_join("teams as t", "users.team_id", "=", "t.id")
        .cross_join("flags");
    assert_eq!(
        grammar().compile_select(&q),
        "select * from \"users\" inner join \"posts\" on \"users\".\"id\" = \"posts\".\"user_id\" \
         left join \"teams\" as \"t\" on \"users\".\"team_id\" = \"t\".\"id\" cross join \"flags\""
    );
}

#[test]
fn lateral_join_renders_on_true() {
    let latest = table("posts")
        .where_column("posts.user_id", "=", "users.id")
        .where_eq("posts.published", true)
        .limit(1);
    let q = table("users").join_lateral(latest, "latest").where_eq("users.active", true);
    assert_eq!(
        grammar().compile_select(&q),
        "select * from \"users\" inner join lateral (select * from \"posts\" \
         where \"posts\".\"user_id\" = \"users\".\"id\" and \"posts\".\"published\" = ? limit 1) \
         as \"latest\" on true where \"users\".\"active\" = ?"
    );
    assert_eq!(q.select_bindings().len(), 2);
}

#[test]
fn cross_and_left_lateral_joins() {
    let q = table("users")
        .left_join_lateral("select 1 as one", "l")
        .cross_join_lateral("select 2 as two", "c");
    assert_eq!(
        grammar().compile_select(&q),
        "select * from \"users\" left join lateral (select 1 as one) as \"l\" on true \
         cross join lateral (select 2 as two) as \"c\""
    );
}

#[test]
fn table_prefix() {
    let g = QueryGrammar::with_table_prefix("app_");
    let q = table("users as u").join("posts", "u.id", "=", "posts.user_id").select(&["posts.id"]);
    assert_eq!(
        g.compile_select(&q),
        "select \"app_posts\".\"id\" from \"app_users\" as \"app_u\" inner join \"app_posts\" \
         on \"app_u\".\"id\" = \"app_posts\".\"user_id\""
    );
}

// ==================== INSERT ====================

#[test]
fn insert_returning_all() {
    let q = table("example");
    let batch = Batch::from(Record::new().set("str", "U71Voupu"));
    let compiled = q.compile_insert_returning(&grammar(), &batch, RETURNING_ALL).unwrap();
    assert_eq!(compiled.sql, "insert into \"example\" (\"str\") values (?) returning *");
    assert_eq!(compiled.bindings.describe(), ["\"U71Voupu\""]);
}

#[test]
fn insert_returning_columns() {
    let q = table("example");
    let batch = Batch::from(Record::new().set("str", "a").set_raw("created_at", "now()"));
    let compiled = q.compile_insert_returning(&grammar(), &batch, &["id", "str"]).unwrap();
    assert_eq!(
        compiled.sql,
        "insert into \"example\" (\"str\", \"created_at\") values (?, now()) returning \"id\", \"str\""
    );
    assert_eq!(compiled.bindings.len(), 1);
}

#[test]
fn empty_returning_list_returns_everything() {
    let q = table("example");
    let batch = Batch::from(Record::new().set("str", "a"));
    let compiled = q.compile_insert_returning(&grammar(), &batch, &[]).unwrap();
    assert!(compiled.sql.ends_with("returning *"));
}

#[test]
fn multi_row_insert_sorts_columns() {
    let rows = vec![
        Record::new().set("str", "a").set("id", 1i64),
        Record::new().set("id", 2i64).set("str", "b"),
    ];
    let compiled = table("example")
        .compile_insert_returning(&grammar(), &Batch::from(rows), RETURNING_ALL)
        .unwrap();
    assert_eq!(
        compiled.sql,
        "insert into \"example\" (\"id\", \"str\") values (?, ?), (?, ?) returning *"
    );
    assert_eq!(compiled.bindings.describe(), ["1", "\"a\"", "2", "\"b\""]);
}

#[test]
fn empty_insert_compiles_nothing() {
    let q = table("example");
    assert!(q.compile_insert_returning(&grammar(), &Batch::default(), RETURNING_ALL).is_none());
    assert!(q.compile_insert_or_ignore_returning(&grammar(), &Batch::from(Record::new()), RETURNING_ALL).is_none());
    assert!(q
        .compile_upsert_returning(&grammar(), &Batch::default(), &["str"], None, RETURNING_ALL)
        .is_none());
}

#[test]
fn insert_or_ignore_returning() {
    let batch = Batch::from(Record::new().set("str", "a"));
    let compiled = table("example")
        .compile_insert_or_ignore_returning(&grammar(), &batch, &["str"])
        .unwrap();
    assert_eq!(
        compiled.sql,
        "insert into \"example\" (\"str\") values (?) on conflict do nothing returning \"str\""
    );
}

#[test]
fn insert_using_returning() {
    let compiled = table("example").compile_insert_using_returning(
        &grammar(),
        &["str"],
        &SubQuery::from("select 'AbsQM4kp'"),
        RETURNING_ALL,
    );
    assert_eq!(
        compiled.sql,
        "insert into \"example\" (\"str\") select 'AbsQM4kp' returning *"
    );
    assert!(compiled.bindings.is_empty());
}

#[test]
fn insert_using_builder_sends_only_subquery_bindings() {
    let source = table("archive").select(&["str"]).where_eq("id", 7i64);
    let compiled = table("example")
        .where_eq("ignored", 1i32)
        .compile_insert_using_returning(&grammar(), &["str"], &source.into(), &["id"]);
    assert_eq!(
        compiled.sql,
        "insert into \"example\" (\"str\") select \"str\" from \"archive\" where \"id\" = ? returning \"id\""
    );
    assert_eq!(compiled.bindings.describe(), ["7"]);
}

// ==================== UPDATE ====================

#[test]
fn update_returning_without_conditions() {
    let compiled = table("example").compile_update_returning(
        &grammar(),
        &Record::new().set("str", "x"),
        RETURNING_ALL,
    );
    assert_eq!(compiled.sql, "update \"example\" set \"str\" = ? returning *");
}

#[test]
fn update_columns_drop_table_and_schema_qualifiers() {
    let values = Record::new()
        .set("example.str", "x")
        .set("public.example.num", 2i32);
    let compiled = table("example").compile_update_returning(&grammar(), &values, &["id"]);
    assert_eq!(
        compiled.sql,
        "update \"example\" set \"str\" = ?, \"num\" = ? returning \"id\""
    );
}

#[test]
fn update_returning_with_limit_uses_ctid() {
    let q = table("example")
        .where_record(&Record::new().set("id", 1i64))
        .limit(1);
    let compiled = q.compile_update_returning(&grammar(), &Record::new().set("str", "x"), RETURNING_ALL);
    assert_eq!(
        compiled.sql,
        "update \"example\" set \"str\" = ? where \"ctid\" in (select \"example\".\"ctid\" \
         from \"example\" where (\"id\" = ?) limit 1) returning *"
    );
    assert_eq!(compiled.bindings.describe(), ["\"x\"", "1"]);
}

#[test]
fn update_with_join_binds_values_then_joins_then_wheres() {
    let latest = table("posts").where_eq("posts.flag", 9i32);
    let q = table("users")
        .join_lateral(latest, "p")
        .where_eq("users.id", 3i64);
    let compiled = q.compile_update_returning(&grammar(), &Record::new().set("users.name", "n"), &["id"]);
    assert_eq!(
        compiled.sql,
        "update \"users\" set \"name\" = ? where \"ctid\" in (select \"users\".\"ctid\" from \"users\" \
         inner join lateral (select * from \"posts\" where \"posts\".\"flag\" = ?) as \"p\" on true \
         where \"users\".\"id\" = ?) returning \"id\""
    );
    assert_eq!(compiled.bindings.describe(), ["\"n\"", "9", "3"]);
}

#[test]
fn update_from_returning() {
    let q = table("example")
        .join("example as example2", "example.id", "=", "example2.id")
        .where_eq("example2.str", "old");
    let compiled = q.compile_update_from_returning(&grammar(), &Record::new().set("str", "new"), RETURNING_ALL);
    assert_eq!(
        compiled.sql,
        "update \"example\" set \"str\" = ? from \"example\" as \"example2\" \
         where \"example2\".\"str\" = ? and \"example\".\"id\" = \"example2\".\"id\" returning *"
    );
}

#[test]
fn update_from_binds_lateral_subquery_before_wheres() {
    let sub = table("posts").where_eq("posts.flag", 9i32);
    let q = table("users").join_lateral(sub, "p").where_eq("users.id", 3i64);
    let compiled = q.compile_update_from_returning(&grammar(), &Record::new().set("name", "n"), RETURNING_ALL);
    assert_eq!(
        compiled.sql,
        "update \"users\" set \"name\" = ? from lateral (select * from \"posts\" where \"posts\".\"flag\" = ?) \
         as \"p\" where \"users\".\"id\" = ? and true returning *"
    );
    assert_eq!(compiled.bindings.describe(), ["\"n\"", "9", "3"]);
}

#[test]
fn update_from_binds_every_lateral_in_from_order() {
    let q = table("users")
        .join_lateral(table("posts").where_eq("posts.flag", 1i32), "p")
        .join("teams", "teams.id", "=", "users.team_id")
        .cross_join_lateral(table("tags").where_eq("tags.kind", 2i32), "t")
        .where_eq("users.id", 3i64);
    let compiled = q.compile_update_from_returning(&grammar(), &Record::new().set("name", "n"), &["id"]);
    assert_eq!(
        compiled.sql,
        "update \"users\" set \"name\" = ? from lateral (select * from \"posts\" where \"posts\".\"flag\" = ?) \
         as \"p\", \"teams\", lateral (select * from \"tags\" where \"tags\".\"kind\" = ?) as \"t\" \
         where \"users\".\"id\" = ? and true and \"teams\".\"id\" = \"users\".\"team_id\" returning \"id\""
    );
    assert_eq!(compiled.bindings.describe(), ["\"n\"", "1", "2", "3"]);
}

#[test]
fn update_from_without_wheres_uses_join_conditions() {
    let q = table("a").join("b", "a.id", "=", "b.a_id");
    let compiled = q.compile_update_from_returning(&grammar(), &Record::new().set("x", 1i32), &["x"]);
    assert_eq!(
        compiled.sql,
        "update \"a\" set \"x\" = ? from \"b\" where \"a\".\"id\" = \"b\".\"a_id\" returning \"x\""
    );
}

// ==================== UPSERT ====================

#[test]
fn upsert_returning_excluded_columns() {
    let rows = vec![Record::new().set("str", "a"), Record::new().set("str", "b")];
    let update = [UpsertColumn::excluded("str")];
    let compiled = table("example")
        .compile_upsert_returning(&grammar(), &Batch::from(rows), &["str"], Some(&update), RETURNING_ALL)
        .unwrap();
    assert_eq!(
        compiled.sql,
        "insert into \"example\" (\"str\") values (?), (?) on conflict (\"str\") \
         do update set \"str\" = \"excluded\".\"str\" returning *"
    );
    assert_eq!(compiled.bindings.len(), 2);
}

#[test]
fn upsert_named_values_bind_after_rows() {
    let batch = Batch::from(Record::new().set("email", "a@b.c").set("visits", 1i32));
    let update = [
        UpsertColumn::set("name", "updated"),
        UpsertColumn::raw("visits", "\"example\".\"visits\" + 1"),
    ];
    let compiled = table("example")
        .compile_upsert_returning(&grammar(), &batch, &["email"], Some(&update), &["id"])
        .unwrap();
    assert_eq!(
        compiled.sql,
        "insert into \"example\" (\"email\", \"visits\") values (?, ?) on conflict (\"email\") \
         do update set \"name\" = ?, \"visits\" = \"example\".\"visits\" + 1 returning \"id\""
    );
    assert_eq!(compiled.bindings.describe(), ["\"a@b.c\"", "1", "\"updated\""]);
}

#[test]
fn upsert_without_update_list_updates_every_column() {
    let batch = Batch::from(Record::new().set("email", "a").set("name", "b"));
    let compiled = table("users")
        .compile_upsert_returning(&grammar(), &batch, &["email"], None, RETURNING_ALL)
        .unwrap();
    assert_eq!(
        compiled.sql,
        "insert into \"users\" (\"email\", \"name\") values (?, ?) on conflict (\"email\") \
         do update set \"email\" = \"excluded\".\"email\", \"name\" = \"excluded\".\"name\" returning *"
    );
}

#[test]
fn upsert_with_empty_update_list_is_a_plain_insert() {
    let batch = Batch::from(Record::new().set("str", "a"));
    let compiled = table("example")
        .compile_upsert_returning(&grammar(), &batch, &["str"], Some(&[]), RETURNING_ALL)
        .unwrap();
    assert_eq!(compiled.sql, "insert into \"example\" (\"str\") values (?) returning *");
}

// ==================== Execution ====================

#[tokio::test]
async fn insert_returning_runs_statement() {
    let conn = logged_conn();
    let rows = table("example")
        .insert_returning(&conn, Record::new().set("str", "U71Voupu"), RETURNING_ALL)
        .await
        .unwrap();
    assert!(rows.is_empty());

    let log = conn.query_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].sql, "insert into \"example\" (\"str\") values (?) returning *");
    assert_eq!(log[0].bindings, ["\"U71Voupu\""]);
}

#[tokio::test]
async fn empty_insert_sends_nothing() {
    let conn = logged_conn();
    let rows = table("example")
        .insert_or_ignore_returning(&conn, Vec::<Record>::new(), RETURNING_ALL)
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert!(conn.query_log().is_empty());
}

#[tokio::test]
async fn update_or_insert_inserts_when_missing() {
    let conn = logged_conn();
    table("example")
        .update_or_insert_returning(
            &conn,
            Record::new().set("str", "a"),
            Record::new().set("num", 2i32),
            RETURNING_ALL,
        )
        .await
        .unwrap();

    assert_eq!(
        statements(&conn),
        [
            "select exists(select * from \"example\" where (\"str\" = ?)) as \"exists\"",
            "insert into \"example\" (\"str\", \"num\") values (?, ?) returning *",
        ]
    );
}

#[tokio::test]
async fn pretend_mode_takes_the_insert_path() {
    let conn = Connection::with_config(DummyClient, ConnectionConfig::new().pretend().log_queries());
    let rows = table("example")
        .update_or_insert_returning(&conn, Record::new().set("str", "a"), Record::new(), &["id"])
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(statements(&conn).len(), 2);
    assert!(statements(&conn)[1].starts_with("insert into \"example\""));
}

#[tokio::test]
async fn upsert_and_update_from_run_through_connection() {
    let conn = logged_conn();
    table("example")
        .upsert_returning(
            &conn,
            vec![Record::new().set("str", "a")],
            &["str"],
            Some(vec![UpsertColumn::excluded("str")]),
            RETURNING_ALL,
        )
        .await
        .unwrap();
    table("example")
        .join("example as example2", "example.id", "=", "example2.id")
        .where_eq("example2.str", "a")
        .update_from_returning(&conn, Record::new().set("str", "b"), RETURNING_ALL)
        .await
        .unwrap();

    let log = statements(&conn);
    assert!(log[0].contains("on conflict (\"str\") do update set"));
    assert!(log[1].starts_with("update \"example\" set \"str\" = ? from \"example\" as \"example2\""));
}

#[tokio::test]
async fn before_query_callbacks_run_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let conn = logged_conn();

    table("example")
        .before_query(move |q| {
            counter.fetch_add(1, Ordering::SeqCst);
            let scoped = std::mem::replace(q, Builder::new("")).where_eq("tenant_id", 7i64);
            *q = scoped;
        })
        .update_or_insert_returning(
            &conn,
            Record::new().set("str", "a"),
            Record::new().set("num", 1i32),
            RETURNING_ALL,
        )
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        statements(&conn)[0],
        "select exists(select * from \"example\" where (\"str\" = ?) and \"tenant_id\" = ?) as \"exists\""
    );
}

#[tokio::test]
async fn insert_using_returning_runs_through_connection() {
    let conn = logged_conn();
    table("example")
        .insert_using_returning(&conn, &["str"], "select 'AbsQM4kp'", RETURNING_ALL)
        .await
        .unwrap();
    assert_eq!(
        statements(&conn),
        ["insert into \"example\" (\"str\") select 'AbsQM4kp' returning *"]
    );
}
