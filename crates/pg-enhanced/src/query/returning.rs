//! Insert, update and upsert operations that append a `RETURNING` clause and hand back the
//! affected rows.
//!
//! Each async operation has a pure `compile_*` twin. The twin returns `None` when the
//! operation short-circuits (e.g. nothing to insert) and no statement must be sent.

use super::{Builder, CompiledQuery, QueryGrammar, SubQuery, UpsertColumn};
use crate::client::GenericClient;
use crate::connection::Connection;
use crate::error::PgResult;
use crate::record::{Batch, Record};
use tokio_postgres::Row;

/// Return every column of the affected rows.
pub const RETURNING_ALL: &[&str] = &["*"];

fn with_returning(grammar: &QueryGrammar, sql: String, returning: &[&str]) -> String {
    format!("{sql} {}", grammar.compile_returning(returning))
}

macro_rules! skipped {
    ($op:literal, $from:expr, $reason:literal) => {{
        #[cfg(feature = "tracing")]
        tracing::debug!(table = %$from, operation = $op, $reason);
        return Ok(Vec::new());
    }};
}

impl Builder {
    // ==================== Compilation ====================

    pub fn compile_insert_returning(
        &self,
        grammar: &QueryGrammar,
        values: &Batch,
        returning: &[&str],
    ) -> Option<CompiledQuery> {
        if values.is_empty() {
            return None;
        }
        let sql = with_returning(grammar, grammar.compile_insert(self, values), returning);
        Some(CompiledQuery::new(sql, values.bindings()))
    }

    pub fn compile_insert_or_ignore_returning(
        &self,
        grammar: &QueryGrammar,
        values: &Batch,
        returning: &[&str],
    ) -> Option<CompiledQuery> {
        if values.is_empty() {
            return None;
        }
        let sql = with_returning(grammar, grammar.compile_insert_or_ignore(self, values), returning);
        Some(CompiledQuery::new(sql, values.bindings()))
    }

    /// Always compiles; only the subquery's bindings are sent.
    pub fn compile_insert_using_returning(
        &self,
        grammar: &QueryGrammar,
        columns: &[&str],
        query: &SubQuery,
        returning: &[&str],
    ) -> CompiledQuery {
        let sub = grammar.compile_sub(query);
        let sql = with_returning(grammar, grammar.compile_insert_using(self, columns, &sub.sql), returning);
        CompiledQuery::new(sql, sub.bindings)
    }

    pub fn compile_update_returning(
        &self,
        grammar: &QueryGrammar,
        values: &Record,
        returning: &[&str],
    ) -> CompiledQuery {
        let sql = with_returning(grammar, grammar.compile_update(self, values), returning);
        CompiledQuery::new(sql, self.bindings_for_update(values))
    }

    pub fn compile_update_from_returning(
        &self,
        grammar: &QueryGrammar,
        values: &Record,
        returning: &[&str],
    ) -> CompiledQuery {
        let sql = with_returning(grammar, grammar.compile_update_from(self, values), returning);
        CompiledQuery::new(sql, self.bindings_for_update_from(values))
    }

    /// `update` of `None` uses every column of the first row in its positional form.
    /// An empty update list compiles a plain insert.
    pub fn compile_upsert_returning(
        &self,
        grammar: &QueryGrammar,
        values: &Batch,
        unique_by: &[&str],
        update: Option<&[UpsertColumn]>,
        returning: &[&str],
    ) -> Option<CompiledQuery> {
        let first = values.first()?;
        let update: Vec<UpsertColumn> = match update {
            Some([]) => return self.compile_insert_returning(grammar, values, returning),
            Some(columns) => columns.to_vec(),
            None => first.columns().map(UpsertColumn::excluded).collect(),
        };

        let mut bindings = values.bindings();
        for column in &update {
            if let UpsertColumn::Set(_, value) = column {
                bindings.push_value(value);
            }
        }

        let sql = with_returning(
            grammar,
            grammar.compile_upsert(self, values, unique_by, &update),
            returning,
        );
        Some(CompiledQuery::new(sql, bindings))
    }

    pub fn compile_exists(&self, grammar: &QueryGrammar) -> CompiledQuery {
        CompiledQuery::new(grammar.compile_exists(self), self.select_bindings())
    }

    // ==================== Execution ====================

    /// Insert one record or a batch and return the inserted rows.
    ///
    /// Empty input sends nothing and returns no rows.
    pub async fn insert_returning<C: GenericClient>(
        mut self,
        conn: &Connection<C>,
        values: impl Into<Batch>,
        returning: &[&str],
    ) -> PgResult<Vec<Row>> {
        let values = values.into();
        self.apply_before_query_callbacks();
        let Some(compiled) = self.compile_insert_returning(conn.query_grammar(), &values, returning) else {
            skipped!("insert_returning", self.from, "no values to insert");
        };
        conn.returning_statement(&compiled.sql, &compiled.bindings).await
    }

    /// Insert with `on conflict do nothing`; conflicting rows are absent from the result.
    pub async fn insert_or_ignore_returning<C: GenericClient>(
        mut self,
        conn: &Connection<C>,
        values: impl Into<Batch>,
        returning: &[&str],
    ) -> PgResult<Vec<Row>> {
        let values = values.into();
        self.apply_before_query_callbacks();
        let Some(compiled) = self.compile_insert_or_ignore_returning(conn.query_grammar(), &values, returning)
        else {
            skipped!("insert_or_ignore_returning", self.from, "no values to insert");
        };
        conn.returning_statement(&compiled.sql, &compiled.bindings).await
    }

    /// `insert into t (columns) <subquery> returning ...`
    pub async fn insert_using_returning<C: GenericClient>(
        mut self,
        conn: &Connection<C>,
        columns: &[&str],
        query: impl Into<SubQuery>,
        returning: &[&str],
    ) -> PgResult<Vec<Row>> {
        self.apply_before_query_callbacks();
        let compiled = self.compile_insert_using_returning(conn.query_grammar(), columns, &query.into(), returning);
        conn.returning_statement(&compiled.sql, &compiled.bindings).await
    }

    pub async fn update_returning<C: GenericClient>(
        mut self,
        conn: &Connection<C>,
        values: Record,
        returning: &[&str],
    ) -> PgResult<Vec<Row>> {
        self.apply_before_query_callbacks();
        let compiled = self.compile_update_returning(conn.query_grammar(), &values, returning);
        conn.returning_statement(&compiled.sql, &compiled.bindings).await
    }

    /// Update using `update ... from <joined tables>`, with join conditions moved into the
    /// `where` clause.
    pub async fn update_from_returning<C: GenericClient>(
        mut self,
        conn: &Connection<C>,
        values: Record,
        returning: &[&str],
    ) -> PgResult<Vec<Row>> {
        self.apply_before_query_callbacks();
        let compiled = self.compile_update_from_returning(conn.query_grammar(), &values, returning);
        conn.returning_statement(&compiled.sql, &compiled.bindings).await
    }

    /// Update the first row matching `attributes`, or insert `attributes` merged with
    /// `values` when none matches.
    ///
    /// A match with empty `values` only runs the existence check.
    pub async fn update_or_insert_returning<C: GenericClient>(
        self,
        conn: &Connection<C>,
        attributes: Record,
        values: Record,
        returning: &[&str],
    ) -> PgResult<Vec<Row>> {
        let mut query = self.where_record(&attributes);
        if !query.exists(conn).await? {
            return query
                .insert_returning(conn, attributes.merge(values), returning)
                .await;
        }
        if values.is_empty() {
            skipped!("update_or_insert_returning", query.from, "row exists and nothing to update");
        }
        query.limit(1).update_returning(conn, values, returning).await
    }

    /// Insert rows, updating the listed columns of rows that conflict on `unique_by`.
    pub async fn upsert_returning<C: GenericClient>(
        mut self,
        conn: &Connection<C>,
        values: impl Into<Batch>,
        unique_by: &[&str],
        update: Option<Vec<UpsertColumn>>,
        returning: &[&str],
    ) -> PgResult<Vec<Row>> {
        let values = values.into();
        self.apply_before_query_callbacks();
        let compiled = self.compile_upsert_returning(
            conn.query_grammar(),
            &values,
            unique_by,
            update.as_deref(),
            returning,
        );
        let Some(compiled) = compiled else {
            skipped!("upsert_returning", self.from, "no values to upsert");
        };
        conn.returning_statement(&compiled.sql, &compiled.bindings).await
    }

    /// Whether any row matches the current conditions.
    pub async fn exists<C: GenericClient>(&mut self, conn: &Connection<C>) -> PgResult<bool> {
        self.apply_before_query_callbacks();
        let compiled = self.compile_exists(conn.query_grammar());
        conn.select_exists(&compiled.sql, &compiled.bindings).await
    }
}
