//! Query builder state, grammar and the `RETURNING` operations.
//!
//! A [`Builder`] only describes a query: target table, joins, conditions and limit. The
//! [`QueryGrammar`] renders it to SQL with positional `?` placeholders, and the builder
//! computes the matching binding list. Execution goes through a
//! [`Connection`](crate::Connection).
//!
//! # Example
//!
//! ```ignore
//! use pg_enhanced::{query, Record, RETURNING_ALL};
//!
//! let rows = query::table("example")
//!     .insert_returning(&conn, Record::new().set("str", "U71Voupu"), RETURNING_ALL)
//!     .await?;
//! // insert into "example" ("str") values (?) returning *
//! ```

mod clause;
mod grammar;
mod returning;

pub use clause::{
    BetweenValues, Boolean, JoinClause, JoinKind, JoinTarget, SubQuery, UpsertColumn, Where,
    WhereClause,
};
pub use grammar::{CompiledQuery, QueryGrammar};
pub use returning::RETURNING_ALL;

use crate::param::{Bindings, Param, Value};
use crate::record::Record;
use clause::collect_where_bindings;
use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Callback run against the builder right before a statement is compiled.
pub type BeforeQueryCallback = Arc<dyn Fn(&mut Builder) + Send + Sync>;

/// Create a query builder for the given table (`"name"` or `"name as alias"`).
pub fn table(name: &str) -> Builder {
    Builder::new(name)
}

/// Query builder state.
#[derive(Clone)]
pub struct Builder {
    pub(crate) from: String,
    pub(crate) columns: Vec<String>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) wheres: Vec<WhereClause>,
    pub(crate) limit: Option<u64>,
    callbacks: Vec<BeforeQueryCallback>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("from", &self.from)
            .field("columns", &self.columns)
            .field("joins", &self.joins)
            .field("wheres", &self.wheres)
            .field("limit", &self.limit)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl Builder {
    pub fn new(from: &str) -> Self {
        Self {
            from: from.to_string(),
            columns: vec!["*".to_string()],
            joins: Vec::new(),
            wheres: Vec::new(),
            limit: None,
            callbacks: Vec::new(),
        }
    }

    pub fn from_table(&self) -> &str {
        &self.from
    }

    /// Replace the selected columns.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    // ==================== Before-query callbacks ====================

    /// Register a callback that may adjust the builder before a statement is compiled.
    ///
    /// Callbacks run once: the first executing operation applies and clears them.
    pub fn before_query<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Builder) + Send + Sync + 'static,
    {
        self.callbacks.push(Arc::new(callback));
        self
    }

    pub(crate) fn apply_before_query_callbacks(&mut self) {
        let callbacks = std::mem::take(&mut self.callbacks);
        for callback in &callbacks {
            callback(self);
        }
    }

    // ==================== WHERE conditions ====================

    fn push_where(mut self, boolean: Boolean, condition: Where) -> Self {
        self.wheres.push(WhereClause { boolean, condition });
        self
    }

    /// Add WHERE: column = value
    pub fn where_eq<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.where_op(column, "=", value)
    }

    /// Add WHERE: column <op> value
    pub fn where_op<T: ToSql + Send + Sync + 'static>(self, column: &str, operator: &str, value: T) -> Self {
        self.where_value(Boolean::And, column, operator, Value::bind(value))
    }

    /// Add OR WHERE: column <op> value
    pub fn or_where_op<T: ToSql + Send + Sync + 'static>(self, column: &str, operator: &str, value: T) -> Self {
        self.where_value(Boolean::Or, column, operator, Value::bind(value))
    }

    /// Add a comparison against a prepared [`Value`].
    pub fn where_value(self, boolean: Boolean, column: &str, operator: &str, value: Value) -> Self {
        self.push_where(
            boolean,
            Where::Basic {
                column: column.to_string(),
                operator: operator.to_string(),
                value,
            },
        )
    }

    /// Add a parenthesised group of `column = value` conditions, one per record entry.
    pub fn where_record(self, record: &Record) -> Self {
        let clauses = record
            .iter()
            .map(|(column, value)| WhereClause {
                boolean: Boolean::And,
                condition: Where::Basic {
                    column: column.to_string(),
                    operator: "=".to_string(),
                    value: value.clone(),
                },
            })
            .collect();
        self.push_nested(clauses)
    }

    /// Add a parenthesised group built by `f`.
    pub fn where_nested(self, f: impl FnOnce(Builder) -> Builder) -> Self {
        let inner = f(Builder::new(&self.from));
        self.push_nested(inner.wheres)
    }

    /// Empty groups are dropped.
    fn push_nested(self, clauses: Vec<WhereClause>) -> Self {
        if clauses.is_empty() {
            return self;
        }
        self.push_where(Boolean::And, Where::Nested(clauses))
    }

    /// Add WHERE: first <op> second (two columns)
    pub fn where_column(self, first: &str, operator: &str, second: &str) -> Self {
        self.push_where(
            Boolean::And,
            Where::Column {
                first: Some(first.to_string()),
                operator: operator.to_string(),
                second: Some(second.to_string()),
            },
        )
    }

    /// Add OR WHERE: first <op> second (two columns)
    pub fn or_where_column(self, first: &str, operator: &str, second: &str) -> Self {
        self.push_where(
            Boolean::Or,
            Where::Column {
                first: Some(first.to_string()),
                operator: operator.to_string(),
                second: Some(second.to_string()),
            },
        )
    }

    /// Add WHERE: column IS NULL
    pub fn where_null(self, column: &str) -> Self {
        self.push_where(
            Boolean::And,
            Where::Null {
                column: column.to_string(),
                negated: false,
            },
        )
    }

    /// Add WHERE: column IS NOT NULL
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_where(
            Boolean::And,
            Where::Null {
                column: column.to_string(),
                negated: true,
            },
        )
    }

    /// Add WHERE: column IN (values...)
    pub fn where_in<T: ToSql + Send + Sync + 'static>(self, column: &str, values: Vec<T>) -> Self {
        self.push_where(
            Boolean::And,
            Where::In {
                column: column.to_string(),
                values: values.into_iter().map(Value::bind).collect(),
                negated: false,
            },
        )
    }

    /// Add WHERE: column NOT IN (values...)
    pub fn where_not_in<T: ToSql + Send + Sync + 'static>(self, column: &str, values: Vec<T>) -> Self {
        self.push_where(
            Boolean::And,
            Where::In {
                column: column.to_string(),
                values: values.into_iter().map(Value::bind).collect(),
                negated: true,
            },
        )
    }

    /// Add a raw condition with `?` placeholders.
    pub fn where_raw(self, sql: &str, bindings: Vec<Param>) -> Self {
        self.push_where(
            Boolean::And,
            Where::Raw {
                sql: sql.to_string(),
                bindings,
            },
        )
    }

    /// Add WHERE: column LIKE value, or ILIKE when `case_insensitive` is set.
    pub fn where_like<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T, case_insensitive: bool) -> Self {
        self.push_like(Boolean::And, column, value, case_insensitive)
    }

    /// Add OR WHERE: column LIKE value, or ILIKE when `case_insensitive` is set.
    pub fn or_where_like<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T, case_insensitive: bool) -> Self {
        self.push_like(Boolean::Or, column, value, case_insensitive)
    }

    fn push_like<T: ToSql + Send + Sync + 'static>(
        self,
        boolean: Boolean,
        column: &str,
        value: T,
        case_insensitive: bool,
    ) -> Self {
        self.push_where(
            boolean,
            Where::Like {
                column: column.to_string(),
                value: Value::bind(value),
                case_insensitive,
            },
        )
    }

    /// Add WHERE: column BETWEEN SYMMETRIC min AND max
    pub fn where_between_symmetric(self, column: &str, values: impl Into<BetweenValues>) -> Self {
        self.push_between_symmetric(Boolean::And, column, values.into(), false)
    }

    /// Add WHERE: column NOT BETWEEN SYMMETRIC min AND max
    pub fn where_not_between_symmetric(self, column: &str, values: impl Into<BetweenValues>) -> Self {
        self.push_between_symmetric(Boolean::And, column, values.into(), true)
    }

    /// Add OR WHERE: column BETWEEN SYMMETRIC min AND max
    pub fn or_where_between_symmetric(self, column: &str, values: impl Into<BetweenValues>) -> Self {
        self.push_between_symmetric(Boolean::Or, column, values.into(), false)
    }

    /// Add OR WHERE: column NOT BETWEEN SYMMETRIC min AND max
    pub fn or_where_not_between_symmetric(self, column: &str, values: impl Into<BetweenValues>) -> Self {
        self.push_between_symmetric(Boolean::Or, column, values.into(), true)
    }

    fn push_between_symmetric(self, boolean: Boolean, column: &str, values: BetweenValues, negated: bool) -> Self {
        self.push_where(
            boolean,
            Where::BetweenSymmetric {
                column: column.to_string(),
                values,
                negated,
            },
        )
    }

    // ==================== JOIN ====================

    fn push_join(mut self, kind: JoinKind, target: JoinTarget, wheres: Vec<WhereClause>) -> Self {
        self.joins.push(JoinClause { kind, target, wheres });
        self
    }

    fn column_condition(first: &str, operator: &str, second: &str) -> Vec<WhereClause> {
        vec![WhereClause {
            boolean: Boolean::And,
            condition: Where::Column {
                first: Some(first.to_string()),
                operator: operator.to_string(),
                second: Some(second.to_string()),
            },
        }]
    }

    fn true_condition() -> Vec<WhereClause> {
        vec![WhereClause {
            boolean: Boolean::And,
            condition: Where::always_true(),
        }]
    }

    /// Add INNER JOIN table ON first <op> second
    pub fn join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        let on = Self::column_condition(first, operator, second);
        self.push_join(JoinKind::Inner, JoinTarget::Table(table.to_string()), on)
    }

    /// Add LEFT JOIN table ON first <op> second
    pub fn left_join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        let on = Self::column_condition(first, operator, second);
        self.push_join(JoinKind::Left, JoinTarget::Table(table.to_string()), on)
    }

    /// Add RIGHT JOIN table ON first <op> second
    pub fn right_join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        let on = Self::column_condition(first, operator, second);
        self.push_join(JoinKind::Right, JoinTarget::Table(table.to_string()), on)
    }

    /// Add CROSS JOIN table
    pub fn cross_join(self, table: &str) -> Self {
        self.push_join(JoinKind::Cross, JoinTarget::Table(table.to_string()), Vec::new())
    }

    /// Add INNER JOIN LATERAL (subquery) AS alias ON true
    pub fn join_lateral(self, query: impl Into<SubQuery>, alias: &str) -> Self {
        let target = JoinTarget::Lateral {
            query: query.into(),
            alias: alias.to_string(),
        };
        self.push_join(JoinKind::Inner, target, Self::true_condition())
    }

    /// Add LEFT JOIN LATERAL (subquery) AS alias ON true
    pub fn left_join_lateral(self, query: impl Into<SubQuery>, alias: &str) -> Self {
        let target = JoinTarget::Lateral {
            query: query.into(),
            alias: alias.to_string(),
        };
        self.push_join(JoinKind::Left, target, Self::true_condition())
    }

    /// Add CROSS JOIN LATERAL (subquery) AS alias
    pub fn cross_join_lateral(self, query: impl Into<SubQuery>, alias: &str) -> Self {
        let target = JoinTarget::Lateral {
            query: query.into(),
            alias: alias.to_string(),
        };
        self.push_join(JoinKind::Cross, target, Vec::new())
    }

    // ==================== Bindings ====================

    pub(crate) fn join_bindings(&self) -> Bindings {
        let mut out = Bindings::new();
        for join in &self.joins {
            join.collect_bindings(&mut out);
        }
        out
    }

    pub(crate) fn where_bindings(&self) -> Bindings {
        let mut out = Bindings::new();
        collect_where_bindings(&self.wheres, &mut out);
        out
    }

    /// Bindings of the compiled SELECT: joins first, then conditions.
    pub fn select_bindings(&self) -> Bindings {
        let mut out = self.join_bindings();
        out.extend(&self.where_bindings());
        out
    }

    /// Update values, then join bindings, then where bindings.
    pub(crate) fn bindings_for_update(&self, values: &Record) -> Bindings {
        let mut out = Bindings::new();
        out.extend_values(values.values());
        out.extend(&self.join_bindings());
        out.extend(&self.where_bindings());
        out
    }

    /// Update values, then lateral subqueries in the `from` list, then where bindings,
    /// then join conditions appended to the where clause.
    pub(crate) fn bindings_for_update_from(&self, values: &Record) -> Bindings {
        let mut out = Bindings::new();
        out.extend_values(values.values());
        for join in &self.joins {
            join.collect_target_bindings(&mut out);
        }
        out.extend(&self.where_bindings());
        for join in &self.joins {
            collect_where_bindings(&join.wheres, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests;
