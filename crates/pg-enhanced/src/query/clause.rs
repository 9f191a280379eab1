//! WHERE, JOIN and upsert clause descriptors.

use crate::param::{Bindings, Param, Value};
use crate::query::Builder;
use std::ops::Index;
use tokio_postgres::types::ToSql;

/// How a clause is chained to the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

impl Boolean {
    pub fn as_str(self) -> &'static str {
        match self {
            Boolean::And => "and",
            Boolean::Or => "or",
        }
    }
}

/// Lower and upper bound of a `between symmetric` condition.
///
/// The bounds may be given in either order; PostgreSQL swaps them when needed.
#[derive(Clone, Debug)]
pub struct BetweenValues {
    pub min: Value,
    pub max: Value,
}

impl BetweenValues {
    pub fn new(min: Value, max: Value) -> Self {
        Self { min, max }
    }

    /// Use the first and last element of a sequence. Returns `None` for an empty slice.
    pub fn from_slice(values: &[Value]) -> Option<Self> {
        Some(Self {
            min: values.first()?.clone(),
            max: values.last()?.clone(),
        })
    }

    /// Use elements `0` and `1` of an indexable structure.
    ///
    /// # Panics
    /// Panics when the structure has no element at index 0 or 1, like any `Index` access.
    pub fn from_indexed<I: Index<usize, Output = Value> + ?Sized>(values: &I) -> Self {
        Self {
            min: values[0].clone(),
            max: values[1].clone(),
        }
    }
}

impl<A, B> From<(A, B)> for BetweenValues
where
    A: ToSql + Send + Sync + 'static,
    B: ToSql + Send + Sync + 'static,
{
    fn from((min, max): (A, B)) -> Self {
        Self {
            min: Value::bind(min),
            max: Value::bind(max),
        }
    }
}

/// A single condition.
#[derive(Clone, Debug)]
pub enum Where {
    /// `"col" <op> ?`
    Basic {
        column: String,
        operator: String,
        value: Value,
    },
    /// `"a" <op> "b"`; with both sides absent and `=` it renders `true`.
    Column {
        first: Option<String>,
        operator: String,
        second: Option<String>,
    },
    Null {
        column: String,
        negated: bool,
    },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Nested(Vec<WhereClause>),
    Raw {
        sql: String,
        bindings: Vec<Param>,
    },
    /// `"col" like ?` or `"col" ilike ?`
    Like {
        column: String,
        value: Value,
        case_insensitive: bool,
    },
    /// `"col" [not ]between symmetric ? and ?`
    BetweenSymmetric {
        column: String,
        values: BetweenValues,
        negated: bool,
    },
}

impl Where {
    /// The always-true join condition used by lateral joins.
    pub fn always_true() -> Self {
        Where::Column {
            first: None,
            operator: "=".to_string(),
            second: None,
        }
    }

    /// Append this condition's bindings in placeholder order.
    pub(crate) fn collect_bindings(&self, out: &mut Bindings) {
        match self {
            Where::Basic { value, .. } | Where::Like { value, .. } => out.push_value(value),
            Where::In { values, .. } => out.extend_values(values.iter()),
            Where::Nested(clauses) => {
                for clause in clauses {
                    clause.condition.collect_bindings(out);
                }
            }
            Where::Raw { bindings, .. } => {
                for param in bindings {
                    out.push_param(param.clone());
                }
            }
            Where::BetweenSymmetric { values, .. } => {
                out.push_value(&values.min);
                out.push_value(&values.max);
            }
            Where::Column { .. } | Where::Null { .. } => {}
        }
    }
}

/// A condition together with its chaining boolean.
#[derive(Clone, Debug)]
pub struct WhereClause {
    pub boolean: Boolean,
    pub condition: Where,
}

pub(crate) fn collect_where_bindings(clauses: &[WhereClause], out: &mut Bindings) {
    for clause in clauses {
        clause.condition.collect_bindings(out);
    }
}

/// A subquery used by `insert ... select` and lateral joins.
#[derive(Clone, Debug)]
pub enum SubQuery {
    /// Raw SQL without bindings.
    Raw(String),
    Query(Box<Builder>),
}

impl From<&str> for SubQuery {
    fn from(sql: &str) -> Self {
        SubQuery::Raw(sql.to_string())
    }
}

impl From<String> for SubQuery {
    fn from(sql: String) -> Self {
        SubQuery::Raw(sql)
    }
}

impl From<Builder> for SubQuery {
    fn from(query: Builder) -> Self {
        SubQuery::Query(Box::new(query))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::Cross => "cross",
        }
    }
}

/// What a join attaches: a table or a lateral subquery.
#[derive(Clone, Debug)]
pub enum JoinTarget {
    Table(String),
    Lateral { query: SubQuery, alias: String },
}

#[derive(Clone, Debug)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub target: JoinTarget,
    pub wheres: Vec<WhereClause>,
}

impl JoinClause {
    pub(crate) fn collect_bindings(&self, out: &mut Bindings) {
        self.collect_target_bindings(out);
        collect_where_bindings(&self.wheres, out);
    }

    /// Bindings of a lateral subquery; plain tables have none.
    pub(crate) fn collect_target_bindings(&self, out: &mut Bindings) {
        if let JoinTarget::Lateral {
            query: SubQuery::Query(query),
            ..
        } = &self.target
        {
            out.extend(&query.select_bindings());
        }
    }
}

/// One assignment of an upsert's `do update set` list.
#[derive(Clone, Debug)]
pub enum UpsertColumn {
    /// Positional form: `"col" = "excluded"."col"`, no binding.
    Excluded(String),
    /// Named form: `"col" = ?` (or the inlined expression), bound after the insert values.
    Set(String, Value),
}

impl UpsertColumn {
    pub fn excluded(column: &str) -> Self {
        UpsertColumn::Excluded(column.to_string())
    }

    pub fn set<T: ToSql + Send + Sync + 'static>(column: &str, value: T) -> Self {
        UpsertColumn::Set(column.to_string(), Value::bind(value))
    }

    pub fn raw(column: &str, expr: &str) -> Self {
        UpsertColumn::Set(column.to_string(), Value::raw(expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_from_slice_uses_first_and_last() {
        let values = [Value::bind(1i32), Value::bind(5i32), Value::bind(9i32)];
        let between = BetweenValues::from_slice(&values).unwrap();
        let mut out = Bindings::new();
        out.push_value(&between.min);
        out.push_value(&between.max);
        assert_eq!(out.describe(), vec!["1", "9"]);
        assert!(BetweenValues::from_slice(&[]).is_none());
    }

    #[test]
    fn between_from_indexed_uses_positions() {
        let values = vec![Value::bind(3i32), Value::bind(2i32)];
        let between = BetweenValues::from_indexed(&values);
        let mut out = Bindings::new();
        Where::BetweenSymmetric {
            column: "n".into(),
            values: between,
            negated: false,
        }
        .collect_bindings(&mut out);
        assert_eq!(out.describe(), vec!["3", "2"]);
    }
}
