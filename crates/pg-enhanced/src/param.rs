//! Bound parameters, raw expressions and flat binding lists.

use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly parameter wrapper using Arc.
///
/// Builders are cloned when a query is reused as a subquery, so values are shared
/// instead of copied.
#[derive(Clone)]
pub struct Param(Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Borrow the value as a tokio-postgres parameter.
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// A raw SQL fragment rendered verbatim in place of a placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression(String);

impl Expression {
    pub fn new(sql: impl Into<String>) -> Self {
        Expression(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A column value: either bound as `?` or inlined as an expression.
#[derive(Clone, Debug)]
pub enum Value {
    Param(Param),
    Expression(Expression),
}

impl Value {
    /// Bind a value as a positional parameter.
    pub fn bind<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Value::Param(Param::new(value))
    }

    /// Inline a raw SQL expression (never bound).
    pub fn raw(sql: impl Into<String>) -> Self {
        Value::Expression(Expression::new(sql))
    }

    /// Bind a serializable value as `json`/`jsonb`.
    pub fn json<T: serde::Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Value::bind(serde_json::to_value(value)?))
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Value::Expression(_))
    }
}

impl From<Param> for Value {
    fn from(param: Param) -> Self {
        Value::Param(param)
    }
}

impl From<Expression> for Value {
    fn from(expr: Expression) -> Self {
        Value::Expression(expr)
    }
}

/// A flat list of parameters matching the `?` placeholders of a statement, left to right.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    params: Vec<Param>,
}

impl Bindings {
    /// Create a new empty binding list.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based index.
    pub fn push_param(&mut self, param: Param) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Add a value, dropping it when it is an inlined expression.
    pub fn push_value(&mut self, value: &Value) {
        if let Value::Param(param) = value {
            self.params.push(param.clone());
        }
    }

    /// Add every bindable value, skipping expressions.
    pub fn extend_values<'a>(&mut self, values: impl IntoIterator<Item = &'a Value>) {
        for value in values {
            self.push_value(value);
        }
    }

    /// Extend this list with another list's parameters.
    pub fn extend(&mut self, other: &Bindings) {
        self.params.extend(other.params.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get all parameters as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(Param::as_sql).collect()
    }

    /// Debug rendering of each parameter, used by the query log.
    pub fn describe(&self) -> Vec<String> {
        self.params.iter().map(|p| format!("{p:?}")).collect()
    }
}

impl FromIterator<Param> for Bindings {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}
