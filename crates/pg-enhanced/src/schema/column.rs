use super::types::ColumnType;

/// Default (or initial) value of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// Rendered as a quoted string literal.
    Literal(String),
    /// Rendered as `'1'` / `'0'`.
    Boolean(bool),
    /// Raw SQL expression, e.g. `now()`.
    Expression(String),
}

impl DefaultValue {
    /// Any displayable value as a quoted literal.
    pub fn literal(value: impl ToString) -> Self {
        DefaultValue::Literal(value.to_string())
    }

    pub fn raw(expr: impl Into<String>) -> Self {
        DefaultValue::Expression(expr.into())
    }

    pub fn to_sql(&self) -> String {
        match self {
            DefaultValue::Literal(s) => format!("'{}'", s.replace('\'', "''")),
            DefaultValue::Boolean(b) => format!("'{}'", u8::from(*b)),
            DefaultValue::Expression(expr) => expr.clone(),
        }
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::Literal(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::Literal(value)
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        DefaultValue::Boolean(value)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        DefaultValue::literal(value)
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        DefaultValue::literal(value)
    }
}

/// A column to add or change.
///
/// Columns are `not null` unless marked [`nullable`](Self::nullable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    /// Value existing rows receive when the column is added; `default` applies afterwards.
    pub initial: Option<DefaultValue>,
    pub collation: Option<String>,
    /// Compression method (`pglz`, `lz4`).
    pub compression: Option<String>,
    /// Conversion expression used when changing the column type.
    pub using: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            default: None,
            initial: None,
            collation: None,
            compression: None,
            using: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the default to a raw SQL expression.
    pub fn default_raw(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::raw(expr));
        self
    }

    /// Fill existing rows with `value` when the column is added.
    pub fn initial(mut self, value: impl Into<DefaultValue>) -> Self {
        self.initial = Some(value.into());
        self
    }

    pub fn initial_raw(mut self, expr: impl Into<String>) -> Self {
        self.initial = Some(DefaultValue::raw(expr));
        self
    }

    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn compression(mut self, method: impl Into<String>) -> Self {
        self.compression = Some(method.into());
        self
    }

    /// Convert existing values with `expr` when the type changes (`using <expr>`).
    pub fn using(mut self, expr: impl Into<String>) -> Self {
        self.using = Some(expr.into());
        self
    }
}
