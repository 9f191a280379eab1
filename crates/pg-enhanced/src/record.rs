//! Row mappings used for inserts, updates and upserts.
//!
//! A [`Record`] keeps columns in insertion order. A [`Batch`] is the normalised form every
//! insert goes through: a single record stays as given, while each row of a multi-row batch
//! gets its keys sorted so the column list and every value tuple line up positionally.

use crate::param::{Bindings, Value};
use tokio_postgres::types::ToSql;

/// An ordered column -> value mapping.
#[derive(Clone, Debug, Default)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a bound column value, replacing an existing entry in place.
    pub fn set<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.set_value(column, Value::bind(value))
    }

    /// Set a raw SQL expression for a column.
    pub fn set_raw(self, column: &str, expr: &str) -> Self {
        self.set_value(column, Value::raw(expr))
    }

    /// Set a prepared [`Value`].
    pub fn set_value(mut self, column: &str, value: Value) -> Self {
        self.insert(column, value);
        self
    }

    fn insert(&mut self, column: &str, value: Value) {
        match self.entries.iter_mut().find(|(c, _)| c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column.to_string(), value)),
        }
    }

    /// Merge `other` into this record: existing keys are overwritten in place, new keys
    /// are appended in `other`'s order.
    pub fn merge(mut self, other: Record) -> Self {
        for (column, value) in other.entries {
            self.insert(&column, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Sort the keys into canonical (byte-wise) order.
    pub fn sorted(mut self) -> Self {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }
}

/// A normalised sequence of rows for a single batched statement.
///
/// Uniformity of key sets across rows is not checked here; the column list is taken from
/// the first row and a mismatch surfaces as a database error.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    rows: Vec<Record>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn first(&self) -> Option<&Record> {
        self.rows.first()
    }

    /// Flatten row-major into a binding list, dropping inlined expressions.
    pub fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();
        for row in &self.rows {
            bindings.extend_values(row.values());
        }
        bindings
    }
}

impl From<Record> for Batch {
    /// A single mapping is a one-row batch and keeps the caller's column order.
    fn from(record: Record) -> Self {
        if record.is_empty() {
            return Batch::default();
        }
        Batch { rows: vec![record] }
    }
}

impl From<Vec<Record>> for Batch {
    fn from(rows: Vec<Record>) -> Self {
        Batch {
            rows: rows.into_iter().map(Record::sorted).collect(),
        }
    }
}
