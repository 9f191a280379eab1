//! PostgreSQL query grammar.
//!
//! Renders [`Builder`] state into lowercase SQL with `?` placeholders. Placeholders are
//! rewritten to `$n` by the connection just before execution.

use super::clause::{JoinClause, JoinTarget, SubQuery, UpsertColumn, Where, WhereClause};
use super::Builder;
use crate::ident::{self, wrap_value};
use crate::param::{Bindings, Value};
use crate::record::{Batch, Record};

/// SQL text plus the bindings for its `?` placeholders, in order.
#[derive(Clone, Debug)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Bindings,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>, bindings: Bindings) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueryGrammar {
    table_prefix: String,
}

impl QueryGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(prefix: &str) -> Self {
        Self {
            table_prefix: prefix.to_string(),
        }
    }

    pub fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    pub fn wrap_table(&self, table: &str) -> String {
        ident::wrap_table(table, &self.table_prefix)
    }

    pub fn wrap(&self, value: &str) -> String {
        ident::wrap_prefixed(value, &self.table_prefix)
    }

    pub fn columnize<S: AsRef<str>>(&self, columns: &[S]) -> String {
        ident::columnize_prefixed(columns, &self.table_prefix)
    }

    /// `?` for bound values, the expression text for raw values.
    pub fn parameter(&self, value: &Value) -> String {
        match value {
            Value::Param(_) => "?".to_string(),
            Value::Expression(expr) => expr.to_string(),
        }
    }

    fn parameterize<'a>(&self, values: impl Iterator<Item = &'a Value>) -> String {
        values.map(|v| self.parameter(v)).collect::<Vec<_>>().join(", ")
    }

    // ==================== SELECT ====================

    pub fn compile_select(&self, query: &Builder) -> String {
        let mut parts = vec![
            format!("select {}", self.columnize(&query.columns)),
            format!("from {}", self.wrap_table(&query.from)),
        ];
        let joins = self.compile_joins(&query.joins);
        if !joins.is_empty() {
            parts.push(joins);
        }
        let wheres = self.compile_wheres(&query.wheres);
        if !wheres.is_empty() {
            parts.push(wheres);
        }
        if let Some(limit) = query.limit {
            parts.push(format!("limit {limit}"));
        }
        parts.join(" ")
    }

    /// `select exists(<select>) as "exists"`
    pub fn compile_exists(&self, query: &Builder) -> String {
        format!(
            "select exists({}) as {}",
            self.compile_select(query),
            wrap_value("exists")
        )
    }

    pub(crate) fn compile_sub(&self, sub: &SubQuery) -> CompiledQuery {
        match sub {
            SubQuery::Raw(sql) => CompiledQuery::new(sql.clone(), Bindings::new()),
            SubQuery::Query(query) => CompiledQuery::new(self.compile_select(query), query.select_bindings()),
        }
    }

    // ==================== WHERE ====================

    /// `where ...`, or an empty string without conditions.
    pub fn compile_wheres(&self, wheres: &[WhereClause]) -> String {
        let body = self.compile_where_list(wheres);
        if body.is_empty() {
            return body;
        }
        format!("where {body}")
    }

    /// Conditions joined by their booleans, leading boolean removed.
    fn compile_where_list(&self, wheres: &[WhereClause]) -> String {
        let mut out = String::new();
        for (i, clause) in wheres.iter().enumerate() {
            if i > 0 {
                out.push(' ');
                out.push_str(clause.boolean.as_str());
                out.push(' ');
            }
            out.push_str(&self.compile_where(&clause.condition));
        }
        out
    }

    pub fn compile_where(&self, condition: &Where) -> String {
        match condition {
            Where::Basic { column, operator, value } => {
                let column = self.wrap(column);
                let value = self.parameter(value);
                if operator.to_ascii_lowercase().contains("like") {
                    format!("{column}::text {operator} {value}")
                } else {
                    format!("{column} {operator} {value}")
                }
            }
            Where::Column { first: None, operator, second: None } if operator == "=" => "true".to_string(),
            Where::Column { first, operator, second } => format!(
                "{} {} {}",
                self.wrap(first.as_deref().unwrap_or_default()),
                operator,
                self.wrap(second.as_deref().unwrap_or_default())
            ),
            Where::Null { column, negated } => {
                let check = if *negated { "is not null" } else { "is null" };
                format!("{} {check}", self.wrap(column))
            }
            Where::In { column, values, negated } => {
                if values.is_empty() {
                    return if *negated { "1 = 1".to_string() } else { "0 = 1".to_string() };
                }
                let op = if *negated { "not in" } else { "in" };
                format!("{} {op} ({})", self.wrap(column), self.parameterize(values.iter()))
            }
            Where::Nested(clauses) => format!("({})", self.compile_where_list(clauses)),
            Where::Raw { sql, .. } => sql.clone(),
            Where::Like { column, value, case_insensitive } => {
                let op = if *case_insensitive { "ilike" } else { "like" };
                format!("{} {op} {}", self.wrap(column), self.parameter(value))
            }
            Where::BetweenSymmetric { column, values, negated } => {
                let op = if *negated { "not between symmetric" } else { "between symmetric" };
                format!(
                    "{} {op} {} and {}",
                    self.wrap(column),
                    self.parameter(&values.min),
                    self.parameter(&values.max)
                )
            }
        }
    }

    // ==================== JOIN ====================

    pub fn compile_joins(&self, joins: &[JoinClause]) -> String {
        joins
            .iter()
            .map(|join| self.compile_join(join))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn compile_join(&self, join: &JoinClause) -> String {
        let mut sql = format!("{} join {}", join.kind.as_str(), self.compile_join_target(&join.target));
        if !join.wheres.is_empty() {
            sql.push_str(" on ");
            sql.push_str(&self.compile_where_list(&join.wheres));
        }
        sql
    }

    fn compile_join_target(&self, target: &JoinTarget) -> String {
        match target {
            JoinTarget::Table(table) => self.wrap_table(table),
            JoinTarget::Lateral { query, alias } => {
                let sub = self.compile_sub(query);
                format!("lateral ({}) as {}", sub.sql, self.wrap_table(alias))
            }
        }
    }

    // ==================== INSERT ====================

    /// `insert into "t" ("a", "b") values (?, ?), (?, ?)`
    ///
    /// The column list comes from the first row. An empty batch renders `default values`.
    pub fn compile_insert(&self, query: &Builder, values: &Batch) -> String {
        let table = self.wrap_table(&query.from);
        let Some(first) = values.first() else {
            return format!("insert into {table} default values");
        };
        let columns: Vec<&str> = first.columns().collect();
        let rows = values
            .rows()
            .iter()
            .map(|row| format!("({})", self.parameterize(row.values())))
            .collect::<Vec<_>>()
            .join(", ");
        format!("insert into {table} ({}) values {rows}", self.columnize(&columns))
    }

    pub fn compile_insert_or_ignore(&self, query: &Builder, values: &Batch) -> String {
        format!("{} on conflict do nothing", self.compile_insert(query, values))
    }

    /// `insert into "t" ("a") <sql>`
    pub fn compile_insert_using<S: AsRef<str>>(&self, query: &Builder, columns: &[S], sql: &str) -> String {
        format!(
            "insert into {} ({}) {sql}",
            self.wrap_table(&query.from),
            self.columnize(columns)
        )
    }

    // ==================== UPDATE ====================

    /// `"col" = ?, ...`; qualified keys keep only the column segment.
    fn compile_update_columns(&self, values: &Record) -> String {
        values
            .iter()
            .map(|(column, value)| {
                let column = column.rsplit('.').next().unwrap_or(column);
                format!("{} = {}", wrap_value(column), self.parameter(value))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `update "t" set ... where ...`
    ///
    /// With joins or a limit the target rows are matched through their `ctid`:
    /// `update "t" set ... where "ctid" in (select "t"."ctid" from ... limit n)`.
    pub fn compile_update(&self, query: &Builder, values: &Record) -> String {
        let table = self.wrap_table(&query.from);
        let columns = self.compile_update_columns(values);

        if !query.joins.is_empty() || query.limit.is_some() {
            let ctid = format!("{}.ctid", ident::table_alias(&query.from));
            let select = query.clone().select(&[ctid.as_str()]);
            return format!(
                "update {table} set {columns} where {} in ({})",
                wrap_value("ctid"),
                self.compile_select(&select)
            );
        }

        format!("update {table} set {columns} {}", self.compile_wheres(&query.wheres))
            .trim_end()
            .to_string()
    }

    /// `update "t" set ... from "j1", "j2" where <wheres> and <join conditions>`
    pub fn compile_update_from(&self, query: &Builder, values: &Record) -> String {
        let table = self.wrap_table(&query.from);
        let columns = self.compile_update_columns(values);

        let mut from = String::new();
        if !query.joins.is_empty() {
            let froms: Vec<String> = query
                .joins
                .iter()
                .map(|join| self.compile_join_target(&join.target))
                .collect();
            from = format!(" from {}", froms.join(", "));
        }

        format!("update {table} set {columns}{from} {}", self.compile_update_wheres(query))
            .trim_end()
            .to_string()
    }

    fn compile_update_wheres(&self, query: &Builder) -> String {
        let base = self.compile_wheres(&query.wheres);
        let join_wheres: Vec<&WhereClause> = query
            .joins
            .iter()
            .flat_map(|join| join.wheres.iter())
            .collect();
        if join_wheres.is_empty() {
            return base;
        }

        let mut joined = String::new();
        for (i, clause) in join_wheres.iter().enumerate() {
            if i > 0 || !base.is_empty() {
                joined.push_str(clause.boolean.as_str());
                joined.push(' ');
            }
            joined.push_str(&self.compile_where(&clause.condition));
            if i + 1 < join_wheres.len() {
                joined.push(' ');
            }
        }

        if base.is_empty() {
            format!("where {joined}")
        } else {
            format!("{base} {joined}")
        }
    }

    // ==================== UPSERT ====================

    /// Insert followed by `on conflict (<unique_by>) do update set <assignments>`.
    pub fn compile_upsert<S: AsRef<str>>(
        &self,
        query: &Builder,
        values: &Batch,
        unique_by: &[S],
        update: &[UpsertColumn],
    ) -> String {
        let assignments = update
            .iter()
            .map(|column| match column {
                UpsertColumn::Excluded(name) => {
                    format!("{} = {}.{}", self.wrap(name), wrap_value("excluded"), self.wrap(name))
                }
                UpsertColumn::Set(name, value) => format!("{} = {}", self.wrap(name), self.parameter(value)),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} on conflict ({}) do update set {assignments}",
            self.compile_insert(query, values),
            self.columnize(unique_by)
        )
    }

    // ==================== RETURNING ====================

    /// `returning *` or `returning "a", "b"`. An empty list returns every column.
    pub fn compile_returning<S: AsRef<str>>(&self, returning: &[S]) -> String {
        if returning.is_empty() {
            return "returning *".to_string();
        }
        format!("returning {}", self.columnize(returning))
    }
}
