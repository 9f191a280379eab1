//! PostgreSQL DDL grammar.

use super::blueprint::{Blueprint, Command};
use super::column::ColumnDefinition;
use super::trigger::{TriggerDefinition, TriggerLevel};
use crate::ident::{self, wrap_value};

/// A structured `alter table ... alter column ... type ...` statement.
///
/// Produced by [`SchemaGrammar::alter_column`] so callers can adjust the type change
/// (e.g. the `using` expression) before it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterColumn {
    /// Wrapped table name.
    pub table: String,
    /// Unwrapped column name.
    pub column: String,
    pub sql_type: String,
    pub collation: Option<String>,
    pub using: Option<String>,
    /// Follow-up actions on the same column, e.g. `set not null`.
    pub changes: Vec<String>,
}

impl AlterColumn {
    pub fn to_sql(&self) -> String {
        let column = wrap_value(&self.column);
        let mut ty = format!("type {}", self.sql_type);
        if let Some(collation) = &self.collation {
            ty.push_str(&format!(" collate {}", wrap_value(collation)));
        }
        if let Some(using) = &self.using {
            ty.push_str(&format!(" using {using}"));
        }

        let actions = std::iter::once(ty)
            .chain(self.changes.iter().cloned())
            .map(|action| format!("alter column {column} {action}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("alter table {} {actions}", self.table)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SchemaGrammar {
    table_prefix: String,
}

impl SchemaGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(prefix: &str) -> Self {
        Self {
            table_prefix: prefix.to_string(),
        }
    }

    pub fn wrap_table(&self, table: &str) -> String {
        ident::wrap_table(table, &self.table_prefix)
    }

    /// Compile every command of the blueprint, in order.
    pub fn compile(&self, blueprint: &Blueprint) -> Vec<String> {
        blueprint
            .commands()
            .iter()
            .flat_map(|command| self.compile_command(blueprint.table(), command))
            .collect()
    }

    pub fn compile_command(&self, table: &str, command: &Command) -> Vec<String> {
        match command {
            Command::Add(column) => self.compile_add(table, column),
            Command::Change(column) => self.compile_change(table, column),
            Command::StorageParameters(options) => vec![self.compile_storage_parameters(table, options)],
            Command::Unlogged(unlogged) => vec![self.compile_unlogged(table, *unlogged)],
            Command::Trigger(trigger) => vec![self.compile_trigger(table, trigger)],
            Command::DropTrigger { name, if_exists } => vec![self.compile_drop_trigger(table, name, *if_exists)],
        }
    }

    /// `"name" type[ compression m][ collate "x"] not null[ default v]`
    pub fn compile_column(&self, column: &ColumnDefinition) -> String {
        let mut sql = format!("{} {}", wrap_value(&column.name), column.column_type.sql_type());
        if let Some(method) = &column.compression {
            sql.push_str(&format!(" compression {method}"));
        }
        if let Some(collation) = &column.collation {
            sql.push_str(&format!(" collate {}", wrap_value(collation)));
        }
        sql.push_str(if column.nullable { " null" } else { " not null" });
        if let Some(default) = &column.default {
            sql.push_str(&format!(" default {}", default.to_sql()));
        }
        sql
    }

    /// `alter table T add column ...`
    ///
    /// With an initial value the column is added using it as default, then a second
    /// statement sets the real default (or drops it).
    pub fn compile_add(&self, table: &str, column: &ColumnDefinition) -> Vec<String> {
        let table = self.wrap_table(table);
        let Some(initial) = &column.initial else {
            return vec![format!("alter table {table} add column {}", self.compile_column(column))];
        };

        let name = wrap_value(&column.name);
        let follow_up = match &column.default {
            Some(default) => format!("alter table {table} alter column {name} set default {}", default.to_sql()),
            None => format!("alter table {table} alter column {name} drop default"),
        };
        let mut with_initial = column.clone();
        with_initial.default = Some(initial.clone());

        vec![
            format!("alter table {table} add column {}", self.compile_column(&with_initial)),
            follow_up,
        ]
    }

    /// Structured type change for `column`.
    pub fn alter_column(&self, table: &str, column: &ColumnDefinition) -> AlterColumn {
        let mut changes = vec![if column.nullable { "drop not null" } else { "set not null" }.to_string()];
        changes.push(match &column.default {
            Some(default) => format!("set default {}", default.to_sql()),
            None => "drop default".to_string(),
        });
        AlterColumn {
            table: self.wrap_table(table),
            column: column.name.clone(),
            sql_type: column.column_type.sql_type(),
            collation: column.collation.clone(),
            using: column.using.clone(),
            changes,
        }
    }

    /// The type change, then `set compression` when a method is given.
    pub fn compile_change(&self, table: &str, column: &ColumnDefinition) -> Vec<String> {
        let mut statements = vec![self.alter_column(table, column).to_sql()];
        if let Some(method) = &column.compression {
            statements.push(format!(
                "alter table {} alter {} set compression {}",
                self.wrap_table(table),
                wrap_value(&column.name),
                wrap_value(method)
            ));
        }
        statements
    }

    /// `alter table T set (k1 = v1, k2 = v2)`
    pub fn compile_storage_parameters(&self, table: &str, options: &[(String, String)]) -> String {
        let options = options
            .iter()
            .map(|(key, value)| format!("{key} = {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("alter table {} set ({options})", self.wrap_table(table))
    }

    pub fn compile_unlogged(&self, table: &str, unlogged: bool) -> String {
        let mode = if unlogged { "unlogged" } else { "logged" };
        format!("alter table {} set {mode}", self.wrap_table(table))
    }

    pub fn compile_trigger(&self, table: &str, trigger: &TriggerDefinition) -> String {
        let mut parts = vec![
            if trigger.replace { "create or replace trigger" } else { "create trigger" }.to_string(),
            wrap_value(&trigger.name),
            trigger.fire.clone(),
            "on".to_string(),
            self.wrap_table(table),
        ];
        if trigger.old_table.is_some() || trigger.new_table.is_some() {
            parts.push("referencing".to_string());
        }
        if let Some(old) = &trigger.old_table {
            parts.push(format!("old table as {}", wrap_value(old)));
        }
        if let Some(new) = &trigger.new_table {
            parts.push(format!("new table as {}", wrap_value(new)));
        }
        match trigger.level {
            Some(TriggerLevel::Row) => parts.push("for each row".to_string()),
            Some(TriggerLevel::Statement) => parts.push("for each statement".to_string()),
            None => {}
        }
        if let Some(condition) = &trigger.when {
            parts.push(format!("when ({condition})"));
        }
        parts.push(format!("execute function {}", trigger.action));
        parts.join(" ")
    }

    pub fn compile_drop_trigger(&self, table: &str, name: &str, if_exists: bool) -> String {
        let if_exists = if if_exists { "if exists " } else { "" };
        format!("drop trigger {if_exists}{} on {}", wrap_value(name), self.wrap_table(table))
    }
}
