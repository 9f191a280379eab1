use super::column::ColumnDefinition;
use super::trigger::TriggerDefinition;
use crate::client::GenericClient;
use crate::connection::Connection;
use crate::error::PgResult;
use crate::param::Bindings;

/// One DDL command of a [`Blueprint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(ColumnDefinition),
    Change(ColumnDefinition),
    /// Storage parameters in caller order.
    StorageParameters(Vec<(String, String)>),
    /// `true` for `set unlogged`, `false` for `set logged`.
    Unlogged(bool),
    Trigger(TriggerDefinition),
    DropTrigger { name: String, if_exists: bool },
}

/// A list of changes to one table.
///
/// Commands compile and run in the order they were added.
#[derive(Debug, Clone)]
pub struct Blueprint {
    table: String,
    commands: Vec<Command>,
}

impl Blueprint {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            commands: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn push(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn add_column(self, column: ColumnDefinition) -> Self {
        self.push(Command::Add(column))
    }

    pub fn change_column(self, column: ColumnDefinition) -> Self {
        self.push(Command::Change(column))
    }

    /// `set (fillfactor = 70, ...)`
    pub fn storage_parameters<K, V>(self, options: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        let options = options
            .into_iter()
            .map(|(key, value)| (key.into(), value.to_string()))
            .collect();
        self.push(Command::StorageParameters(options))
    }

    /// Switch the table to unlogged (`true`) or logged (`false`).
    pub fn unlogged(self, unlogged: bool) -> Self {
        self.push(Command::Unlogged(unlogged))
    }

    pub fn trigger(self, trigger: TriggerDefinition) -> Self {
        self.push(Command::Trigger(trigger))
    }

    pub fn drop_trigger(self, name: impl Into<String>) -> Self {
        self.push(Command::DropTrigger {
            name: name.into(),
            if_exists: false,
        })
    }

    pub fn drop_trigger_if_exists(self, name: impl Into<String>) -> Self {
        self.push(Command::DropTrigger {
            name: name.into(),
            if_exists: true,
        })
    }

    /// Compile with the connection's schema grammar and run each statement in order.
    ///
    /// Stops at the first failing statement.
    pub async fn build<C: GenericClient>(&self, conn: &Connection<C>) -> PgResult<()> {
        let bindings = Bindings::new();
        for sql in conn.schema_grammar().compile(self) {
            conn.statement(&sql, &bindings).await?;
        }
        Ok(())
    }
}
