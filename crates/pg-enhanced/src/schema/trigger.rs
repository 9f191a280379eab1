/// Granularity of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerLevel {
    Row,
    Statement,
}

/// A `create trigger` command.
///
/// ```ignore
/// let trigger = TriggerDefinition::new("audit_users", "audit_log()", "after insert")
///     .for_each_row()
///     .when_condition("NEW.active");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDefinition {
    pub name: String,
    /// Function call executed by the trigger, e.g. `audit_log()`.
    pub action: String,
    /// Timing and events, e.g. `after insert or update`.
    pub fire: String,
    pub replace: bool,
    pub level: Option<TriggerLevel>,
    pub old_table: Option<String>,
    pub new_table: Option<String>,
    pub when: Option<String>,
}

impl TriggerDefinition {
    pub fn new(name: impl Into<String>, action: impl Into<String>, fire: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
            fire: fire.into(),
            replace: false,
            level: None,
            old_table: None,
            new_table: None,
            when: None,
        }
    }

    /// Use `create or replace trigger`.
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn for_each_row(mut self) -> Self {
        self.level = Some(TriggerLevel::Row);
        self
    }

    pub fn for_each_statement(mut self) -> Self {
        self.level = Some(TriggerLevel::Statement);
        self
    }

    /// Expose the affected rows as transition tables (`referencing old table as ... new table as ...`).
    pub fn transition_tables(mut self, old: Option<&str>, new: Option<&str>) -> Self {
        self.old_table = old.map(str::to_string);
        self.new_table = new.map(str::to_string);
        self
    }

    /// Only fire when `condition` holds.
    pub fn when_condition(mut self, condition: impl Into<String>) -> Self {
        self.when = Some(condition.into());
        self
    }
}
