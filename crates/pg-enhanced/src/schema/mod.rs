//! Schema changes: blueprint commands, column types and the DDL grammar.
//!
//! # Example
//!
//! ```ignore
//! use pg_enhanced::schema::{Blueprint, ColumnDefinition, ColumnType, TriggerDefinition};
//!
//! Blueprint::new("users")
//!     .add_column(ColumnDefinition::new("active", ColumnType::Boolean).initial(true).default(false))
//!     .storage_parameters([("fillfactor", 70)])
//!     .trigger(TriggerDefinition::new("users_audit", "audit_log()", "after update").for_each_row())
//!     .build(&conn)
//!     .await?;
//! ```

mod blueprint;
mod column;
mod grammar;
mod trigger;
mod types;


pub use blueprint::{Blueprint, Command};
pub use column::{ColumnDefinition, DefaultValue};
pub use grammar::{AlterColumn, SchemaGrammar};
pub use trigger::{TriggerDefinition, TriggerLevel};
pub use types::ColumnType;
