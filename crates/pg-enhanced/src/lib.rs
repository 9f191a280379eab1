//! # pg-enhanced
//!
//! PostgreSQL-specific statement grammar on top of `tokio-postgres`.
//!
//! ## Features
//!
//! - **RETURNING everywhere**: insert, insert-or-ignore, insert-using, update, update-from,
//!   update-or-insert and upsert return the affected rows
//! - **More conditions**: `ilike`, `between symmetric` and lateral joins
//! - **PostgreSQL DDL**: initial column values, storage parameters, logged/unlogged tables,
//!   type changes with `using`, column compression and triggers
//! - **Native types**: ranges, network types, `tsvector`, `vector(n)` and friends, plus a
//!   platform type registry for introspection
//! - **Query log and hooks**: pretend mode, an opt-in statement log and `tracing` output
//!
//! ## Query builder
//!
//! ```ignore
//! use pg_enhanced::{query, Connection, Record, RETURNING_ALL};
//!
//! let conn = Connection::new(client);
//!
//! // insert into "example" ("str") values (?) returning *
//! let rows = query::table("example")
//!     .insert_returning(&conn, Record::new().set("str", "U71Voupu"), RETURNING_ALL)
//!     .await?;
//!
//! // update "example" set "str" = ? where "id" = ? returning "id"
//! let rows = query::table("example")
//!     .where_eq("id", 1i64)
//!     .update_returning(&conn, Record::new().set("str", "changed"), &["id"])
//!     .await?;
//! ```
//!
//! ## Schema
//!
//! ```ignore
//! use pg_enhanced::schema::{Blueprint, ColumnDefinition, ColumnType};
//!
//! Blueprint::new("documents")
//!     .change_column(ColumnDefinition::new("body", ColumnType::Jsonb).using("body::jsonb"))
//!     .unlogged(false)
//!     .build(&conn)
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod ident;
pub mod monitor;
pub mod param;
pub mod query;
pub mod record;
pub mod schema;
pub mod types;

#[cfg(feature = "pool")]
pub mod pool;

pub use client::GenericClient;
pub use config::ConnectionConfig;
pub use connection::Connection;
pub use error::{ConstraintKind, PgError, PgResult};
pub use param::{Bindings, Param, Value};
pub use query::{Builder, RETURNING_ALL, table};
pub use record::{Batch, Record};
