//! Error types for pg-enhanced

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type PgResult<T> = Result<T, PgError>;

/// Integrity constraint classes reported by SQLSTATE `23xxx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `23505`
    Unique,
    /// `23503`
    ForeignKey,
    /// `23514`
    Check,
    /// `23502`
    NotNull,
}

impl ConstraintKind {
    fn from_sqlstate(code: &str) -> Option<Self> {
        match code {
            "23505" => Some(Self::Unique),
            "23503" => Some(Self::ForeignKey),
            "23514" => Some(Self::Check),
            "23502" => Some(Self::NotNull),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unique => "unique",
            Self::ForeignKey => "foreign key",
            Self::Check => "check",
            Self::NotNull => "not null",
        })
    }
}

/// Errors raised while compiling or executing statements.
///
/// Compilation itself never fails on user input: identifiers are not validated and
/// malformed SQL surfaces as a driver error from the database.
#[derive(Debug, Error)]
pub enum PgError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// Driver error that is not a constraint violation.
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// A write hit an integrity constraint, e.g. a plain insert of a duplicate key.
    ///
    /// `source` is the untouched driver error, with its detail, hint and table.
    #[error("{kind} constraint violation on {constraint}: {source}")]
    Constraint {
        kind: ConstraintKind,
        constraint: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A returned column could not be read as the expected type.
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Rejected before reaching the database: placeholder mismatch, hook abort,
    /// duplicate type registration, unknown type name or a bad config value.
    #[error("Validation error: {0}")]
    Validation(String),

    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Query timeout after {0:?}")]
    Timeout(Duration),
}

impl PgError {
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// The violated constraint class, if any.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::Constraint { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.constraint_kind() == Some(ConstraintKind::Unique)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The server-side error behind a driver or constraint failure.
    pub fn db_error(&self) -> Option<&tokio_postgres::error::DbError> {
        match self {
            Self::Query(source) | Self::Constraint { source, .. } => source.as_db_error(),
            _ => None,
        }
    }

    /// Map a driver error, splitting out integrity constraint violations.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let violation = err.as_db_error().and_then(|db_err| {
            let kind = ConstraintKind::from_sqlstate(db_err.code().code())?;
            Some((kind, db_err.constraint().unwrap_or("unknown").to_string()))
        });
        match violation {
            Some((kind, constraint)) => Self::Constraint {
                kind,
                constraint,
                source: err,
            },
            None => Self::Query(err),
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for PgError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_prefixed() {
        let err = PgError::validation("type 'vector' is already registered");
        assert_eq!(
            err.to_string(),
            "Validation error: type 'vector' is already registered"
        );
        assert!(!err.is_unique_violation());
        assert_eq!(err.constraint_kind(), None);
        assert!(err.db_error().is_none());
    }

    #[test]
    fn decode_error_names_column() {
        let err = PgError::decode("exists", "expected bool");
        assert_eq!(err.to_string(), "Decode error on column 'exists': expected bool");
    }

    #[test]
    fn sqlstate_mapping() {
        assert_eq!(ConstraintKind::from_sqlstate("23503"), Some(ConstraintKind::ForeignKey));
        assert_eq!(ConstraintKind::from_sqlstate("23502"), Some(ConstraintKind::NotNull));
        assert_eq!(ConstraintKind::from_sqlstate("42P01"), None);
        assert!(PgError::Timeout(Duration::from_secs(1)).is_timeout());
    }
}
