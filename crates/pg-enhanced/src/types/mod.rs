//! Platform type mapping for schema introspection tools.
//!
//! Each [`PlatformType`] names a PostgreSQL type, renders its column declaration and lists
//! the database type names it maps back from. Types live in an explicitly constructed
//! [`TypeRegistry`]; nothing is registered globally.
//!
//! ```ignore
//! use pg_enhanced::types::TypeRegistry;
//!
//! let registry = TypeRegistry::postgres();
//! assert_eq!(registry.resolve_database_type("pgsql", "tstzrange"), Some("tstzrange"));
//! ```

mod registry;

pub use registry::TypeRegistry;

/// Platform names the PostgreSQL types map onto.
pub const POSTGRES_PLATFORMS: &[&str] = &["pgsql", "postgres", "postgresql"];

fn is_postgres(platform: &str) -> bool {
    POSTGRES_PLATFORMS.contains(&platform)
}

/// Column options relevant to a type declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnOptions {
    /// Bit length for `bit(n)` and `varbit(n)`.
    pub length: Option<u32>,
    /// Dimension count for `vector(n)`.
    pub dimensions: Option<u32>,
}

impl ColumnOptions {
    pub fn with_length(length: u32) -> Self {
        Self {
            length: Some(length),
            ..Self::default()
        }
    }

    pub fn with_dimensions(dimensions: u32) -> Self {
        Self {
            dimensions: Some(dimensions),
            ..Self::default()
        }
    }
}

/// A named database type known to the registry.
pub trait PlatformType: Send + Sync {
    fn name(&self) -> &str;

    /// Declaration used in a column definition. Defaults to the type name.
    fn sql_declaration(&self, options: &ColumnOptions) -> String {
        let _ = options;
        self.name().to_string()
    }

    /// Database type names that resolve to this type on `platform`.
    ///
    /// Empty for anything but PostgreSQL.
    fn mapped_database_types(&self, platform: &str) -> Vec<String> {
        if is_postgres(platform) {
            vec![self.sql_declaration(&ColumnOptions::default())]
        } else {
            Vec::new()
        }
    }
}

/// An unparameterised native type, e.g. `tsvector` or `int8range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    name: String,
}

impl NativeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl PlatformType for NativeType {
    fn name(&self) -> &str {
        &self.name
    }
}

/// `bit(n)`; `n` defaults to 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitType;

impl PlatformType for BitType {
    fn name(&self) -> &str {
        "bit"
    }

    fn sql_declaration(&self, options: &ColumnOptions) -> String {
        format!("bit({})", options.length.unwrap_or(1))
    }

    fn mapped_database_types(&self, platform: &str) -> Vec<String> {
        if is_postgres(platform) {
            vec![self.name().to_string()]
        } else {
            Vec::new()
        }
    }
}

/// `varbit` or `varbit(n)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarbitType;

impl PlatformType for VarbitType {
    fn name(&self) -> &str {
        "varbit"
    }

    fn sql_declaration(&self, options: &ColumnOptions) -> String {
        match options.length {
            Some(length) => format!("varbit({length})"),
            None => "varbit".to_string(),
        }
    }
}

/// pgvector's `vector` or `vector(n)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorType;

impl PlatformType for VectorType {
    fn name(&self) -> &str {
        "vector"
    }

    fn sql_declaration(&self, options: &ColumnOptions) -> String {
        match options.dimensions {
            Some(dimensions) => format!("vector({dimensions})"),
            None => "vector".to_string(),
        }
    }

    fn mapped_database_types(&self, platform: &str) -> Vec<String> {
        if is_postgres(platform) {
            vec![self.name().to_string()]
        } else {
            Vec::new()
        }
    }
}
