use super::{BitType, NativeType, PlatformType, VarbitType, VectorType};
use crate::error::{PgError, PgResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Native PostgreSQL types without parameters.
const NATIVE_TYPES: &[&str] = &[
    "cidr",
    "citext",
    "datemultirange",
    "daterange",
    "ean13",
    "hstore",
    "int4multirange",
    "int4range",
    "int8multirange",
    "int8range",
    "isbn",
    "isbn13",
    "ismn",
    "ismn13",
    "issn",
    "issn13",
    "ltree",
    "nummultirange",
    "numrange",
    "tsmultirange",
    "tsrange",
    "tstzmultirange",
    "tstzrange",
    "tsvector",
    "upc",
    "xml",
];

/// Name -> type lookup.
///
/// Built explicitly and passed to whatever needs type resolution.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, Arc<dyn PlatformType>>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every native PostgreSQL type.
    pub fn postgres() -> Self {
        let mut types: BTreeMap<String, Arc<dyn PlatformType>> = NATIVE_TYPES
            .iter()
            .map(|name| (name.to_string(), Arc::new(NativeType::new(*name)) as Arc<dyn PlatformType>))
            .collect();
        types.insert("bit".into(), Arc::new(BitType));
        types.insert("varbit".into(), Arc::new(VarbitType));
        types.insert("vector".into(), Arc::new(VectorType));
        Self { types }
    }

    /// Add a type. Fails when the name is already taken.
    pub fn register<T: PlatformType + 'static>(&mut self, ty: T) -> PgResult<()> {
        let name = ty.name().to_string();
        if self.types.contains_key(&name) {
            return Err(PgError::validation(format!("type '{name}' is already registered")));
        }
        self.types.insert(name, Arc::new(ty));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn PlatformType> {
        self.types.get(name).map(|ty| ty.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Database type name -> registered type name, for `platform`.
    pub fn database_type_mapping(&self, platform: &str) -> BTreeMap<String, String> {
        let mut mapping = BTreeMap::new();
        for (name, ty) in &self.types {
            for db_type in ty.mapped_database_types(platform) {
                mapping.insert(db_type, name.clone());
            }
        }
        mapping
    }

    /// The registered type a database type name maps to on `platform`.
    pub fn resolve_database_type(&self, platform: &str, db_type: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|(_, ty)| ty.mapped_database_types(platform).iter().any(|t| t == db_type))
            .map(|(name, _)| name.as_str())
    }
}
