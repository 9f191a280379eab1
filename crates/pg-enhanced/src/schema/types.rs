//! Column type vocabulary for the schema grammar.

use crate::error::{PgError, PgResult};
use std::fmt;

/// A column's data type.
///
/// Besides the common base types this covers the native PostgreSQL types that need
/// extensions or have no portable counterpart (ranges, `hstore`, `ltree`, `vector`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    // Base types
    SmallInteger,
    Integer,
    BigInteger,
    /// `varchar(n)`
    String(u32),
    /// `char(n)`
    Char(u32),
    Text,
    Boolean,
    /// `decimal(precision, scale)`
    Decimal(u8, u8),
    Double,
    Date,
    Time,
    /// `timestamp(p) without time zone`
    Timestamp(u8),
    /// `timestamp(p) with time zone`
    TimestampTz(u8),
    Json,
    Jsonb,
    Uuid,
    Binary,
    IpAddress,
    MacAddress,

    // Native PostgreSQL types
    /// `bit(n)`
    Bit(u32),
    Cidr,
    Citext,
    DateMultiRange,
    DateRange,
    /// A user-defined domain, rendered as its name.
    Domain(String),
    Ean13,
    Hstore,
    /// `integer[]`
    Int4Array,
    Int4MultiRange,
    Int4Range,
    Int8MultiRange,
    Int8Range,
    Isbn,
    Isbn13,
    Ismn,
    Ismn13,
    Issn,
    Issn13,
    Ltree,
    NumMultiRange,
    NumRange,
    TsMultiRange,
    TsRange,
    TstzMultiRange,
    TstzRange,
    TsVector,
    Upc,
    /// `varbit` or `varbit(n)`
    Varbit(Option<u32>),
    /// `vector(dimensions)`
    Vector(u32),
    Xml,
}

impl ColumnType {
    /// The SQL type declaration.
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::SmallInteger => "smallint".into(),
            ColumnType::Integer => "integer".into(),
            ColumnType::BigInteger => "bigint".into(),
            ColumnType::String(len) => format!("varchar({len})"),
            ColumnType::Char(len) => format!("char({len})"),
            ColumnType::Text => "text".into(),
            ColumnType::Boolean => "boolean".into(),
            ColumnType::Decimal(precision, scale) => format!("decimal({precision}, {scale})"),
            ColumnType::Double => "double precision".into(),
            ColumnType::Date => "date".into(),
            ColumnType::Time => "time(0) without time zone".into(),
            ColumnType::Timestamp(p) => format!("timestamp({p}) without time zone"),
            ColumnType::TimestampTz(p) => format!("timestamp({p}) with time zone"),
            ColumnType::Json => "json".into(),
            ColumnType::Jsonb => "jsonb".into(),
            ColumnType::Uuid => "uuid".into(),
            ColumnType::Binary => "bytea".into(),
            ColumnType::IpAddress => "inet".into(),
            ColumnType::MacAddress => "macaddr".into(),

            ColumnType::Bit(len) => format!("bit({len})"),
            ColumnType::Cidr => "cidr".into(),
            ColumnType::Citext => "citext".into(),
            ColumnType::DateMultiRange => "datemultirange".into(),
            ColumnType::DateRange => "daterange".into(),
            ColumnType::Domain(name) => name.clone(),
            ColumnType::Ean13 => "ean13".into(),
            ColumnType::Hstore => "hstore".into(),
            ColumnType::Int4Array => "integer[]".into(),
            ColumnType::Int4MultiRange => "int4multirange".into(),
            ColumnType::Int4Range => "int4range".into(),
            ColumnType::Int8MultiRange => "int8multirange".into(),
            ColumnType::Int8Range => "int8range".into(),
            ColumnType::Isbn => "isbn".into(),
            ColumnType::Isbn13 => "isbn13".into(),
            ColumnType::Ismn => "ismn".into(),
            ColumnType::Ismn13 => "ismn13".into(),
            ColumnType::Issn => "issn".into(),
            ColumnType::Issn13 => "issn13".into(),
            ColumnType::Ltree => "ltree".into(),
            ColumnType::NumMultiRange => "nummultirange".into(),
            ColumnType::NumRange => "numrange".into(),
            ColumnType::TsMultiRange => "tsmultirange".into(),
            ColumnType::TsRange => "tsrange".into(),
            ColumnType::TstzMultiRange => "tstzmultirange".into(),
            ColumnType::TstzRange => "tstzrange".into(),
            ColumnType::TsVector => "tsvector".into(),
            ColumnType::Upc => "upc".into(),
            ColumnType::Varbit(None) => "varbit".into(),
            ColumnType::Varbit(Some(len)) => format!("varbit({len})"),
            ColumnType::Vector(dimensions) => format!("vector({dimensions})"),
            ColumnType::Xml => "xml".into(),
        }
    }

    /// Parse a type declaration such as `tstzrange`, `bit(8)` or `vector(1536)`.
    ///
    /// Domains cannot be told apart from typos, so unknown names are rejected; build
    /// [`ColumnType::Domain`] directly instead.
    pub fn from_name(declaration: &str) -> PgResult<Self> {
        let declaration = declaration.trim();
        let (name, arg) = match declaration.split_once('(') {
            Some((name, rest)) => {
                let arg = rest
                    .strip_suffix(')')
                    .ok_or_else(|| PgError::validation(format!("malformed type '{declaration}'")))?;
                (name.trim().to_ascii_lowercase(), Some(arg.trim()))
            }
            None => (declaration.to_ascii_lowercase(), None),
        };

        let number = |arg: Option<&str>| -> PgResult<u32> {
            let arg = arg.ok_or_else(|| PgError::validation(format!("type '{name}' needs a length")))?;
            arg.parse::<u32>()
                .map_err(|e| PgError::validation(format!("type '{declaration}': {e}")))
        };

        let ty = match name.as_str() {
            "smallint" | "int2" => ColumnType::SmallInteger,
            "integer" | "int" | "int4" => ColumnType::Integer,
            "bigint" | "int8" => ColumnType::BigInteger,
            "varchar" => ColumnType::String(number(arg)?),
            "char" => ColumnType::Char(number(arg)?),
            "text" => ColumnType::Text,
            "boolean" | "bool" => ColumnType::Boolean,
            "double precision" | "float8" => ColumnType::Double,
            "date" => ColumnType::Date,
            "json" => ColumnType::Json,
            "jsonb" => ColumnType::Jsonb,
            "uuid" => ColumnType::Uuid,
            "bytea" => ColumnType::Binary,
            "inet" => ColumnType::IpAddress,
            "macaddr" => ColumnType::MacAddress,
            "bit" => ColumnType::Bit(number(arg)?),
            "cidr" => ColumnType::Cidr,
            "citext" => ColumnType::Citext,
            "datemultirange" => ColumnType::DateMultiRange,
            "daterange" => ColumnType::DateRange,
            "ean13" => ColumnType::Ean13,
            "hstore" => ColumnType::Hstore,
            "integer[]" | "int4[]" => ColumnType::Int4Array,
            "int4multirange" => ColumnType::Int4MultiRange,
            "int4range" => ColumnType::Int4Range,
            "int8multirange" => ColumnType::Int8MultiRange,
            "int8range" => ColumnType::Int8Range,
            "isbn" => ColumnType::Isbn,
            "isbn13" => ColumnType::Isbn13,
            "ismn" => ColumnType::Ismn,
            "ismn13" => ColumnType::Ismn13,
            "issn" => ColumnType::Issn,
            "issn13" => ColumnType::Issn13,
            "ltree" => ColumnType::Ltree,
            "nummultirange" => ColumnType::NumMultiRange,
            "numrange" => ColumnType::NumRange,
            "tsmultirange" => ColumnType::TsMultiRange,
            "tsrange" => ColumnType::TsRange,
            "tstzmultirange" => ColumnType::TstzMultiRange,
            "tstzrange" => ColumnType::TstzRange,
            "tsvector" => ColumnType::TsVector,
            "upc" => ColumnType::Upc,
            "varbit" => ColumnType::Varbit(arg.map(|a| number(Some(a))).transpose()?),
            "vector" => ColumnType::Vector(number(arg)?),
            "xml" => ColumnType::Xml,
            _ => return Err(PgError::validation(format!("unknown column type '{declaration}'"))),
        };
        Ok(ty)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_type())
    }
}
