//! SQL type system

use serde::{Deserialize, Serialize};
use sqlparser::ast::DataType;

/// Internal representation of SQL types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlType {
    // Numeric types
    TinyInt,
    SmallInt,
    MediumInt,
    Integer,
    BigInt,
    Decimal {
        precision: Option<u64>,
        scale: Option<u64>,
    },
    Real,
    DoublePrecision,

    // Character types
    Char {
        length: Option<u64>,
    },
    Varchar {
        length: Option<u64>,
    },
    Text,

    // Binary types
    Bytea,
    Blob,

    // Date/Time types
    Date,
    Time {
        precision: Option<u64>,
        with_timezone: bool,
    },
    Timestamp {
        precision: Option<u64>,
        with_timezone: bool,
    },
    Datetime,
    Interval,

    // Boolean
    Boolean,

    // UUID
    Uuid,

    // JSON
    Json,
    Jsonb,

    // Array
    Array(Box<SqlType>),

    // Custom/User-defined type, including enum type names
    Custom(String),

    // Unknown (when parsing fails)
    Unknown,
}

impl SqlType {
    /// Convert from sqlparser's DataType to our internal SqlType
    pub fn from_ast(data_type: &DataType) -> Self {
        match data_type {
            DataType::TinyInt(_) | DataType::UnsignedTinyInt(_) => SqlType::TinyInt,
            DataType::SmallInt(_) | DataType::UnsignedSmallInt(_) => SqlType::SmallInt,
            DataType::Int2(_) => SqlType::SmallInt,
            DataType::MediumInt(_) | DataType::UnsignedMediumInt(_) => SqlType::MediumInt,
            DataType::Integer(_) | DataType::UnsignedInteger(_) => SqlType::Integer,
            DataType::Int(_) | DataType::UnsignedInt(_) => SqlType::Integer,
            DataType::Int4(_) => SqlType::Integer,
            DataType::BigInt(_) | DataType::UnsignedBigInt(_) => SqlType::BigInt,
            DataType::Int8(_) => SqlType::BigInt,

            DataType::Real => SqlType::Real,
            DataType::Float4 => SqlType::Real,
            DataType::Double => SqlType::DoublePrecision,
            DataType::DoublePrecision => SqlType::DoublePrecision,
            DataType::Float8 => SqlType::DoublePrecision,

            DataType::Decimal(info) | DataType::Numeric(info) => {
                let (precision, scale) = match info {
                    sqlparser::ast::ExactNumberInfo::None => (None, None),
                    sqlparser::ast::ExactNumberInfo::Precision(p) => (Some(*p), None),
                    sqlparser::ast::ExactNumberInfo::PrecisionAndScale(p, s) => {
                        (Some(*p), Some(*s))
                    }
                };
                SqlType::Decimal { precision, scale }
            }

            DataType::Char(info) | DataType::Character(info) => {
                let length = extract_char_length(info.as_ref());
                SqlType::Char { length }
            }

            DataType::Varchar(info) | DataType::CharacterVarying(info) => {
                let length = extract_char_length(info.as_ref());
                SqlType::Varchar { length }
            }

            DataType::Text => SqlType::Text,
            DataType::String(_) => SqlType::Text,

            DataType::Bytea => SqlType::Bytea,
            DataType::Binary(_) | DataType::Varbinary(_) | DataType::Blob(_) => SqlType::Blob,

            DataType::Date => SqlType::Date,

            DataType::Time(precision, tz) => SqlType::Time {
                precision: *precision,
                with_timezone: matches!(tz, sqlparser::ast::TimezoneInfo::WithTimeZone),
            },

            DataType::Timestamp(precision, tz) => SqlType::Timestamp {
                precision: *precision,
                with_timezone: matches!(
                    tz,
                    sqlparser::ast::TimezoneInfo::WithTimeZone | sqlparser::ast::TimezoneInfo::Tz
                ),
            },

            DataType::Datetime(_) => SqlType::Datetime,

            DataType::Interval => SqlType::Interval,

            DataType::Boolean | DataType::Bool => SqlType::Boolean,

            DataType::Uuid => SqlType::Uuid,

            DataType::JSON => SqlType::Json,
            DataType::JSONB => SqlType::Jsonb,

            DataType::Enum(..) => SqlType::Custom("enum".to_string()),

            DataType::Array(inner) => match inner {
                sqlparser::ast::ArrayElemTypeDef::AngleBracket(dt) => {
                    SqlType::Array(Box::new(SqlType::from_ast(dt)))
                }
                sqlparser::ast::ArrayElemTypeDef::SquareBracket(dt, _) => {
                    SqlType::Array(Box::new(SqlType::from_ast(dt)))
                }
                sqlparser::ast::ArrayElemTypeDef::Parenthesis(dt) => {
                    SqlType::Array(Box::new(SqlType::from_ast(dt)))
                }
                sqlparser::ast::ArrayElemTypeDef::None => {
                    SqlType::Array(Box::new(SqlType::Unknown))
                }
            },

            DataType::Custom(name, _) => {
                let type_name = name
                    .0
                    .iter()
                    .map(|i| i.value.clone())
                    .collect::<Vec<_>>()
                    .join(".");
                // PostgreSQL serial aliases
                match type_name.to_lowercase().as_str() {
                    "serial" | "serial4" => SqlType::Integer,
                    "bigserial" | "serial8" => SqlType::BigInt,
                    "smallserial" | "serial2" => SqlType::SmallInt,
                    "year" => SqlType::SmallInt,
                    _ => SqlType::Custom(type_name),
                }
            }

            _ => SqlType::Unknown,
        }
    }

    /// Build a type from a bare type name as reported by a live database,
    /// e.g. the `varchar` of `varchar(255)`.
    pub fn from_name(base: &str, size: Option<u64>, scale: Option<u64>) -> Self {
        match base.to_lowercase().as_str() {
            "tinyint" => SqlType::TinyInt,
            "smallint" | "year" => SqlType::SmallInt,
            "mediumint" => SqlType::MediumInt,
            "int" | "integer" => SqlType::Integer,
            "bigint" => SqlType::BigInt,
            "decimal" | "numeric" | "dec" | "fixed" => SqlType::Decimal {
                precision: size,
                scale,
            },
            "float" | "real" => SqlType::Real,
            "double" => SqlType::DoublePrecision,
            "char" => SqlType::Char { length: size },
            "varchar" => SqlType::Varchar { length: size },
            "text" | "tinytext" | "mediumtext" | "longtext" => SqlType::Text,
            "binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob" => {
                SqlType::Blob
            }
            "date" => SqlType::Date,
            "time" => SqlType::Time {
                precision: None,
                with_timezone: false,
            },
            "datetime" => SqlType::Datetime,
            "timestamp" => SqlType::Timestamp {
                precision: None,
                with_timezone: false,
            },
            "bool" | "boolean" => SqlType::Boolean,
            "json" => SqlType::Json,
            "" => SqlType::Unknown,
            other => SqlType::Custom(other.to_string()),
        }
    }

    /// Short type tag carried by compiled columns and parameters
    pub fn tag(&self) -> String {
        match self {
            SqlType::TinyInt => "tinyint".to_string(),
            SqlType::SmallInt => "smallint".to_string(),
            SqlType::MediumInt => "mediumint".to_string(),
            SqlType::Integer => "int".to_string(),
            SqlType::BigInt => "bigint".to_string(),
            SqlType::Decimal { .. } => "decimal".to_string(),
            SqlType::Real => "real".to_string(),
            SqlType::DoublePrecision => "double".to_string(),
            SqlType::Char { .. } => "char".to_string(),
            SqlType::Varchar { .. } => "varchar".to_string(),
            SqlType::Text => "text".to_string(),
            SqlType::Bytea => "bytea".to_string(),
            SqlType::Blob => "blob".to_string(),
            SqlType::Date => "date".to_string(),
            SqlType::Time {
                with_timezone: true,
                ..
            } => "timetz".to_string(),
            SqlType::Time { .. } => "time".to_string(),
            SqlType::Timestamp {
                with_timezone: true,
                ..
            } => "timestamptz".to_string(),
            SqlType::Timestamp { .. } => "timestamp".to_string(),
            SqlType::Datetime => "datetime".to_string(),
            SqlType::Interval => "interval".to_string(),
            SqlType::Boolean => "bool".to_string(),
            SqlType::Uuid => "uuid".to_string(),
            SqlType::Json => "json".to_string(),
            SqlType::Jsonb => "jsonb".to_string(),
            SqlType::Array(inner) => inner.tag(),
            SqlType::Custom(name) => name.clone(),
            SqlType::Unknown => "any".to_string(),
        }
    }

    /// Declared length for sized character types
    pub fn length(&self) -> Option<u64> {
        match self {
            SqlType::Char { length } | SqlType::Varchar { length } => {
                length.filter(|l| *l != u64::MAX)
            }
            SqlType::Decimal { precision, .. } => *precision,
            SqlType::Array(inner) => inner.length(),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, SqlType::Array(_))
    }

    /// Element type for arrays, the type itself otherwise
    pub fn element(&self) -> &SqlType {
        match self {
            SqlType::Array(inner) => inner.element(),
            other => other,
        }
    }

    /// Get a human-readable name for this type
    pub fn display_name(&self) -> String {
        match self {
            SqlType::TinyInt => "tinyint".to_string(),
            SqlType::SmallInt => "smallint".to_string(),
            SqlType::MediumInt => "mediumint".to_string(),
            SqlType::Integer => "integer".to_string(),
            SqlType::BigInt => "bigint".to_string(),
            SqlType::Decimal { precision, scale } => match (precision, scale) {
                (Some(p), Some(s)) => format!("numeric({p},{s})"),
                (Some(p), None) => format!("numeric({p})"),
                _ => "numeric".to_string(),
            },
            SqlType::Real => "real".to_string(),
            SqlType::DoublePrecision => "double precision".to_string(),
            SqlType::Char { length } => match length {
                Some(l) => format!("char({l})"),
                None => "char".to_string(),
            },
            SqlType::Varchar { length } => match length {
                Some(l) => format!("varchar({l})"),
                None => "varchar".to_string(),
            },
            SqlType::Text => "text".to_string(),
            SqlType::Bytea => "bytea".to_string(),
            SqlType::Blob => "blob".to_string(),
            SqlType::Date => "date".to_string(),
            SqlType::Time {
                with_timezone: true,
                ..
            } => "time with time zone".to_string(),
            SqlType::Time { .. } => "time".to_string(),
            SqlType::Timestamp {
                with_timezone: true,
                ..
            } => "timestamp with time zone".to_string(),
            SqlType::Timestamp { .. } => "timestamp".to_string(),
            SqlType::Datetime => "datetime".to_string(),
            SqlType::Interval => "interval".to_string(),
            SqlType::Boolean => "boolean".to_string(),
            SqlType::Uuid => "uuid".to_string(),
            SqlType::Json => "json".to_string(),
            SqlType::Jsonb => "jsonb".to_string(),
            SqlType::Array(inner) => format!("{}[]", inner.display_name()),
            SqlType::Custom(name) => name.clone(),
            SqlType::Unknown => "unknown".to_string(),
        }
    }
}

/// Whether a parsed column type carries the MySQL `UNSIGNED` modifier
pub fn is_unsigned(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::UnsignedTinyInt(_)
            | DataType::UnsignedSmallInt(_)
            | DataType::UnsignedMediumInt(_)
            | DataType::UnsignedInteger(_)
            | DataType::UnsignedInt(_)
            | DataType::UnsignedBigInt(_)
    )
}

/// Extract character length from CharacterLength if present
fn extract_char_length(info: Option<&sqlparser::ast::CharacterLength>) -> Option<u64> {
    info.map(|i| match i {
        sqlparser::ast::CharacterLength::IntegerLength { length, .. } => *length,
        sqlparser::ast::CharacterLength::Max => u64::MAX,
    })
}
