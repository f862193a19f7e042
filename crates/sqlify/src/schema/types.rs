use crate::template::ParamType;
use serde::{Deserialize, Serialize};

/// Coarse value type of an entity field, derived from its SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Float,
    Text,
    Boolean,
    /// Dates and timestamps
    Date,
    Json,
    /// Unrecognised SQL type, or a view column
    Unknown,
}

impl FieldType {
    /// Map a SQL column type (`varchar(255)`, `BIGINT`, `timestamp with time zone`, ...).
    pub fn from_sql_type(sql_type: &str) -> Self {
        match normalize_sql_type(sql_type).as_str() {
            "int" | "integer" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "serial"
            | "smallserial" | "bigserial" => FieldType::Integer,

            "float" | "float4" | "float8" | "real" | "double" | "double precision" | "decimal"
            | "numeric" => FieldType::Float,

            "char" | "character" | "varchar" | "text" | "citext" | "name" => FieldType::Text,

            "bool" | "boolean" => FieldType::Boolean,

            "date" | "timestamp" | "timestamptz" | "timestamp without time zone" => {
                FieldType::Date
            }

            "json" | "jsonb" => FieldType::Json,

            _ => FieldType::Unknown,
        }
    }

    /// The placeholder type that validates values for this field, if any.
    pub fn param_type(&self) -> Option<ParamType> {
        match self {
            FieldType::Integer => Some(ParamType::Integer),
            FieldType::Float => Some(ParamType::Float),
            FieldType::Text => Some(ParamType::String),
            FieldType::Boolean => Some(ParamType::Boolean),
            FieldType::Date => Some(ParamType::Date),
            FieldType::Json => Some(ParamType::Json),
            FieldType::Unknown => None,
        }
    }
}

/// Lowercase, remove `(...)` typmods, compress spaces, fold common synonyms.
pub fn normalize_sql_type(sql_type: &str) -> String {
    let mut s = sql_type.trim().to_lowercase();

    while let Some(start) = s.find('(') {
        let Some(end) = s[start..].find(')') else {
            break;
        };
        s.replace_range(start..start + end + 1, "");
    }

    let s = s.split_whitespace().collect::<Vec<_>>().join(" ");

    match s.as_str() {
        "character varying" => "varchar".to_string(),
        "timestamp with time zone" => "timestamptz".to_string(),
        _ => s,
    }
}
