//! Compiled query IR consumed by code generators.

use serde::{Deserialize, Serialize};

use crate::metadata::Cmd;
use crate::schema::{Catalog, ColumnDef, QualifiedName, TableDef};
use crate::types::SqlType;

/// A typed column: either a catalog column or the result of an expression
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Column {
    /// Empty for anonymous expressions
    pub name: String,
    /// Base type tag (`int`, `varchar`, an enum name, `any`...)
    pub data_type: String,
    pub not_null: bool,
    pub is_array: bool,
    /// Expanded into a list of values at runtime (`sqlc.slice`, MySQL `IN (?)`)
    pub is_slice: bool,
    pub unsigned: bool,
    pub length: Option<u64>,
    /// Table the column belongs to, when it is a plain column reference
    pub table: Option<QualifiedName>,
    pub table_alias: Option<String>,
    /// Enum type referenced by the column
    pub enum_ref: Option<QualifiedName>,
    pub comment: Option<String>,
}

impl Column {
    /// A synthesized column of the given type
    pub fn typed(name: impl Into<String>, data_type: &SqlType, not_null: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.tag(),
            not_null,
            is_array: data_type.is_array(),
            length: data_type.length(),
            ..Default::default()
        }
    }

    /// A column of unknown type
    pub fn any(name: impl Into<String>) -> Self {
        Self::typed(name, &SqlType::Unknown, false)
    }

    /// Describe a catalog column of `table`
    pub fn from_def(catalog: &Catalog, table: &TableDef, def: &ColumnDef) -> Self {
        let schema = table
            .name
            .schema
            .clone()
            .unwrap_or_else(|| catalog.default_schema.clone());

        let enum_ref = match def.data_type.element() {
            SqlType::Custom(name) => {
                let qualified = QualifiedName::parse(name);
                let lookup = QualifiedName {
                    schema: qualified.schema.clone().or_else(|| Some(schema.clone())),
                    name: qualified.name.clone(),
                };
                catalog.get_enum(&lookup).map(|_| lookup)
            }
            _ => None,
        };

        Self {
            name: def.name.clone(),
            data_type: def.data_type.tag(),
            not_null: !def.nullable,
            is_array: def.is_array,
            is_slice: false,
            unsigned: def.unsigned,
            length: def.length,
            table: Some(QualifiedName::with_schema(schema, table.name.name.clone())),
            table_alias: None,
            enum_ref,
            comment: def.comment.clone(),
        }
    }
}

/// One resolved placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Ordinal number, starting at 1
    pub number: usize,
    pub column: Column,
    /// Byte offset of the placeholder, relative to the statement start
    pub location: usize,
}

/// Parameters of a single VALUES tuple, for multi-row INSERT expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertValues {
    pub params: Vec<Parameter>,
    /// Number of expressions in one tuple
    pub len: usize,
}

/// A compiled statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub cmd: Cmd,
    pub name: String,
    /// Statement comments other than the directive
    pub comments: Vec<String>,
    pub params: Vec<Parameter>,
    pub columns: Vec<Column>,
    /// Rewritten SQL with comments removed
    pub sql: String,
    /// INSERT columns the caller does not supply
    pub omits: Vec<String>,
    pub insert_values: Option<InsertValues>,
    pub filename: String,
}

/// Order queries by name for deterministic emission
pub fn sort_by_name(queries: &mut [Query]) {
    queries.sort_by(|a, b| a.name.cmp(&b.name));
}
